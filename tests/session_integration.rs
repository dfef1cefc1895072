//! Live session integration tests
//!
//! Foreground instruction entry racing the background auto-cycle task.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;

use drone_overwatch::core::config::EngineConfig;
use drone_overwatch::core::types::{DroneState, ObjectOfInterest, OperatorInstruction, PixelPoint, SceneContext};
use drone_overwatch::pipeline::DecisionInput;
use drone_overwatch::session::{fold_history, LiveSession, SessionCommand};

fn session() -> LiveSession {
    let payload = DecisionInput {
        scene: SceneContext::new("gate-7", DroneState::at(PixelPoint::new(500.0, 500.0))),
        objects: vec![
            ObjectOfInterest::new("w", "weapon?", 0.8, PixelPoint::new(500.0, 500.0)),
            ObjectOfInterest::new("b", "bag", 0.7, PixelPoint::new(450.0, 520.0)).with_hint("unattended", 0.9),
            ObjectOfInterest::new("d", "unauthorized_drone", 0.6, PixelPoint::new(900.0, 100.0)),
        ],
        instruction: OperatorInstruction::new("watch for weapons"),
    };
    LiveSession::new(payload, Arc::new(EngineConfig::default()))
}

#[test]
fn test_concurrent_instructions_keep_history_order() {
    let s = session();
    let writers: Vec<_> = (0..4)
        .map(|t| {
            let s = s.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    s.add_instruction(&format!("writer {t} note {i}: watch for drones"));
                }
            })
        })
        .collect();
    let cycler = {
        let s = s.clone();
        thread::spawn(move || {
            for _ in 0..20 {
                s.run_cycle();
            }
        })
    };
    for w in writers {
        w.join().unwrap();
    }
    cycler.join().unwrap();

    let status = s.status();
    assert_eq!(status.history.len(), 41);
    assert_eq!(status.history[0].text, "watch for weapons");
    assert_eq!(status.cycles_completed, 20);
    for t in 0..4 {
        let notes: Vec<&str> = status
            .history
            .iter()
            .map(|e| e.text.as_str())
            .filter(|text| text.starts_with(&format!("writer {t} ")))
            .collect();
        let expected: Vec<String> = (0..10).map(|i| format!("writer {t} note {i}: watch for drones")).collect();
        assert_eq!(notes, expected);
    }
    assert_eq!(
        s.combined_instruction(),
        fold_history(&status.history, &EngineConfig::default().instruction)
    );
    assert_eq!(status.categories, vec!["weapon", "unauthorized_drone"]);
}

#[test]
fn test_session_commands_drive_state() {
    let s = session();
    let script = ["also watch for unattended bags", "/run", "/clear", "/status"];
    for line in script {
        match line.parse::<SessionCommand>().unwrap() {
            SessionCommand::Instruction(text) => {
                s.add_instruction(&text);
            }
            SessionCommand::Run => {
                s.run_cycle();
            }
            SessionCommand::Clear => s.clear_instructions(),
            SessionCommand::Status => {
                let status = s.status();
                assert_eq!(status.history.len(), 1);
                assert_eq!(status.cycles_completed, 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_timer_stops_after_shutdown() {
    let s = session();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = s.spawn_auto_cycle(Duration::from_millis(10), tx);

    let first = rx.recv().await.unwrap();
    s.add_instruction("Immediately report any weapons");
    let mut latest = rx.recv().await.unwrap();
    assert!(latest.cycle > first.cycle);

    s.shutdown();
    handle.await.unwrap();
    while let Some(report) = rx.recv().await {
        latest = report;
    }

    let cycles = s.status().cycles_completed;
    assert_eq!(latest.cycle, cycles);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(s.status().cycles_completed, cycles);
}

#[tokio::test]
async fn test_instruction_applies_to_next_cycle() {
    let s = session();
    let before = s.run_cycle();
    assert!(before
        .output
        .alerts
        .iter()
        .all(|a| !a.reason.contains("unattended_bag")));

    s.add_instruction("urgent: unattended bag near gate");
    let after = s.run_cycle();
    assert!(after
        .output
        .alerts
        .iter()
        .any(|a| a.reason.contains("unattended_bag")));
}
