//! Live operator session with stacking instructions
//!
//! The snapshot (scene + objects) is fixed for the session; operators layer
//! instructions over time and every cycle re-runs the full pipeline with the
//! combined text. Foreground commands and the background auto-cycle task
//! share one lock-guarded state, and a cycle holds that lock for its whole
//! run, so an instruction added mid-cycle lands in the next cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::core::config::{EngineConfig, InstructionConfig};
use crate::core::types::OperatorInstruction;
use crate::instruction::{merge_instructions, parse_instruction, ParsedInstruction};
use crate::pipeline::{run_pipeline, DecisionInput, DecisionOutput};

/// One line of the append-only instruction log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionEntry {
    /// Local wall-clock time, HH:MM:SS
    pub timestamp: String,
    pub text: String,
}

impl InstructionEntry {
    fn now(text: impl Into<String>) -> Self {
        Self {
            timestamp: clock(),
            text: text.into(),
        }
    }
}

fn clock() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// What changed after `add_instruction`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionUpdate {
    pub entry: InstructionEntry,
    /// Categories found in the new text alone
    pub new_categories: Vec<String>,
    pub active_categories: usize,
    pub global_urgency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub history: Vec<InstructionEntry>,
    pub categories: Vec<String>,
    pub global_urgency: f64,
    pub cycles_completed: u64,
}

/// Output of one session cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub timestamp: String,
    pub output: DecisionOutput,
}

/// Parse every history entry and merge them in order
///
/// An empty history yields an empty instruction with urgency 1.0.
pub fn fold_history(history: &[InstructionEntry], config: &InstructionConfig) -> ParsedInstruction {
    history
        .iter()
        .map(|entry| parse_instruction(&entry.text, config))
        .reduce(|combined, next| merge_instructions(&combined, &next))
        .unwrap_or_default()
}

struct SessionState {
    history: Vec<InstructionEntry>,
    combined: ParsedInstruction,
    cycles: u64,
}

struct Shared {
    payload: DecisionInput,
    config: Arc<EngineConfig>,
    state: Mutex<SessionState>,
    active: AtomicBool,
    wake: Notify,
}

/// Handle to a live session; clones share the same state
#[derive(Clone)]
pub struct LiveSession {
    id: Uuid,
    shared: Arc<Shared>,
}

impl LiveSession {
    /// Start a session seeded with the payload's own instruction
    pub fn new(payload: DecisionInput, config: Arc<EngineConfig>) -> Self {
        let seed = vec![InstructionEntry::now(payload.instruction.text.clone())];
        let combined = fold_history(&seed, &config.instruction);
        let id = Uuid::new_v4();

        tracing::info!(
            session = %id,
            scene = %payload.scene.scene_id,
            objects = payload.objects.len(),
            "Live session started"
        );

        Self {
            id,
            shared: Arc::new(Shared {
                payload,
                config,
                state: Mutex::new(SessionState {
                    history: seed,
                    combined,
                    cycles: 0,
                }),
                active: AtomicBool::new(true),
                wake: Notify::new(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // Every critical section leaves the state consistent
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Seed instruction text the session started with
    pub fn base_instruction(&self) -> &str {
        &self.shared.payload.instruction.text
    }

    /// Layer a new instruction over the existing ones
    pub fn add_instruction(&self, text: &str) -> InstructionUpdate {
        let parsed = parse_instruction(text, &self.shared.config.instruction);
        let entry = InstructionEntry::now(text);

        let mut state = self.state();
        state.combined = merge_instructions(&state.combined, &parsed);
        state.history.push(entry.clone());

        tracing::info!(
            session = %self.id,
            history = state.history.len(),
            categories = state.combined.rules.len(),
            "Instruction added"
        );

        InstructionUpdate {
            entry,
            new_categories: parsed.categories().map(str::to_string).collect(),
            active_categories: state.combined.rules.len(),
            global_urgency: state.combined.global_urgency,
        }
    }

    /// Drop everything but the seed instruction
    pub fn clear_instructions(&self) {
        let mut state = self.state();
        state.history.truncate(1);
        state.combined = fold_history(&state.history, &self.shared.config.instruction);
        tracing::info!(session = %self.id, "Instructions cleared");
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.state();
        SessionStatus {
            history: state.history.clone(),
            categories: state.combined.categories().map(str::to_string).collect(),
            global_urgency: state.combined.global_urgency,
            cycles_completed: state.cycles,
        }
    }

    /// The merged view of the current history
    pub fn combined_instruction(&self) -> ParsedInstruction {
        self.state().combined.clone()
    }

    /// Run one cycle with the combined instruction text
    pub fn run_cycle(&self) -> CycleReport {
        let mut state = self.state();
        self.cycle_locked(&mut state)
    }

    /// Run one cycle unless the session has been shut down
    ///
    /// The flag is checked under the state lock, so no cycle begins after
    /// `shutdown` returns.
    pub fn run_cycle_while_active(&self) -> Option<CycleReport> {
        let mut state = self.state();
        if !self.is_active() {
            return None;
        }
        Some(self.cycle_locked(&mut state))
    }

    fn cycle_locked(&self, state: &mut SessionState) -> CycleReport {
        state.cycles += 1;

        let mut payload = self.shared.payload.clone();
        payload.instruction = OperatorInstruction {
            text: state.combined.raw_text.clone(),
            priority_mode: self.shared.payload.instruction.priority_mode,
        };
        let output = run_pipeline(&payload, &self.shared.config);

        tracing::debug!(
            session = %self.id,
            cycle = state.cycles,
            actions = output.actions.len(),
            alerts = output.alerts.len(),
            "Cycle complete"
        );

        CycleReport {
            cycle: state.cycles,
            timestamp: clock(),
            output,
        }
    }

    /// Mark the session inactive and wake the auto-cycle task
    ///
    /// Waits for an in-flight cycle to finish.
    pub fn shutdown(&self) {
        {
            let _state = self.state();
            self.shared.active.store(false, Ordering::SeqCst);
        }
        self.shared.wake.notify_waiters();
        tracing::info!(session = %self.id, "Live session ended");
    }

    /// Fire a cycle every `period` until shutdown or until `reports` closes
    ///
    /// Aborting the returned handle stops the timer without interrupting a
    /// cycle, since cycles never await.
    pub fn spawn_auto_cycle(
        &self,
        period: Duration,
        reports: mpsc::UnboundedSender<CycleReport>,
    ) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = session.shared.wake.notified() => {}
                }

                let Some(report) = session.run_cycle_while_active() else {
                    break;
                };
                if reports.send(report).is_err() {
                    break;
                }
            }

            tracing::debug!(session = %session.id, "Auto-cycle stopped");
        })
    }
}
