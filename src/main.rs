//! Drone Overwatch - live operator session
//!
//! Loads one snapshot, runs an initial cycle, then reads operator commands
//! from stdin. Plain text stacks a new instruction on the earlier ones; the
//! optional auto-cycle timer re-evaluates in the background.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use drone_overwatch::cli::{init_tracing, InputArgs};
use drone_overwatch::core::error::{OverwatchError, Result};
use drone_overwatch::pipeline::format_report;
use drone_overwatch::session::{
    CycleReport, InstructionUpdate, LiveSession, SessionCommand, SessionStatus,
};

/// Live operator session: instructions stack and take effect on the next cycle
#[derive(Parser, Debug)]
#[command(name = "overwatch")]
#[command(about = "Drone decision engine live operator session")]
struct Args {
    #[command(flatten)]
    input: InputArgs,

    /// Auto re-evaluation interval in seconds (0 = manual)
    #[arg(long, default_value_t = 0.0)]
    interval: f64,
}

fn print_banner(session: &LiveSession, interval: Option<Duration>) {
    println!("\n=== DRONE OVERWATCH: LIVE SESSION ===");
    println!("Type new instructions anytime. They stack on top of previous");
    println!("ones and take effect on the next cycle.");
    println!();
    println!("Commands:");
    println!("  <any text>        - Add an instruction");
    println!("  /status           - Show active instructions");
    println!("  /clear            - Reset to the original briefing");
    println!("  /run              - Force an immediate re-evaluation");
    println!("  /interval <secs>  - Change auto-cycle interval (0 = manual)");
    println!("  /quit             - End the session");
    println!();

    let status = session.status();
    println!("  Base instruction: \"{}\"", session.base_instruction());
    println!("  Watchlist: {}", status.categories.join(", "));
    match interval {
        Some(period) => println!(
            "  Auto-cycle every {:.0}s (type /interval 0 for manual)",
            period.as_secs_f64()
        ),
        None => println!("  Manual mode: type /run to evaluate (or /interval 10 for auto)"),
    }
    println!();
}

fn print_cycle(report: &CycleReport) {
    println!("\n  -- CYCLE #{} at {} --", report.cycle, report.timestamp);
    println!("{}", format_report(&report.output));
}

fn print_update(update: &InstructionUpdate) {
    println!(
        "\n  [{}] Instruction added: \"{}\"",
        update.entry.timestamp, update.entry.text
    );
    if update.new_categories.is_empty() {
        println!("  (no new keyword categories detected; instruction still recorded)");
    } else {
        println!("  Watchlist updated: +{}", update.new_categories.join(", "));
    }
    println!(
        "  Active rules: {} categories, urgency={:.1}\n",
        update.active_categories, update.global_urgency
    );
}

fn print_status(status: &SessionStatus) {
    println!("\n  -- ACTIVE INSTRUCTIONS --");
    for entry in &status.history {
        println!("  [{}] {}", entry.timestamp, entry.text);
    }
    let categories = if status.categories.is_empty() {
        "(none)".to_string()
    } else {
        status.categories.join(", ")
    };
    println!("\n  Combined watchlist categories: {categories}");
    println!("  Global urgency: {:.1}", status.global_urgency);
    println!("  Cycles completed: {}\n", status.cycles_completed);
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = Arc::new(args.input.load_config()?);
    let payload = args.input.load_input()?;
    let session = LiveSession::new(payload, config);

    let mut interval = Duration::try_from_secs_f64(args.interval)
        .ok()
        .filter(|period| !period.is_zero());

    print_banner(&session, interval);
    print_cycle(&session.run_cycle());

    // Background cycle reports
    let (report_tx, mut report_rx) = mpsc::unbounded_channel::<CycleReport>();
    let printer = tokio::spawn(async move {
        while let Some(report) = report_rx.recv().await {
            print_cycle(&report);
        }
    });

    let mut auto_cycle: Option<JoinHandle<()>> =
        interval.map(|period| session.spawn_auto_cycle(period, report_tx.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("operator> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.parse::<SessionCommand>() {
            Ok(SessionCommand::Empty) => continue,
            Ok(SessionCommand::Quit) => {
                println!("\n  Ending live session.");
                break;
            }
            Ok(SessionCommand::Status) => print_status(&session.status()),
            Ok(SessionCommand::Clear) => {
                session.clear_instructions();
                println!("\n  Instructions cleared. Back to original briefing only.\n");
            }
            Ok(SessionCommand::Run) => print_cycle(&session.run_cycle()),
            Ok(SessionCommand::Interval(period)) => {
                if let Some(handle) = auto_cycle.take() {
                    handle.abort();
                }
                interval = period;
                match period {
                    Some(period) => {
                        auto_cycle = Some(session.spawn_auto_cycle(period, report_tx.clone()));
                        println!("\n  Auto-cycle set to {:.0}s\n", period.as_secs_f64());
                    }
                    None => println!("\n  Switched to manual mode. Type /run to evaluate.\n"),
                }
            }
            Ok(SessionCommand::Instruction(text)) => {
                print_update(&session.add_instruction(&text));
                if interval.is_none() {
                    print_cycle(&session.run_cycle());
                }
            }
            Err(OverwatchError::InvalidCommand(msg)) => println!("  {msg}"),
            Err(e) => println!("  {e}"),
        }
    }

    session.shutdown();
    if let Some(handle) = auto_cycle {
        let _ = handle.await;
    }
    drop(report_tx);
    let _ = printer.await;

    Ok(())
}
