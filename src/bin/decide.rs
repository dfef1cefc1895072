//! One-shot decision run
//!
//! Loads a snapshot from a JSON payload or a CV output folder, runs one
//! cycle and prints the situation report (or raw JSON).

use clap::Parser;

use drone_overwatch::cli::{init_tracing, InputArgs};
use drone_overwatch::core::error::Result;
use drone_overwatch::pipeline::{format_report, run_pipeline};

/// Drone decision engine: score, plan and alert for one snapshot
#[derive(Parser, Debug)]
#[command(name = "decide")]
#[command(about = "Run one decision cycle and print the report")]
struct Args {
    #[command(flatten)]
    input: InputArgs,

    /// Print raw JSON output instead of the formatted report
    #[arg(long)]
    json_output: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = args.input.load_config()?;
    let input = args.input.load_input()?;
    let output = run_pipeline(&input, &config);

    if args.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", format_report(&output));
    }
    Ok(())
}
