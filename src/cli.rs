//! Command-line plumbing shared by the binaries

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::core::config::EngineConfig;
use crate::core::error::{OverwatchError, Result};
use crate::core::types::{DroneState, OperatorInstruction, PixelPoint, PriorityMode};
use crate::intake::{load_cv_output, IntakeOptions};
use crate::pipeline::DecisionInput;

/// Where a snapshot comes from and how the drone is posed
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// JSON file holding a full DecisionInput payload
    #[arg(long, short = 'i', conflicts_with = "cv_dir", required_unless_present = "cv_dir")]
    pub input: Option<PathBuf>,

    /// CV output folder (detections.json, scene media, crops/)
    #[arg(long)]
    pub cv_dir: Option<PathBuf>,

    /// Operator instruction; required with --cv-dir, replaces the payload's text with --input
    #[arg(long)]
    pub instruction: Option<String>,

    /// Priority mode: safety, crowd, theft or general
    #[arg(long, default_value = "general")]
    pub priority: PriorityMode,

    /// Drone position in top-down pixel coordinates
    #[arg(long, num_args = 2, value_names = ["X", "Y"], default_values_t = [500.0, 500.0])]
    pub drone_pos: Vec<f64>,

    /// Drone altitude in feet
    #[arg(long, default_value_t = 150.0)]
    pub drone_alt: f64,

    /// Drone heading in degrees
    #[arg(long, default_value_t = 0.0)]
    pub drone_heading: f64,

    /// Camera zoom level
    #[arg(long, default_value_t = 1.0)]
    pub drone_zoom: f64,

    /// Venue scale in feet per pixel (default: assumed 0.5)
    #[arg(long)]
    pub scale: Option<f64>,

    /// TOML file overriding engine tables
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl InputArgs {
    pub fn load_config(&self) -> Result<EngineConfig> {
        match &self.config {
            Some(path) => EngineConfig::load(path),
            None => Ok(EngineConfig::default()),
        }
    }

    fn drone_state(&self) -> DroneState {
        let x = self.drone_pos.first().copied().unwrap_or(500.0);
        let y = self.drone_pos.get(1).copied().unwrap_or(500.0);
        DroneState {
            position_px: PixelPoint::new(x, y),
            altitude_ft: self.drone_alt,
            heading_deg: self.drone_heading,
            zoom_level: self.drone_zoom,
        }
    }

    /// Build and validate the snapshot described by the flags
    pub fn load_input(&self) -> Result<DecisionInput> {
        let input = match (&self.input, &self.cv_dir) {
            (Some(path), _) => {
                if !path.exists() {
                    return Err(OverwatchError::InvalidInput(format!(
                        "input file not found: {}",
                        path.display()
                    )));
                }
                let mut input: DecisionInput = serde_json::from_str(&fs::read_to_string(path)?)?;
                if let Some(text) = &self.instruction {
                    input.instruction.text = text.clone();
                }
                input
            }
            (None, Some(dir)) => {
                if !dir.is_dir() {
                    return Err(OverwatchError::InvalidInput(format!(
                        "CV directory not found: {}",
                        dir.display()
                    )));
                }
                let text = self.instruction.clone().ok_or_else(|| {
                    OverwatchError::InvalidInput("--instruction is required with --cv-dir".into())
                })?;
                let options = IntakeOptions {
                    instruction: OperatorInstruction {
                        text,
                        priority_mode: self.priority,
                    },
                    drone_state: self.drone_state(),
                    venue_scale_ft_per_px: self.scale,
                    restricted_zones: None,
                };
                load_cv_output(dir, &options)?
            }
            (None, None) => {
                return Err(OverwatchError::InvalidInput(
                    "provide --input <file.json> or --cv-dir <folder> --instruction <text>".into(),
                ))
            }
        };

        input.validate()?;
        Ok(input)
    }
}

/// Install the tracing subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("drone_overwatch=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        input: InputArgs,
    }

    #[test]
    fn test_defaults_and_drone_pose() {
        let args = Harness::try_parse_from(["t", "--cv-dir", "out", "--instruction", "watch", "--drone-pos", "10", "20"])
            .unwrap()
            .input;
        assert_eq!(args.priority, PriorityMode::General);
        let drone = args.drone_state();
        assert_eq!(drone.position_px, PixelPoint::new(10.0, 20.0));
        assert_eq!(drone.altitude_ft, 150.0);
    }

    #[test]
    fn test_input_and_cv_dir_conflict() {
        assert!(Harness::try_parse_from(["t", "--input", "a.json", "--cv-dir", "out"]).is_err());
        assert!(Harness::try_parse_from(["t"]).is_err());
    }

    #[test]
    fn test_unknown_priority_rejected() {
        assert!(Harness::try_parse_from(["t", "--input", "a.json", "--priority", "panic"]).is_err());
    }

    #[test]
    fn test_cv_dir_requires_instruction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_string_lossy().into_owned();
        let args = Harness::try_parse_from(["t", "--cv-dir", path.as_str()]).unwrap().input;
        assert!(matches!(args.load_input(), Err(OverwatchError::InvalidInput(_))));
    }
}
