//! Operator command line parsing for the interactive session

use std::str::FromStr;
use std::time::Duration;

use crate::core::error::OverwatchError;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Status,
    Clear,
    Run,
    /// `None` switches to manual cycling
    Interval(Option<Duration>),
    Quit,
    /// Anything not starting with '/'
    Instruction(String),
    Empty,
}

const INTERVAL_USAGE: &str = "Usage: /interval <seconds>";

fn parse_interval(arg: Option<&str>) -> Result<Option<Duration>, OverwatchError> {
    let period = arg
        .and_then(|a| a.parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| OverwatchError::InvalidCommand(INTERVAL_USAGE.to_string()))?;
    Ok((!period.is_zero()).then_some(period))
}

impl FromStr for SessionCommand {
    type Err = OverwatchError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }
        if !line.starts_with('/') {
            return Ok(Self::Instruction(line.to_string()));
        }

        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();
        let extra = parts.next();

        match (name.as_str(), arg) {
            ("/status", None) => Ok(Self::Status),
            ("/clear", None) => Ok(Self::Clear),
            ("/run", None) => Ok(Self::Run),
            ("/quit", None) => Ok(Self::Quit),
            ("/interval", _) if extra.is_none() => parse_interval(arg).map(Self::Interval),
            ("/interval", _) => Err(OverwatchError::InvalidCommand(INTERVAL_USAGE.to_string())),
            _ => Err(OverwatchError::InvalidCommand(format!(
                "Unknown command: {line}. Type /quit to exit."
            ))),
        }
    }
}
