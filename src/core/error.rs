use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverwatchError {
    #[error("No detections.json found in {0:?}")]
    MissingManifest(PathBuf),

    #[error("Malformed detection manifest {path:?}: {reason}")]
    MalformedManifest { path: PathBuf, reason: String },

    #[error("Invalid priority mode: {0} (expected safety, crowd, theft or general)")]
    InvalidPriorityMode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, OverwatchError>;
