//! Live operator sessions

pub mod command;
pub mod controller;

pub use command::SessionCommand;
pub use controller::{
    fold_history, CycleReport, InstructionEntry, InstructionUpdate, LiveSession, SessionStatus,
};
