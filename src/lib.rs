//! Drone Overwatch - decision support between a CV detector and a drone operator
//!
//! Each cycle turns a snapshot of detected objects, drone pose and free-text
//! operator guidance into risk scores, a ranked drone action plan and
//! severity-routed alerts.

pub mod alerting;
pub mod api;
pub mod cli;
pub mod core;
pub mod instruction;
pub mod intake;
pub mod pipeline;
pub mod planning;
pub mod scoring;
pub mod session;
