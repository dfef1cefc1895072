//! Drone action planning

pub mod cluster;
pub mod planner;

pub use cluster::{scan_clusters, ClusterScan};
pub use planner::plan_actions;
