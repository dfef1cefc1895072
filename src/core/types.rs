//! Core type definitions used throughout the codebase
//!
//! These mirror the upstream detector's output format so a payload produced
//! by the CV pipeline deserializes directly into `DecisionInput`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::OverwatchError;

/// Point in top-down pixel coordinates, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint(pub f64, pub f64);

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(x, y)
    }

    pub fn x(&self) -> f64 {
        self.0
    }

    pub fn y(&self) -> f64 {
        self.1
    }

    pub fn distance(&self, other: &Self) -> f64 {
        (self.0 - other.0).hypot(self.1 - other.1)
    }
}

/// Axis-aligned box `[x, y, w, h]` in top-down pixel coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelBox(pub f64, pub f64, pub f64, pub f64);

impl PixelBox {
    /// Center using integer halving of width/height, matching the detector's convention
    pub fn center(&self) -> PixelPoint {
        PixelPoint(
            self.0 + (self.2 / 2.0).floor(),
            self.1 + (self.3 / 2.0).floor(),
        )
    }
}

/// Operator focus hint carried alongside the instruction text
///
/// Accepted and echoed through the pipeline; it does not alter scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityMode {
    Safety,
    Crowd,
    Theft,
    #[default]
    General,
}

impl FromStr for PriorityMode {
    type Err = OverwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "safety" => Ok(Self::Safety),
            "crowd" => Ok(Self::Crowd),
            "theft" => Ok(Self::Theft),
            "general" => Ok(Self::General),
            _ => Err(OverwatchError::InvalidPriorityMode(s.to_string())),
        }
    }
}

/// Discrete drone command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Move,
    Hover,
    Zoom,
    Track,
    Orbit,
    Ascend,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Move => "MOVE",
            ActionKind::Hover => "HOVER",
            ActionKind::Zoom => "ZOOM",
            ActionKind::Track => "TRACK",
            ActionKind::Orbit => "ORBIT",
            ActionKind::Ascend => "ASCEND",
        };
        f.write_str(name)
    }
}

/// Severity tier derived from a risk score
///
/// Variant order is the escalation order, so `Ord` ranks CRITICAL highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

/// Who an alert should be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyTarget {
    EventStaff,
    Security,
    Authorities,
}

impl fmt::Display for NotifyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotifyTarget::EventStaff => "event_staff",
            NotifyTarget::Security => "security",
            NotifyTarget::Authorities => "authorities",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Inputs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorInstruction {
    pub text: String,
    #[serde(default)]
    pub priority_mode: PriorityMode,
}

impl OperatorInstruction {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority_mode: PriorityMode::General,
        }
    }
}

fn default_altitude_ft() -> f64 {
    100.0
}

fn default_zoom_level() -> f64 {
    1.0
}

/// Drone pose at the time of the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneState {
    pub position_px: PixelPoint,
    #[serde(default = "default_altitude_ft")]
    pub altitude_ft: f64,
    #[serde(default)]
    pub heading_deg: f64,
    #[serde(default = "default_zoom_level")]
    pub zoom_level: f64,
}

impl DroneState {
    pub fn at(position_px: PixelPoint) -> Self {
        Self {
            position_px,
            altitude_ft: default_altitude_ft(),
            heading_deg: 0.0,
            zoom_level: default_zoom_level(),
        }
    }
}

/// Restricted zone outline as a list of top-down pixel vertices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<PixelPoint>,
}

/// One cycle's snapshot of drone pose and venue metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneContext {
    pub scene_id: String,
    #[serde(default)]
    pub topdown_media_path: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub venue_map_scale_ft_per_px: Option<f64>,
    #[serde(default)]
    pub restricted_zones: Option<Vec<Polygon>>,
    pub drone_state: DroneState,
}

impl SceneContext {
    pub fn new(scene_id: impl Into<String>, drone_state: DroneState) -> Self {
        Self {
            scene_id: scene_id.into(),
            topdown_media_path: None,
            timestamp: None,
            venue_map_scale_ft_per_px: None,
            restricted_zones: None,
            drone_state,
        }
    }
}

/// One externally detected entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectOfInterest {
    pub object_id: String,
    pub label: String,
    pub confidence: f64,
    #[serde(default)]
    pub crop_media_path: Option<String>,
    pub topdown_bbox: PixelBox,
    pub topdown_center: PixelPoint,
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub risk_hints: BTreeMap<String, f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ObjectOfInterest {
    /// Object with a zero-size box at `center`; callers fill in the rest
    pub fn new(
        object_id: impl Into<String>,
        label: impl Into<String>,
        confidence: f64,
        center: PixelPoint,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            label: label.into(),
            confidence,
            crop_media_path: None,
            topdown_bbox: PixelBox(center.0, center.1, 0.0, 0.0),
            topdown_center: center,
            track_id: None,
            risk_hints: BTreeMap::new(),
            notes: None,
        }
    }

    pub fn with_hint(mut self, name: impl Into<String>, intensity: f64) -> Self {
        self.risk_hints.insert(name.into(), intensity);
        self
    }
}

// ============================================================================
// Outputs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub rank: u32,
    pub action_type: ActionKind,
    pub parameters: String,
    pub target_object_id: Option<String>,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: Severity,
    pub notify: Vec<NotifyTarget>,
    pub object_id: Option<String>,
    pub reason: String,
    pub next_steps: String,
}

/// Note flagging an inferred default or a truncation in the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assumption {
    pub text: String,
}

impl Assumption {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
