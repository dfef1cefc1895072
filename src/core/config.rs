//! Engine configuration with documented constants
//!
//! Every weight, threshold and lookup table lives here. An `EngineConfig` is
//! built once (defaults or a TOML override file) and passed by reference into
//! each pipeline stage, so deployments can be tuned and tests can run against
//! isolated tables.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{OverwatchError, Result};
use crate::core::types::{NotifyTarget, Severity};

/// Top-level configuration shared by every stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub instruction: InstructionConfig,
    pub scoring: ScoringConfig,
    pub planner: PlannerConfig,
    pub severity: SeverityConfig,
    pub alerting: AlertingConfig,
}

// === INSTRUCTION PARSING ===

/// A watchlist category and the phrases that select it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistCategory {
    pub name: String,
    pub synonyms: Vec<String>,
}

/// An urgency phrase and the multiplier it implies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgencyModifier {
    pub phrase: String,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructionConfig {
    /// Ordered catalogue; rule order in a parsed instruction follows it
    pub watchlist: Vec<WatchlistCategory>,

    /// Highest matching multiplier wins, floored at 1.0
    pub urgency_modifiers: Vec<UrgencyModifier>,
}

// === SCORING ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Base risk per label on a 0-10 scale (keys are lower-case)
    pub label_weights: BTreeMap<String, f64>,

    /// Weight for labels not in the table; the vocabulary is open-ended
    pub default_label_weight: f64,

    /// Bonus weight per risk-hint name, multiplied by the hint intensity
    pub hint_weights: BTreeMap<String, f64>,

    pub default_hint_weight: f64,

    /// Confidence is raised to this power (> 1 penalizes weak detections)
    ///
    /// At 1.2, a 0.8 detection keeps ~76% of its weight while a 0.3
    /// detection keeps ~24%.
    pub confidence_exponent: f64,

    /// Decay constant (pixels) for `exp(-distance / decay)`
    pub proximity_decay_px: f64,

    /// Flat boost when an object matches the operator's watchlist,
    /// multiplied by the instruction's global urgency
    pub instruction_match_boost: f64,

    /// Object count at which scoring fans out across the rayon pool
    pub parallel_threshold: usize,
}

// === ACTION PLANNING ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Only the highest-scored objects are planned for
    pub top_n_objects: usize,

    /// Hard cap on emitted actions per cycle
    pub max_actions: usize,

    /// Feet per pixel used when the scene carries no venue scale
    pub default_scale_ft_per_px: f64,

    /// Two objects closer than this (pixels) form a close pair
    pub cluster_radius_px: f64,

    /// Close pairs required before a cluster is declared
    pub cluster_min_pairs: usize,

    /// Distinct objects that must take part in those pairs
    pub cluster_min_objects: usize,

    /// Altitude gained by the leading ASCEND on a cluster
    pub ascend_gain_ft: f64,

    pub zoom_step: f64,
    pub max_zoom: f64,

    /// LOW objects nearer than this (feet) get an ORBIT
    pub orbit_trigger_ft: f64,
    pub orbit_radius_ft: f64,

    /// Detections below this confidence are flagged for human confirmation
    pub low_confidence_threshold: f64,
}

// === SEVERITY ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    pub min_score: f64,
    pub severity: Severity,
}

/// Descending score thresholds; the first one a score meets wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityConfig {
    pub thresholds: Vec<SeverityThreshold>,
}

impl SeverityConfig {
    pub fn classify(&self, score: f64) -> Severity {
        self.thresholds
            .iter()
            .find(|t| score >= t.min_score)
            .map(|t| t.severity)
            .unwrap_or(Severity::Low)
    }
}

// === ALERTING ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertingConfig {
    pub notify: BTreeMap<Severity, Vec<NotifyTarget>>,

    /// Curated next steps keyed by lower-case label, then severity
    pub playbook: BTreeMap<String, BTreeMap<Severity, String>>,

    /// Next steps when the label has no entry for the severity
    pub default_next_steps: BTreeMap<Severity, String>,

    pub fallback_next_steps: String,
}

impl AlertingConfig {
    pub fn notify_targets(&self, severity: Severity) -> Vec<NotifyTarget> {
        self.notify
            .get(&severity)
            .cloned()
            .unwrap_or_else(|| vec![NotifyTarget::EventStaff])
    }

    pub fn next_steps(&self, label: &str, severity: Severity) -> &str {
        let key = label.trim().to_lowercase();
        self.playbook
            .get(&key)
            .and_then(|steps| steps.get(&severity))
            .or_else(|| self.default_next_steps.get(&severity))
            .map(String::as_str)
            .unwrap_or(&self.fallback_next_steps)
    }
}

// ============================================================================
// Defaults
// ============================================================================

fn weight_table(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn steps(entries: &[(Severity, &str)]) -> BTreeMap<Severity, String> {
    entries.iter().map(|(s, t)| (*s, t.to_string())).collect()
}

impl Default for InstructionConfig {
    fn default() -> Self {
        let catalogue: &[(&str, &[&str])] = &[
            ("weapon", &["weapon", "gun", "knife", "armed", "firearm", "rifle", "shooter"]),
            ("fight", &["fight", "fighting", "brawl", "altercation", "assault", "violence", "confrontation"]),
            ("unattended_bag", &[
                "unattended bag", "abandoned bag", "suspicious bag",
                "unattended package", "abandoned package", "suspicious package",
            ]),
            ("crowd_cluster", &[
                "overcrowding", "crowd", "overcrowded", "stampede", "crush",
                "crowd surge", "crowd density",
            ]),
            ("medical_emergency", &["medical", "injury", "injured", "unconscious", "collapse", "seizure"]),
            ("fire", &["fire", "smoke", "flames"]),
            ("restricted_zone", &[
                "restricted", "restricted area", "restricted zone", "off-limits",
                "no-go zone", "perimeter breach", "perimeter", "barricade",
            ]),
            ("theft", &["theft", "stealing", "pickpocket", "shoplifting", "robbery"]),
            ("stage_rush", &["stage rush", "rushing the stage", "rushing stage", "charging stage", "stage approach"]),
            ("perimeter_breach", &[
                "perimeter breach", "breach", "fence breach", "barricade breach",
                "barrier breach", "break through",
            ]),
            ("rooftop_figure", &["rooftop", "roof", "elevated position", "sniper", "overwatch", "high ground"]),
            ("suspicious_person", &[
                "suspicious person", "suspicious individual", "suspicious behavior",
                "acting suspicious", "loitering",
            ]),
            ("unauthorized_vehicle", &[
                "unauthorized vehicle", "vehicle breach", "vehicle approaching",
                "rogue vehicle", "car approaching",
            ]),
            ("unauthorized_drone", &["drone", "unauthorized drone", "rogue drone", "unknown aircraft", "uav"]),
            ("vip_threat", &["vip", "speaker", "official", "dignitary", "protectee", "principal"]),
            ("protest_group", &["protest", "protester", "demonstrator", "rally group", "agitator"]),
            ("alcohol", &[
                "alcohol", "drinking", "beer", "liquor", "bottle", "flask",
                "open container", "intoxicated", "drunk",
            ]),
            ("drugs", &[
                "drugs", "drug use", "narcotics", "smoking weed", "joint",
                "syringe", "needle", "paraphernalia",
            ]),
            ("smoking", &["smoking", "cigarette", "vaping", "vape"]),
            ("trespassing", &["trespassing", "trespasser", "unauthorized entry", "sneaking in", "jumped fence"]),
            ("vandalism", &["vandalism", "graffiti", "property damage", "tagging", "spray paint"]),
        ];

        let urgency: &[(&str, f64)] = &[
            ("immediately", 2.0),
            ("urgent", 1.8),
            ("high priority", 1.5),
            ("asap", 1.5),
            ("critical", 2.0),
            ("watch for", 1.0),
            ("monitor", 0.8),
            ("keep an eye on", 0.8),
        ];

        Self {
            watchlist: catalogue
                .iter()
                .map(|(name, synonyms)| WatchlistCategory {
                    name: name.to_string(),
                    synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
            urgency_modifiers: urgency
                .iter()
                .map(|(phrase, multiplier)| UrgencyModifier {
                    phrase: phrase.to_string(),
                    multiplier: *multiplier,
                })
                .collect(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            label_weights: weight_table(&[
                // Weapons & violence
                ("weapon", 10.0),
                ("fight", 8.0),
                ("medical_emergency", 8.0),
                ("fire", 9.0),
                // Objects
                ("unattended_bag", 6.0),
                ("bag", 3.0),
                ("suspicious_package", 7.0),
                ("unknown_object", 4.0),
                // People & crowds
                ("crowd_cluster", 5.0),
                ("person", 1.0),
                ("suspicious_person", 6.0),
                ("rushing_individual", 7.0),
                ("protest_group", 5.0),
                // Vehicles
                ("vehicle", 3.0),
                ("unauthorized_vehicle", 7.0),
                ("approaching_vehicle", 6.0),
                // Event security
                ("perimeter_breach", 8.0),
                ("rooftop_figure", 8.0),
                ("stage_rush", 9.0),
                ("counter_surveillance", 6.0),
                ("unauthorized_drone", 8.0),
                ("barricade_breach", 7.0),
                ("vip_threat", 9.0),
                ("confrontation", 7.0),
                // Policy violations
                ("alcohol", 3.0),
                ("drugs", 5.0),
                ("smoking", 2.0),
                ("graffiti", 2.0),
                ("trespassing", 5.0),
                ("vandalism", 4.0),
            ]),
            default_label_weight: 2.0,
            hint_weights: weight_table(&[
                ("unattended", 3.0),
                ("running", 2.0),
                ("aggressive", 3.5),
                ("loitering", 1.5),
                ("in_restricted_zone", 4.0),
                ("stationary_long", 2.0),
                ("approaching_stage", 4.5),
                ("breaching_perimeter", 5.0),
                ("concealed_object", 3.5),
                ("erratic_movement", 3.0),
                ("climbing", 3.5),
                ("near_vip", 4.0),
                ("counter_flow", 2.5),
                ("obscured_face", 2.0),
                ("coordinated_movement", 3.0),
            ]),
            default_hint_weight: 1.0,
            confidence_exponent: 1.2,
            proximity_decay_px: 500.0,
            instruction_match_boost: 3.0,
            parallel_threshold: 1000,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            top_n_objects: 8,
            max_actions: 12,
            default_scale_ft_per_px: 0.5,
            cluster_radius_px: 150.0,
            cluster_min_pairs: 3,
            cluster_min_objects: 3,
            ascend_gain_ft: 30.0,
            zoom_step: 1.0,
            max_zoom: 5.0,
            orbit_trigger_ft: 50.0,
            orbit_radius_ft: 20.0,
            low_confidence_threshold: 0.5,
        }
    }
}

impl Default for SeverityConfig {
    fn default() -> Self {
        let tiers = [
            (15.0, Severity::Critical),
            (10.0, Severity::High),
            (5.0, Severity::Medium),
            (0.0, Severity::Low),
        ];
        Self {
            thresholds: tiers
                .iter()
                .map(|(min_score, severity)| SeverityThreshold {
                    min_score: *min_score,
                    severity: *severity,
                })
                .collect(),
        }
    }
}

impl Default for AlertingConfig {
    fn default() -> Self {
        use Severity::*;

        let notify = [
            (Critical, vec![NotifyTarget::Security, NotifyTarget::Authorities]),
            (High, vec![NotifyTarget::Security]),
            (Medium, vec![NotifyTarget::EventStaff, NotifyTarget::Security]),
            (Low, vec![NotifyTarget::EventStaff]),
        ]
        .into_iter()
        .collect();

        let playbook: &[(&str, &[(Severity, &str)])] = &[
            ("weapon", &[
                (High, "Dispatch armed security immediately. Keep drone tracking the individual. Do NOT engage."),
                (Critical, "Alert authorities. Evacuate nearby zones. Maintain drone visual lock."),
            ]),
            ("weapon?", &[
                (High, "Dispatch security to verify. Zoom in for confirmation. Keep distance."),
                (Critical, "Treat as confirmed weapon until verified. Alert authorities."),
            ]),
            ("fight", &[
                (High, "Dispatch security to intervene. Track all involved individuals."),
                (Medium, "Monitor closely. Zoom in for documentation. Alert event staff."),
            ]),
            ("medical_emergency", &[
                (High, "Dispatch medical team. Keep area clear for responders."),
                (Medium, "Alert event staff. Monitor for deterioration."),
            ]),
            ("fire", &[
                (High, "Alert fire department. Begin evacuation protocols. Ascend drone for overview."),
                (Critical, "Emergency evacuation. Alert all authorities. Ascend to safe altitude."),
            ]),
            ("unattended_bag", &[
                (High, "Dispatch bomb squad / security. Clear surrounding area."),
                (Medium, "Send event staff to investigate. Keep drone hovering over the item."),
            ]),
            ("crowd_cluster", &[
                (High, "Potential crush: alert security for crowd control. Gain altitude for overview."),
                (Medium, "Monitor crowd density. Alert event staff if density increases."),
            ]),
            ("stage_rush", &[
                (Critical, "Individual rushing stage: alert VIP detail immediately. Drone track and zoom."),
                (High, "Possible stage approach: dispatch security to intercept. Maintain visual lock."),
            ]),
            ("perimeter_breach", &[
                (Critical, "Active perimeter breach: alert all security teams. Drone reposition to track."),
                (High, "Breach detected: dispatch nearest security unit. Zoom in for identification."),
                (Medium, "Possible perimeter violation: send staff to verify. Monitor with drone."),
            ]),
            ("rooftop_figure", &[
                (Critical, "Figure on rooftop with possible weapon: alert counter-sniper team and authorities."),
                (High, "Person detected at elevated position: dispatch security to investigate. Drone zoom for ID."),
            ]),
            ("suspicious_person", &[
                (High, "Suspicious individual near secured area: dispatch plainclothes security. Track with drone."),
                (Medium, "Monitor individual closely. Zoom in for behavioral confirmation."),
            ]),
            ("rushing_individual", &[
                (Critical, "Individual rushing toward VIP/stage: alert protective detail immediately."),
                (High, "Person running in secured zone: dispatch security. Drone track for direction of travel."),
            ]),
            ("unauthorized_vehicle", &[
                (Critical, "Unauthorized vehicle approaching secured perimeter: alert authorities. Possible VBIED."),
                (High, "Unknown vehicle near event: dispatch security to intercept. Ascend for plate capture."),
            ]),
            ("unauthorized_drone", &[
                (High, "Unknown drone in airspace: alert FAA liaison and security. Attempt visual ID."),
                (Medium, "Possible drone detected: zoom in for confirmation. Log position and heading."),
            ]),
            ("barricade_breach", &[
                (High, "Barricade breach: dispatch security to seal gap. Track individuals who entered."),
                (Medium, "Barricade pressure detected: alert crowd management team."),
            ]),
            ("vip_threat", &[
                (Critical, "Direct threat to VIP detected: alert protective detail. Evacuate if needed."),
                (High, "Potential threat near VIP: dispatch advance security. Drone maintain overwatch."),
            ]),
            ("protest_group", &[
                (High, "Protest group turning aggressive: alert riot response. Gain altitude for overview."),
                (Medium, "Protest group active: monitor for escalation. Track group movement."),
            ]),
            ("confrontation", &[
                (High, "Physical confrontation in progress: dispatch security. Track all involved parties."),
                (Medium, "Verbal altercation detected: monitor for escalation. Zoom in for documentation."),
            ]),
        ];

        Self {
            notify,
            playbook: playbook
                .iter()
                .map(|(label, entries)| (label.to_string(), steps(entries)))
                .collect(),
            default_next_steps: steps(&[
                (Critical, "Dispatch security and alert authorities immediately. Maintain drone visual."),
                (High, "Dispatch security to investigate. Continue drone monitoring."),
                (Medium, "Alert event staff to check. Zoom in for confirmation."),
                (Low, "Log and continue monitoring."),
            ]),
            fallback_next_steps: "Continue monitoring.".to_string(),
        }
    }
}

// ============================================================================
// Loading & validation
// ============================================================================

impl EngineConfig {
    /// Create a config with default tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML override; sections and fields left out keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        tracing::info!(path = %path.display(), "Loading engine config");
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(OverwatchError::InvalidConfig(msg)) };

        let thresholds = &self.severity.thresholds;
        if thresholds.is_empty() {
            return invalid("severity thresholds must not be empty".into());
        }
        if thresholds.windows(2).any(|w| w[0].min_score <= w[1].min_score) {
            return invalid("severity thresholds must be strictly descending".into());
        }
        if thresholds.last().map(|t| t.min_score) != Some(0.0) {
            return invalid("the last severity threshold must start at 0.0".into());
        }

        let scoring = &self.scoring;
        if scoring.confidence_exponent <= 1.0 {
            return invalid(format!(
                "confidence_exponent ({}) must be > 1.0",
                scoring.confidence_exponent
            ));
        }
        if scoring.proximity_decay_px <= 0.0 {
            return invalid("proximity_decay_px must be positive".into());
        }
        if scoring.default_label_weight < 0.0
            || scoring.default_hint_weight < 0.0
            || scoring.instruction_match_boost < 0.0
        {
            return invalid("default weights and match boost must be non-negative".into());
        }

        let planner = &self.planner;
        if planner.top_n_objects == 0 {
            return invalid("top_n_objects must be at least 1".into());
        }
        if planner.default_scale_ft_per_px <= 0.0 {
            return invalid("default_scale_ft_per_px must be positive".into());
        }

        if self
            .instruction
            .urgency_modifiers
            .iter()
            .any(|m| m.multiplier <= 0.0)
        {
            return invalid("urgency multipliers must be positive".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_classify_thresholds() {
        let severity = SeverityConfig::default();
        assert_eq!(severity.classify(20.0), Severity::Critical);
        assert_eq!(severity.classify(15.0), Severity::Critical);
        assert_eq!(severity.classify(14.999), Severity::High);
        assert_eq!(severity.classify(10.0), Severity::High);
        assert_eq!(severity.classify(5.0), Severity::Medium);
        assert_eq!(severity.classify(4.999), Severity::Low);
        assert_eq!(severity.classify(0.0), Severity::Low);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
[planner]
top_n_objects = 4

[scoring.label_weights]
drone_swarm = 9.5
"#,
        )
        .unwrap();
        assert_eq!(config.planner.top_n_objects, 4);
        assert_eq!(config.planner.max_actions, 12);
        assert_eq!(config.scoring.label_weights.get("drone_swarm"), Some(&9.5));
        assert_eq!(config.scoring.confidence_exponent, 1.2);
        assert!(!config.instruction.watchlist.is_empty());
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let result = EngineConfig::from_toml_str(
            r#"
[[severity.thresholds]]
min_score = 5.0
severity = "MEDIUM"

[[severity.thresholds]]
min_score = 10.0
severity = "HIGH"
"#,
        );
        assert!(matches!(result, Err(OverwatchError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_flat_confidence_exponent() {
        let result = EngineConfig::from_toml_str("[scoring]\nconfidence_exponent = 1.0\n");
        assert!(matches!(result, Err(OverwatchError::InvalidConfig(_))));
    }

    #[test]
    fn test_next_steps_lookup_levels() {
        let alerting = AlertingConfig::default();
        assert!(alerting
            .next_steps("Weapon", Severity::Critical)
            .starts_with("Alert authorities"));
        // Label known, severity not curated: severity default
        assert_eq!(
            alerting.next_steps("weapon", Severity::Medium),
            "Alert event staff to check. Zoom in for confirmation."
        );
        // Unknown label
        assert_eq!(
            alerting.next_steps("kite", Severity::High),
            "Dispatch security to investigate. Continue drone monitoring."
        );
    }

    #[test]
    fn test_next_steps_generic_fallback() {
        let mut alerting = AlertingConfig::default();
        alerting.default_next_steps.clear();
        assert_eq!(alerting.next_steps("kite", Severity::High), "Continue monitoring.");
    }

    #[test]
    fn test_notify_falls_back_to_event_staff() {
        let mut alerting = AlertingConfig::default();
        alerting.notify.remove(&Severity::High);
        assert_eq!(alerting.notify_targets(Severity::High), vec![NotifyTarget::EventStaff]);
    }
}
