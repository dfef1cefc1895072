//! One decision cycle: parse -> score -> plan -> alert

pub mod report;

use serde::{Deserialize, Serialize};

use crate::alerting::generate_alerts;
use crate::core::config::EngineConfig;
use crate::core::error::{OverwatchError, Result};
use crate::core::types::{
    Alert, Assumption, ObjectOfInterest, OperatorInstruction, RecommendedAction, SceneContext,
};
use crate::instruction::parse_instruction;
use crate::planning::plan_actions;
use crate::scoring::{score_all_objects, ScoredObject};

pub use report::format_report;

/// Number of top-scored objects listed in the summary
const SUMMARY_LEN: usize = 3;

/// Everything needed for one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionInput {
    pub scene: SceneContext,
    pub objects: Vec<ObjectOfInterest>,
    pub instruction: OperatorInstruction,
}

impl DecisionInput {
    /// Reject payloads that would break the score invariants
    pub fn validate(&self) -> Result<()> {
        for obj in &self.objects {
            if !(0.0..=1.0).contains(&obj.confidence) {
                return Err(OverwatchError::InvalidInput(format!(
                    "object '{}' has confidence {} outside [0, 1]",
                    obj.object_id, obj.confidence
                )));
            }
            if let Some((name, intensity)) = obj.risk_hints.iter().find(|(_, v)| **v < 0.0) {
                return Err(OverwatchError::InvalidInput(format!(
                    "object '{}' has negative intensity {} for hint '{}'",
                    obj.object_id, intensity, name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutput {
    pub summary: Vec<String>,
    pub actions: Vec<RecommendedAction>,
    pub alerts: Vec<Alert>,
    pub assumptions: Vec<Assumption>,
}

/// Summary line for one scored object
pub fn summary_line(scored: &ScoredObject<'_>, config: &EngineConfig) -> String {
    let obj = scored.object;
    format!(
        "[{}] '{}' (id={}, confidence={:.0}%, score={:.2})",
        config.severity.classify(scored.risk_score),
        obj.label,
        obj.object_id,
        obj.confidence * 100.0,
        scored.risk_score
    )
}

/// Run the full pipeline on one snapshot
///
/// Nothing carries over between calls; the output depends only on `input`
/// and `config`.
pub fn run_pipeline(input: &DecisionInput, config: &EngineConfig) -> DecisionOutput {
    let parsed = parse_instruction(&input.instruction.text, &config.instruction);
    let scored = score_all_objects(&input.objects, &input.scene, &parsed, &config.scoring);
    let (actions, assumptions) = plan_actions(&scored, &input.scene, config);
    let alerts = generate_alerts(&scored, config);

    let summary = scored
        .iter()
        .take(SUMMARY_LEN)
        .map(|so| summary_line(so, config))
        .collect();

    tracing::debug!(
        scene = %input.scene.scene_id,
        priority = ?input.instruction.priority_mode,
        actions = actions.len(),
        alerts = alerts.len(),
        "Pipeline complete"
    );

    DecisionOutput {
        summary,
        actions,
        alerts,
        assumptions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{DroneState, PixelPoint};

    fn input(objects: Vec<ObjectOfInterest>, text: &str) -> DecisionInput {
        DecisionInput {
            scene: SceneContext::new("pipe", DroneState::at(PixelPoint::new(500.0, 500.0))),
            objects,
            instruction: OperatorInstruction::new(text),
        }
    }

    #[test]
    fn test_summary_lists_top_three() {
        let objects = (0..5)
            .map(|i| ObjectOfInterest::new(format!("o{i}"), "fight", 1.0, PixelPoint::new(500.0 + i as f64, 500.0)))
            .collect();
        let output = run_pipeline(&input(objects, ""), &EngineConfig::default());
        assert_eq!(output.summary.len(), 3);
        assert_eq!(
            output.summary[0],
            "[MEDIUM] 'fight' (id=o0, confidence=100%, score=8.00)"
        );
    }

    #[test]
    fn test_empty_objects() {
        let output = run_pipeline(&input(Vec::new(), "watch for fights"), &EngineConfig::default());
        assert!(output.summary.is_empty());
        assert!(output.actions.is_empty());
        assert!(output.alerts.is_empty());
        assert_eq!(output.assumptions.len(), 1);
    }

    #[test]
    fn test_validate_rejects_out_of_range_confidence() {
        let bad = input(
            vec![ObjectOfInterest::new("x", "bag", 1.5, PixelPoint::new(0.0, 0.0))],
            "",
        );
        assert!(matches!(bad.validate(), Err(OverwatchError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_negative_hint() {
        let bad = input(
            vec![ObjectOfInterest::new("x", "bag", 0.5, PixelPoint::new(0.0, 0.0)).with_hint("running", -1.0)],
            "",
        );
        assert!(matches!(bad.validate(), Err(OverwatchError::InvalidInput(_))));
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let objects = vec![
            ObjectOfInterest::new("a", "weapon", 0.9, PixelPoint::new(520.0, 480.0)),
            ObjectOfInterest::new("b", "bag", 0.4, PixelPoint::new(300.0, 700.0)).with_hint("unattended", 0.9),
        ];
        let payload = input(objects, "urgent: weapons and unattended bags");
        let config = EngineConfig::default();
        assert_eq!(run_pipeline(&payload, &config), run_pipeline(&payload, &config));
    }
}
