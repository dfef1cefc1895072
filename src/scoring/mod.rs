//! Composite risk scoring for objects of interest
//!
//! score = label_base × confidence^exp × (0.5 + 0.5 × proximity)
//!       + hint_bonus + instruction_boost
//!
//! Proximity never zeroes the label/confidence term (it floors at half weight
//! far from the drone). Hint and instruction terms are additive and are not
//! distance-gated.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::Serialize;

use crate::core::config::ScoringConfig;
use crate::core::types::{ObjectOfInterest, SceneContext};
use crate::instruction::{instruction_matches_label, ParsedInstruction};

/// Named terms that make up a risk score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub label_base: f64,
    pub confidence_factor: f64,
    pub proximity_factor: f64,
    pub distance_px: f64,
    pub hint_bonus: f64,
    pub instruction_boost: f64,
    pub total: f64,
}

/// An object annotated with its risk score for the current cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredObject<'a> {
    pub object: &'a ObjectOfInterest,
    pub risk_score: f64,
    pub score_breakdown: ScoreBreakdown,
    /// Watchlist categories matched by the label or any hint name
    pub matched_keywords: Vec<String>,
}

/// Base weight for a label
///
/// Exact lower-cased label first; a label flagged uncertain with "?" then
/// falls back to its unflagged form before the default weight applies.
pub fn label_weight(label: &str, config: &ScoringConfig) -> f64 {
    let key = label.trim().to_lowercase();
    if let Some(weight) = config.label_weights.get(&key) {
        return *weight;
    }
    if key.contains('?') {
        if let Some(weight) = config.label_weights.get(key.replace('?', "").trim()) {
            return *weight;
        }
    }
    config.default_label_weight
}

/// Exponential decay in (0, 1]: 1.0 on top of the drone, smoothly falling off
pub fn proximity_factor(distance_px: f64, decay_px: f64) -> f64 {
    (-distance_px / decay_px).exp()
}

/// Score a single object against the scene and the operator's watchlist
pub fn score_object<'a>(
    object: &'a ObjectOfInterest,
    scene: &SceneContext,
    parsed: &ParsedInstruction,
    config: &ScoringConfig,
) -> ScoredObject<'a> {
    let label_base = label_weight(&object.label, config);
    let confidence_factor = object.confidence.max(0.0).powf(config.confidence_exponent);

    let distance_px = object
        .topdown_center
        .distance(&scene.drone_state.position_px);
    let proximity = proximity_factor(distance_px, config.proximity_decay_px);

    let hint_bonus: f64 = object
        .risk_hints
        .iter()
        .map(|(name, intensity)| {
            let weight = config
                .hint_weights
                .get(name.as_str())
                .copied()
                .unwrap_or(config.default_hint_weight);
            weight * intensity
        })
        .sum();

    // Label first, then hint names; categories deduplicated in that order
    let (mut matched, mut categories) = instruction_matches_label(parsed, &object.label);
    for hint_name in object.risk_hints.keys() {
        let (hint_matched, hint_categories) = instruction_matches_label(parsed, hint_name);
        if hint_matched {
            matched = true;
            for category in hint_categories {
                if !categories.contains(&category) {
                    categories.push(category);
                }
            }
        }
    }
    let instruction_boost = if matched {
        config.instruction_match_boost * parsed.global_urgency
    } else {
        0.0
    };

    let total = label_base * confidence_factor * (0.5 + 0.5 * proximity)
        + hint_bonus
        + instruction_boost;

    ScoredObject {
        object,
        risk_score: total,
        score_breakdown: ScoreBreakdown {
            label_base,
            confidence_factor,
            proximity_factor: proximity,
            distance_px,
            hint_bonus,
            instruction_boost,
            total,
        },
        matched_keywords: categories,
    }
}

/// Score every object and return them highest risk first
///
/// Objects are scored independently; equal scores keep input order.
pub fn score_all_objects<'a>(
    objects: &'a [ObjectOfInterest],
    scene: &SceneContext,
    parsed: &ParsedInstruction,
    config: &ScoringConfig,
) -> Vec<ScoredObject<'a>> {
    let mut scored: Vec<ScoredObject<'a>> = if objects.len() >= config.parallel_threshold {
        objects
            .par_iter()
            .map(|obj| score_object(obj, scene, parsed, config))
            .collect()
    } else {
        objects
            .iter()
            .map(|obj| score_object(obj, scene, parsed, config))
            .collect()
    };

    scored.sort_by_key(|s| Reverse(OrderedFloat(s.risk_score)));

    tracing::debug!(
        objects = scored.len(),
        top_score = scored.first().map(|s| s.risk_score),
        "Scored objects"
    );
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::InstructionConfig;
    use crate::core::types::{DroneState, PixelPoint};
    use crate::instruction::parse_instruction;

    fn scene() -> SceneContext {
        SceneContext::new("test-scene", DroneState::at(PixelPoint::new(500.0, 500.0)))
    }

    fn parse(text: &str) -> ParsedInstruction {
        parse_instruction(text, &InstructionConfig::default())
    }

    fn object(id: &str, label: &str, confidence: f64, x: f64, y: f64) -> ObjectOfInterest {
        ObjectOfInterest::new(id, label, confidence, PixelPoint::new(x, y))
    }

    #[test]
    fn test_uncertain_weapon_at_drone_position() {
        let config = ScoringConfig::default();
        let obj = object("w", "weapon?", 0.8, 500.0, 500.0);
        let scored = score_object(&obj, &scene(), &parse(""), &config);

        assert_eq!(scored.score_breakdown.label_base, 10.0);
        assert!((scored.score_breakdown.confidence_factor - 0.8_f64.powf(1.2)).abs() < 1e-12);
        assert_eq!(scored.score_breakdown.proximity_factor, 1.0);
        assert!((scored.risk_score - 7.651).abs() < 0.01);
        assert!(scored.matched_keywords.is_empty());
    }

    #[test]
    fn test_urgent_instruction_boosts_weapon() {
        let config = ScoringConfig::default();
        let obj = object("w", "weapon?", 0.8, 500.0, 500.0);
        let plain = score_object(&obj, &scene(), &parse(""), &config);
        let boosted = score_object(
            &obj,
            &scene(),
            &parse("Immediately report any weapons"),
            &config,
        );

        assert_eq!(boosted.score_breakdown.instruction_boost, 6.0);
        assert!((boosted.risk_score - plain.risk_score - 6.0).abs() < 1e-9);
        assert_eq!(boosted.matched_keywords, vec!["weapon"]);
    }

    #[test]
    fn test_unknown_label_uses_default_weight() {
        let config = ScoringConfig::default();
        assert_eq!(label_weight("kite", &config), 2.0);
        assert_eq!(label_weight("  PERSON ", &config), 1.0);
    }

    #[test]
    fn test_far_objects_keep_half_weight() {
        let config = ScoringConfig::default();
        let obj = object("f", "fight", 1.0, 500.0 + 1.0e6, 500.0);
        let scored = score_object(&obj, &scene(), &parse(""), &config);
        assert!((scored.risk_score - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_hints_add_bonus_with_defaults() {
        let config = ScoringConfig::default();
        let base = object("p", "person", 0.9, 100.0, 100.0);
        let hinted = base
            .clone()
            .with_hint("aggressive", 0.5)
            .with_hint("glowing", 2.0);
        let s_base = score_object(&base, &scene(), &parse(""), &config);
        let s_hint = score_object(&hinted, &scene(), &parse(""), &config);

        // 3.5 * 0.5 + default 1.0 * 2.0 (intensity is not clamped)
        assert!((s_hint.score_breakdown.hint_bonus - 3.75).abs() < 1e-9);
        assert!((s_hint.risk_score - s_base.risk_score - 3.75).abs() < 1e-9);
    }

    #[test]
    fn test_hint_name_triggers_instruction_boost() {
        let config = ScoringConfig::default();
        let obj = object("p", "person", 0.9, 100.0, 100.0).with_hint("loitering", 0.1);
        let scored = score_object(&obj, &scene(), &parse("watch for loitering"), &config);
        assert_eq!(scored.score_breakdown.instruction_boost, 3.0);
        assert_eq!(scored.matched_keywords, vec!["suspicious_person"]);
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let config = ScoringConfig::default();
        let objects = vec![
            object("a", "person", 0.9, 500.0, 500.0),
            object("b", "weapon", 0.9, 500.0, 500.0),
            object("c", "person", 0.9, 500.0, 500.0),
            object("d", "fight", 0.9, 500.0, 500.0),
        ];
        let scored = score_all_objects(&objects, &scene(), &parse(""), &config);
        let ids: Vec<&str> = scored.iter().map(|s| s.object.object_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let mut config = ScoringConfig::default();
        let objects: Vec<_> = (0..40)
            .map(|i| object(&format!("o{i}"), "bag", 0.5 + (i % 5) as f64 * 0.1, i as f64 * 20.0, 0.0))
            .collect();
        let sequential = score_all_objects(&objects, &scene(), &parse(""), &config);
        config.parallel_threshold = 1;
        let parallel = score_all_objects(&objects, &scene(), &parse(""), &config);
        assert_eq!(sequential, parallel);
    }
}
