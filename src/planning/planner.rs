//! Turn scored objects into a ranked drone action sequence
//!
//! Sequencing per severity tier:
//! - CRITICAL / HIGH: MOVE -> HOVER -> TRACK
//! - MEDIUM: MOVE -> HOVER -> ZOOM
//! - LOW: ORBIT when the object is already close, otherwise nothing
//!
//! A cluster of close high-priority objects puts a single ASCEND in front
//! of everything else.

use crate::core::config::EngineConfig;
use crate::core::types::{ActionKind, Assumption, RecommendedAction, SceneContext, Severity};
use crate::planning::cluster::scan_clusters;
use crate::scoring::ScoredObject;

/// Rank counter plus the global action cap
struct ActionSequence {
    actions: Vec<RecommendedAction>,
    cap: usize,
    truncated: bool,
}

impl ActionSequence {
    fn new(cap: usize) -> Self {
        Self {
            actions: Vec::new(),
            cap,
            truncated: false,
        }
    }

    /// Append with the next rank; returns false once the cap is hit
    fn push(
        &mut self,
        action_type: ActionKind,
        parameters: String,
        target_object_id: Option<&str>,
        rationale: String,
    ) -> bool {
        if self.actions.len() >= self.cap {
            self.truncated = true;
            return false;
        }
        self.actions.push(RecommendedAction {
            rank: self.actions.len() as u32 + 1,
            action_type,
            parameters,
            target_object_id: target_object_id.map(str::to_string),
            rationale,
        });
        true
    }
}

/// Produce ranked actions plus the assumptions made along the way
///
/// `scored` must already be sorted highest risk first. The result depends
/// only on the inputs.
pub fn plan_actions(
    scored: &[ScoredObject<'_>],
    scene: &SceneContext,
    config: &EngineConfig,
) -> (Vec<RecommendedAction>, Vec<Assumption>) {
    let planner = &config.planner;
    let mut assumptions = Vec::new();
    let mut sequence = ActionSequence::new(planner.max_actions);

    let scale = match scene.venue_map_scale_ft_per_px {
        Some(scale) => scale,
        None => {
            assumptions.push(Assumption::new(format!(
                "No venue scale provided; assuming {} ft/px for movement conversions.",
                planner.default_scale_ft_per_px
            )));
            planner.default_scale_ft_per_px
        }
    };

    let top = &scored[..scored.len().min(planner.top_n_objects)];
    if scored.len() > top.len() {
        assumptions.push(Assumption::new(format!(
            "{} lower-priority object(s) beyond the top {} were not planned.",
            scored.len() - top.len(),
            top.len()
        )));
    }

    let centers: Vec<_> = top.iter().map(|s| s.object.topdown_center).collect();
    let cluster = scan_clusters(&centers, planner.cluster_radius_px);
    if cluster.is_cluster(planner.cluster_min_pairs, planner.cluster_min_objects) {
        tracing::debug!(
            pairs = cluster.close_pairs,
            objects = cluster.participants,
            "Cluster detected"
        );
        sequence.push(
            ActionKind::Ascend,
            format!("ASCEND +{}ft", planner.ascend_gain_ft),
            None,
            format!(
                "Clustering detected: {} objects within {}px; gain altitude for a wider field of view.",
                cluster.participants, planner.cluster_radius_px
            ),
        );
    }

    let drone = scene.drone_state.position_px;
    for so in top {
        if sequence.truncated {
            break;
        }

        let obj = so.object;
        let severity = config.severity.classify(so.risk_score);
        let dx_ft = (obj.topdown_center.x() - drone.x()) * scale;
        let dy_ft = (obj.topdown_center.y() - drone.y()) * scale;
        let dist_ft = dx_ft.hypot(dy_ft);
        let target = Some(obj.object_id.as_str());
        let cite = format!("'{}' ({}, score={:.2})", obj.label, severity, so.risk_score);
        let move_params = format!("MOVE dx={dx_ft:+.1}ft dy={dy_ft:+.1}ft (dist={dist_ft:.1}ft)");

        match severity {
            Severity::Critical | Severity::High => {
                let _ = sequence.push(
                    ActionKind::Move,
                    move_params,
                    target,
                    format!("{severity} risk: reposition to maintain view of {cite}."),
                ) && sequence.push(
                    ActionKind::Hover,
                    "HOVER stabilize".to_string(),
                    target,
                    format!("Stabilize position before tracking {cite}."),
                ) && sequence.push(
                    ActionKind::Track,
                    format!("TRACK object_id={}", obj.object_id),
                    target,
                    format!("Lock tracking on {cite} for continuous monitoring."),
                );
            }
            Severity::Medium => {
                let zoom = (scene.drone_state.zoom_level + planner.zoom_step).min(planner.max_zoom);
                let _ = sequence.push(
                    ActionKind::Move,
                    move_params,
                    target,
                    format!("{severity} risk: move closer to {cite} for confirmation."),
                ) && sequence.push(
                    ActionKind::Hover,
                    "HOVER stabilize".to_string(),
                    target,
                    format!("Stabilize before zooming on {cite}."),
                ) && sequence.push(
                    ActionKind::Zoom,
                    format!("ZOOM level={zoom:.1}x"),
                    target,
                    format!("Zoom in on {cite} for visual confirmation."),
                );
            }
            Severity::Low => {
                if dist_ft < planner.orbit_trigger_ft {
                    sequence.push(
                        ActionKind::Orbit,
                        format!(
                            "ORBIT radius={}ft around object_id={}",
                            planner.orbit_radius_ft, obj.object_id
                        ),
                        target,
                        format!("{severity} risk but nearby: orbit to keep {cite} in view."),
                    );
                }
            }
        }
    }

    for so in top {
        let obj = so.object;
        if obj.confidence < planner.low_confidence_threshold {
            assumptions.push(Assumption::new(format!(
                "Object '{}' ({}) has low confidence ({:.0}%); recommend human confirmation.",
                obj.object_id,
                obj.label,
                obj.confidence * 100.0
            )));
        }
    }

    if sequence.truncated {
        tracing::debug!(cap = planner.max_actions, "Action list truncated");
        assumptions.push(Assumption::new(format!(
            "Action list capped at {}; remaining recommendations were dropped.",
            planner.max_actions
        )));
    }

    (sequence.actions, assumptions)
}
