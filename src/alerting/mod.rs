//! Severity-routed alerts with playbook next steps
//!
//! Every object at MEDIUM or above gets exactly one alert. LOW never alerts.

use std::cmp::Reverse;

use crate::core::config::EngineConfig;
use crate::core::types::{Alert, Severity};
use crate::scoring::ScoredObject;

/// Human-readable reason line for an alert
pub fn alert_reason(scored: &ScoredObject<'_>) -> String {
    let obj = scored.object;
    let mut reason = format!(
        "Detected '{}' (confidence {:.0}%, risk score {:.2})",
        obj.label,
        obj.confidence * 100.0,
        scored.risk_score
    );
    if !scored.matched_keywords.is_empty() {
        reason.push_str(&format!(
            " [matches operator watchlist: {}]",
            scored.matched_keywords.join(", ")
        ));
    }
    reason
}

/// Build alerts for `scored`, most severe first
///
/// Alerts of equal severity keep the scorer's relative order.
pub fn generate_alerts(scored: &[ScoredObject<'_>], config: &EngineConfig) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = scored
        .iter()
        .filter_map(|so| {
            let severity = config.severity.classify(so.risk_score);
            if severity == Severity::Low {
                return None;
            }
            Some(Alert {
                severity,
                notify: config.alerting.notify_targets(severity),
                object_id: Some(so.object.object_id.clone()),
                reason: alert_reason(so),
                next_steps: config
                    .alerting
                    .next_steps(&so.object.label, severity)
                    .to_string(),
            })
        })
        .collect();

    alerts.sort_by_key(|a| Reverse(a.severity));

    tracing::debug!(alerts = alerts.len(), "Generated alerts");
    alerts
}
