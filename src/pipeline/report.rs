//! Fixed-section plain-text situation report

use std::fmt::Write;

use crate::pipeline::DecisionOutput;

const RULE_WIDTH: usize = 72;
const SECTION_WIDTH: usize = 40;

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, ">> {title}");
    let _ = writeln!(out, "{}", "-".repeat(SECTION_WIDTH));
}

/// Render a `DecisionOutput` for an operator terminal
pub fn format_report(output: &DecisionOutput) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "  DRONE OVERWATCH: SITUATION REPORT");
    let _ = writeln!(out, "{rule}");
    out.push('\n');

    section(&mut out, "SUMMARY");
    if output.summary.is_empty() {
        out.push_str("  No significant risks detected.\n");
    }
    for line in &output.summary {
        let _ = writeln!(out, "  {line}");
    }
    out.push('\n');

    section(&mut out, "RECOMMENDED DRONE ACTIONS");
    if output.actions.is_empty() {
        out.push_str("  No actions recommended at this time.\n\n");
    }
    for action in &output.actions {
        let target = action
            .target_object_id
            .as_deref()
            .map(|id| format!(" -> {id}"))
            .unwrap_or_default();
        let _ = writeln!(out, "  #{}  [{}]{}", action.rank, action.action_type, target);
        let _ = writeln!(out, "        {}", action.parameters);
        let _ = writeln!(out, "        Rationale: {}", action.rationale);
        out.push('\n');
    }

    section(&mut out, "ALERTS");
    if output.alerts.is_empty() {
        out.push_str("  No alerts.\n\n");
    }
    for alert in &output.alerts {
        let notify: Vec<String> = alert.notify.iter().map(ToString::to_string).collect();
        let _ = writeln!(
            out,
            "  [{}] Object: {}",
            alert.severity,
            alert.object_id.as_deref().unwrap_or("N/A")
        );
        let _ = writeln!(out, "        Notify: {}", notify.join(", "));
        let _ = writeln!(out, "        Reason: {}", alert.reason);
        let _ = writeln!(out, "        Action: {}", alert.next_steps);
        out.push('\n');
    }

    section(&mut out, "ASSUMPTIONS / UNCERTAINTIES");
    if output.assumptions.is_empty() {
        out.push_str("  None.\n");
    }
    for assumption in &output.assumptions {
        let _ = writeln!(out, "  * {}", assumption.text);
    }
    out.push('\n');
    out.push_str(&rule);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ActionKind, Alert, Assumption, NotifyTarget, RecommendedAction, Severity};

    #[test]
    fn test_empty_report_uses_placeholders() {
        let report = format_report(&DecisionOutput::default());
        for header in ["SUMMARY", "RECOMMENDED DRONE ACTIONS", "ALERTS", "ASSUMPTIONS / UNCERTAINTIES"] {
            assert!(report.contains(&format!(">> {header}")), "missing {header}");
        }
        assert!(report.contains("No significant risks detected."));
        assert!(report.contains("No actions recommended at this time."));
        assert!(report.contains("No alerts."));
        assert!(report.contains("None."));
    }

    #[test]
    fn test_items_are_rendered() {
        let output = DecisionOutput {
            summary: vec!["[HIGH] 'weapon' (id=w1, confidence=90%, score=12.00)".into()],
            actions: vec![RecommendedAction {
                rank: 1,
                action_type: ActionKind::Track,
                parameters: "TRACK object_id=w1".into(),
                target_object_id: Some("w1".into()),
                rationale: "Lock tracking".into(),
            }],
            alerts: vec![Alert {
                severity: Severity::High,
                notify: vec![NotifyTarget::Security],
                object_id: None,
                reason: "Detected 'weapon'".into(),
                next_steps: "Dispatch security".into(),
            }],
            assumptions: vec![Assumption::new("No venue scale provided")],
        };
        let report = format_report(&output);
        assert!(report.contains("#1  [TRACK] -> w1"));
        assert!(report.contains("[HIGH] Object: N/A"));
        assert!(report.contains("Notify: security"));
        assert!(report.contains("* No venue scale provided"));
        assert!(!report.contains("No alerts."));
    }
}
