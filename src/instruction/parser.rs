//! Parse free-form operator instructions into weighted watchlist rules
//!
//! Matching is plain case-insensitive substring search against a fixed
//! synonym catalogue. Label matching later uses bidirectional prefix/suffix
//! and substring containment, which is deliberately blunt: short category
//! words can match inside unrelated longer labels.

use serde::{Deserialize, Serialize};

use crate::core::config::InstructionConfig;

/// Separator placed between instruction texts when they are merged
pub const MERGE_SEPARATOR: &str = " | ";

/// An operator-stated category of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistRule {
    /// Category name, e.g. "weapon" or "unattended_bag"
    pub category: String,
    /// Synonyms found in the instruction text, longest first
    pub matched_phrases: Vec<String>,
    /// Urgency-adjusted weight
    pub weight: f64,
}

/// Structured form of one or more operator instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedInstruction {
    pub raw_text: String,
    /// Unique by category, in catalogue (or merge) order
    pub rules: Vec<WatchlistRule>,
    /// Always >= 1.0
    pub global_urgency: f64,
}

impl Default for ParsedInstruction {
    fn default() -> Self {
        Self {
            raw_text: String::new(),
            rules: Vec::new(),
            global_urgency: 1.0,
        }
    }
}

impl ParsedInstruction {
    /// Category names in rule order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.category.as_str())
    }

    pub fn rule(&self, category: &str) -> Option<&WatchlistRule> {
        self.rules.iter().find(|r| r.category == category)
    }
}

/// Convert operator instruction text into watchlist rules
///
/// 1. Urgency phrases are checked longest-first; the highest multiplier
///    found becomes the global urgency (never below 1.0).
/// 2. Every catalogue category with at least one synonym present in the text
///    becomes a rule weighted by that urgency.
pub fn parse_instruction(text: &str, config: &InstructionConfig) -> ParsedInstruction {
    let lower = text.to_lowercase();

    let mut modifiers: Vec<_> = config.urgency_modifiers.iter().collect();
    modifiers.sort_by_key(|m| std::cmp::Reverse(m.phrase.len()));

    let global_urgency = modifiers
        .iter()
        .filter(|m| lower.contains(&m.phrase.to_lowercase()))
        .map(|m| m.multiplier)
        .fold(1.0_f64, f64::max);

    let rules = config
        .watchlist
        .iter()
        .filter_map(|category| {
            let mut matched: Vec<String> = category
                .synonyms
                .iter()
                .filter(|syn| lower.contains(&syn.to_lowercase()))
                .cloned()
                .collect();
            if matched.is_empty() {
                return None;
            }
            matched.sort_by_key(|syn| std::cmp::Reverse(syn.len()));
            Some(WatchlistRule {
                category: category.name.clone(),
                matched_phrases: matched,
                weight: global_urgency,
            })
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        urgency = global_urgency,
        categories = ?rules.iter().map(|r| r.category.as_str()).collect::<Vec<_>>(),
        "Parsed instruction"
    );

    ParsedInstruction {
        raw_text: text.to_string(),
        rules,
        global_urgency,
    }
}

/// Layer `update` on top of `base`
///
/// - Raw texts are joined so the full history stays visible.
/// - Global urgency is the max of both.
/// - Rules are unioned by category; a category keeps the heavier rule, and
///   on equal weight the earlier one. First-seen order is preserved.
pub fn merge_instructions(base: &ParsedInstruction, update: &ParsedInstruction) -> ParsedInstruction {
    let mut rules = base.rules.clone();
    for rule in &update.rules {
        match rules.iter_mut().find(|r| r.category == rule.category) {
            Some(existing) if rule.weight > existing.weight => *existing = rule.clone(),
            Some(_) => {}
            None => rules.push(rule.clone()),
        }
    }

    ParsedInstruction {
        raw_text: format!("{}{}{}", base.raw_text, MERGE_SEPARATOR, update.raw_text),
        rules,
        global_urgency: base.global_urgency.max(update.global_urgency),
    }
}

/// Check whether a label is covered by any watchlist rule
///
/// The label is lower-cased with "?" markers removed. A rule matches when its
/// category is a prefix or suffix of the label (or the label of the
/// category), or when any of its matched phrases contains the label or is
/// contained in it. Returns the matched categories in rule order.
pub fn instruction_matches_label(parsed: &ParsedInstruction, label: &str) -> (bool, Vec<String>) {
    let label = label.replace('?', "").to_lowercase();
    let mut matched: Vec<String> = Vec::new();

    for rule in &parsed.rules {
        let category = rule.category.to_lowercase();
        let affix_match = category.starts_with(&label)
            || category.ends_with(&label)
            || label.starts_with(&category)
            || label.ends_with(&category);
        let phrase_match = rule.matched_phrases.iter().any(|phrase| {
            let phrase = phrase.to_lowercase();
            label.contains(&phrase) || phrase.contains(&label)
        });

        if (affix_match || phrase_match) && !matched.contains(&rule.category) {
            matched.push(rule.category.clone());
        }
    }

    (!matched.is_empty(), matched)
}
