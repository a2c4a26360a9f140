//! Literal substring matching against enhancement rules.

use crate::rules::{EnhancementRules, Priority};

#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementMatch {
    pub rule_name: String,
    pub suggestions: Vec<String>,
    pub related_skill: String,
    pub priority: Priority,
}

/// Rules with at least one pattern contained in `prompt`, in rule order.
pub fn match_enhancements(prompt: &str, rules: &EnhancementRules) -> Vec<EnhancementMatch> {
    let prompt = prompt.to_lowercase();

    rules
        .enhancement_rules
        .iter()
        .filter(|(_, rule)| {
            rule.patterns
                .iter()
                .any(|pattern| prompt.contains(&pattern.to_lowercase()))
        })
        .map(|(name, rule)| EnhancementMatch {
            rule_name: name.clone(),
            suggestions: rule.suggestions.clone(),
            related_skill: rule.related_skill.clone(),
            priority: rule.priority,
        })
        .collect()
}
