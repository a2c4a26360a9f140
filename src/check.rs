//! Rule file validation for the `check` subcommand.

use crate::error::Result;
use crate::matcher::{RuleMatcher, Trigger};
use crate::rules::LoadedRules;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RulesSummary {
    pub skills: usize,
    /// Skills with at least one trigger
    pub triggered: usize,
    pub keywords: usize,
    pub intent_patterns: usize,
    pub enhancement_rules: usize,
    /// `(rule, skill)` pairs whose `relatedSkill` is not a known skill
    pub dangling_references: Vec<(String, String)>,
}

/// Compile every rule and collect counts plus dangling skill references.
pub fn summarize(rules: &LoadedRules) -> Result<RulesSummary> {
    let matcher = RuleMatcher::compile(&rules.skills)?;

    let mut summary = RulesSummary {
        skills: matcher.skills().len(),
        ..RulesSummary::default()
    };

    for skill in matcher.skills() {
        if !skill.triggers.is_empty() {
            summary.triggered += 1;
        }
        for trigger in &skill.triggers {
            match trigger {
                Trigger::Keywords(keywords) => summary.keywords += keywords.len(),
                Trigger::Intent(patterns) => summary.intent_patterns += patterns.len(),
            }
        }
    }

    if let Some(enhancement) = &rules.enhancement {
        summary.enhancement_rules = enhancement.enhancement_rules.len();
        summary.dangling_references = enhancement
            .enhancement_rules
            .iter()
            .filter(|(_, rule)| !rules.skills.skills.contains_key(&rule.related_skill))
            .map(|(name, rule)| (name.clone(), rule.related_skill.clone()))
            .collect();
    }

    Ok(summary)
}
