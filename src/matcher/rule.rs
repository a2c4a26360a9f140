//! Keyword and intent-pattern matching against skill rules.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::{MatchType, SkillMatch};
use crate::error::{ActivatorError, Result};
use crate::rules::{Enforcement, Priority, SkillRules};

/// One trigger kind of a skill.
///
/// A skill holds at most one of each, keyword first, and evaluation stops at
/// the first trigger that fires.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Lowercased substrings
    Keywords(Vec<String>),
    /// Case-insensitive compiled patterns
    Intent(Vec<Regex>),
}

impl Trigger {
    pub fn match_type(&self) -> MatchType {
        match self {
            Trigger::Keywords(_) => MatchType::Keyword,
            Trigger::Intent(_) => MatchType::Intent,
        }
    }

    /// `prompt` must already be lowercased.
    pub fn fires(&self, prompt: &str) -> bool {
        match self {
            Trigger::Keywords(keywords) => keywords.iter().any(|kw| prompt.contains(kw.as_str())),
            Trigger::Intent(patterns) => patterns.iter().any(|re| re.is_match(prompt)),
        }
    }
}

/// A skill rule with its triggers compiled.
#[derive(Debug, Clone)]
pub struct CompiledSkill {
    pub name: String,
    pub priority: Priority,
    pub enforcement: Enforcement,
    pub triggers: Vec<Trigger>,
}

impl CompiledSkill {
    /// Match type of the first firing trigger.
    fn evaluate(&self, prompt: &str) -> Option<MatchType> {
        self.triggers
            .iter()
            .find(|trigger| trigger.fires(prompt))
            .map(Trigger::match_type)
    }
}

/// Rule matcher over a compiled skill table, in rule file order.
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    skills: Vec<CompiledSkill>,
}

impl RuleMatcher {
    /// Compile every skill's triggers.
    ///
    /// Fails on the first invalid intent pattern, so a rule set is either
    /// usable in full or not at all.
    pub fn compile(rules: &SkillRules) -> Result<Self> {
        let mut skills = Vec::with_capacity(rules.skills.len());

        for (name, rule) in &rules.skills {
            let mut triggers = Vec::new();

            if let Some(prompt_triggers) = &rule.prompt_triggers {
                if !prompt_triggers.keywords.is_empty() {
                    triggers.push(Trigger::Keywords(
                        prompt_triggers.keywords.iter().map(|kw| kw.to_lowercase()).collect(),
                    ));
                }

                if !prompt_triggers.intent_patterns.is_empty() {
                    let patterns = prompt_triggers
                        .intent_patterns
                        .iter()
                        .map(|pattern| compile_pattern(name, pattern))
                        .collect::<Result<Vec<_>>>()?;
                    triggers.push(Trigger::Intent(patterns));
                }
            }

            skills.push(CompiledSkill {
                name: name.clone(),
                priority: rule.priority,
                enforcement: rule.enforcement,
                triggers,
            });
        }

        Ok(Self { skills })
    }

    pub fn skills(&self) -> &[CompiledSkill] {
        &self.skills
    }

    /// Skills whose triggers fire for `prompt`, in rule order.
    pub fn find_matches(&self, prompt: &str) -> Vec<SkillMatch> {
        let prompt = prompt.to_lowercase();

        self.skills
            .iter()
            .filter_map(|skill| {
                let match_type = skill.evaluate(&prompt)?;
                debug!("Skill {} matched by {}", skill.name, match_type.as_str());
                Some(SkillMatch {
                    name: skill.name.clone(),
                    match_type,
                    priority: skill.priority,
                    enforcement: skill.enforcement,
                    score: None,
                })
            })
            .collect()
    }
}

fn compile_pattern(skill: &str, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ActivatorError::InvalidPattern {
            skill: skill.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}
