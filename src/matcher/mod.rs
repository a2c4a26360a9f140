//! Prompt matchers.
//!
//! - [`rule`]: keyword / intent-pattern triggers from `skill-rules.json`
//! - [`tfidf`]: statistical relevance over candidate descriptions
//! - [`enhancement`]: literal substring rules from `prompt-enhancement-rules.json`
//! - [`complexity`]: fallback workflow recommendation when nothing matched
//!
//! Every matcher is a pure function of the prompt and an immutable rule set.

pub mod complexity;
pub mod enhancement;
pub mod rule;
pub mod tfidf;

use serde::Serialize;

use crate::rules::{Enforcement, Priority};

pub use complexity::{classify, Recommendation, Workflow};
pub use enhancement::{match_enhancements, EnhancementMatch};
pub use rule::{RuleMatcher, Trigger};
pub use tfidf::{match_candidates, Candidate, ScoredCandidate, TfIdfResult};

/// What made a skill match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Keyword,
    Intent,
    TfIdf,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Keyword => "keyword",
            MatchType::Intent => "intent",
            MatchType::TfIdf => "tfidf",
        }
    }
}

/// A skill selected for the report.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillMatch {
    pub name: String,
    pub match_type: MatchType,
    pub priority: Priority,
    pub enforcement: Enforcement,
    /// Relevance score, TF-IDF matches only
    pub score: Option<f64>,
}
