//! Report rendering.
//!
//! Output is plain text for the assistant's context window, framed as:
//!
//! ```text
//! ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//! 🎯 SKILL ACTIVATION CHECK
//! ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//!
//! <sections>
//! ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//! ```

use std::fmt;

use indexmap::IndexSet;

use crate::config::MAX_CONTEXT_SUGGESTIONS;
use crate::matcher::{EnhancementMatch, Recommendation, SkillMatch};
use crate::rules::Priority;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const TITLE: &str = "🎯 SKILL ACTIVATION CHECK";

#[derive(Debug, Clone, PartialEq)]
pub struct ActivationReport {
    /// Rule matcher hits, in rule order
    pub skills: Vec<SkillMatch>,
    /// TF-IDF hits not already in `skills`, best first
    pub related: Vec<SkillMatch>,
    /// Deduplicated suggestions, already capped
    pub suggestions: Vec<String>,
    pub enhanced_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Activation(ActivationReport),
    Fallback(Recommendation),
}

fn priority_header(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "⚠️ CRITICAL SKILLS (REQUIRED):",
        Priority::High => "📚 RECOMMENDED SKILLS:",
        Priority::Medium => "💡 SUGGESTED SKILLS:",
        Priority::Low => "📌 OPTIONAL SKILLS:",
    }
}

/// Union of all suggestions in first-seen order, capped for display.
pub fn collect_suggestions(enhancements: &[EnhancementMatch]) -> Vec<String> {
    let unique: IndexSet<&str> = enhancements
        .iter()
        .flat_map(|e| e.suggestions.iter().map(String::as_str))
        .collect();

    unique
        .into_iter()
        .take(MAX_CONTEXT_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}

impl fmt::Display for ActivationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for priority in Priority::DISPLAY_ORDER {
            let group: Vec<&SkillMatch> = self
                .skills
                .iter()
                .filter(|s| s.priority == priority)
                .collect();
            if group.is_empty() {
                continue;
            }
            writeln!(f, "{}", priority_header(priority))?;
            for skill in group {
                writeln!(f, "  → {}", skill.name)?;
            }
            writeln!(f)?;
        }

        if !self.related.is_empty() {
            writeln!(f, "🔎 RELATED SKILLS (TF-IDF):")?;
            for skill in &self.related {
                writeln!(f, "  → {} ({:.2})", skill.name, skill.score.unwrap_or_default())?;
            }
            writeln!(f)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f, "📝 CONTEXT ENHANCEMENT:")?;
            for suggestion in &self.suggestions {
                writeln!(f, "  → {}", suggestion)?;
            }
            writeln!(f)?;
        }

        match self.enhanced_prompt.as_deref().filter(|p| !p.is_empty()) {
            Some(enhanced) => {
                writeln!(f, "🚀 ENHANCED PROMPT:")?;
                writeln!(f, "{}\n", enhanced)?;
                writeln!(f, "ACTION: Use the enhanced prompt above")
            }
            None => writeln!(f, "ACTION: Use Skill tool BEFORE responding"),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "{TITLE}")?;
        writeln!(f, "{RULE}\n")?;

        match self {
            Report::Activation(activation) => write!(f, "{activation}")?,
            Report::Fallback(rec) => {
                writeln!(f, "💡 DEFAULT WORKFLOW RECOMMENDATION:")?;
                writeln!(f, "  → {}", rec.skill)?;
                writeln!(f, "    ({})\n", rec.reason)?;
                writeln!(f, "TIP: /auto-workflow 커맨드로 자동 분석 실행 가능")?;
            }
        }

        writeln!(f, "{RULE}")
    }
}
