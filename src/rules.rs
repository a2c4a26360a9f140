//! Rule file types, discovery, and loading.
//!
//! Two documents are read per run:
//!
//! ```text
//! <project>/.claude/skills/skill-rules.json              {version, skills}
//! <project>/.claude/skills/prompt-enhancement-rules.json {version, enhancementRules}
//! ```
//!
//! Each is looked up in the project directory first and the user's home
//! directory second. Object key order in the files is preserved and is the
//! order skills are evaluated and displayed in.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ENHANCEMENT_RULES_FILE, SKILLS_DIR, SKILL_RULES_FILE};
use crate::error::{ActivatorError, Result};

// ============================================================================
// Enumerations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Order in which priority groups are rendered
    pub const DISPLAY_ORDER: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Guardrail,
    Domain,
}

/// Declared strictness of a skill. Carried through to match results for
/// downstream callers; the matcher does not act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    Block,
    Suggest,
    Warn,
}

// ============================================================================
// Skill Rules
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTriggers {
    /// Substrings matched case-insensitively
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Regex sources compiled case-insensitively
    #[serde(default)]
    pub intent_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRule {
    #[serde(rename = "type")]
    pub skill_type: SkillType,

    pub enforcement: Enforcement,

    pub priority: Priority,

    /// Free text used only for TF-IDF ranking
    #[serde(default)]
    pub description: String,

    /// Skills without triggers never match
    #[serde(default)]
    pub prompt_triggers: Option<PromptTriggers>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillRules {
    pub version: String,

    /// Map of skill name to rule, in file order
    pub skills: IndexMap<String, SkillRule>,
}

// ============================================================================
// Enhancement Rules
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementRule {
    /// Literal substrings, lowercased at match time
    pub patterns: Vec<String>,

    pub suggestions: Vec<String>,

    /// Name of a skill this rule relates to (reference only)
    pub related_skill: String,

    pub priority: Priority,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementRules {
    pub version: String,

    pub enhancement_rules: IndexMap<String, EnhancementRule>,
}

// ============================================================================
// Discovery and Loading
// ============================================================================

/// Resolves rule files, project directory before home directory.
#[derive(Debug, Clone)]
pub struct RulesLocator {
    project_dir: PathBuf,
    home_dir: Option<PathBuf>,
}

impl RulesLocator {
    pub fn new(project_dir: impl Into<PathBuf>, home_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            home_dir,
        }
    }

    /// Locator rooted at `cwd` and the current user's home directory.
    pub fn from_cwd(cwd: &str) -> Self {
        Self::new(cwd, dirs::home_dir())
    }

    /// Candidate paths for `file_name`, highest precedence first.
    pub fn candidates(&self, file_name: &str) -> Vec<PathBuf> {
        std::iter::once(&self.project_dir)
            .chain(self.home_dir.as_ref())
            .map(|root| skills_dir(root).join(file_name))
            .collect()
    }

    /// First existing candidate for `file_name`.
    pub fn locate(&self, file_name: &str) -> Option<PathBuf> {
        let found = self.candidates(file_name).into_iter().find(|p| p.is_file());
        debug!("Located {}: {:?}", file_name, found);
        found
    }
}

fn skills_dir(root: &Path) -> PathBuf {
    SKILLS_DIR.iter().fold(root.to_path_buf(), |dir, part| dir.join(part))
}

/// Read and parse a JSON rule document.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|source| ActivatorError::RulesRead {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ActivatorError::RulesParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Rule documents for one run.
#[derive(Debug, Clone)]
pub struct LoadedRules {
    pub skills_path: PathBuf,
    pub skills: SkillRules,
    pub enhancement_path: Option<PathBuf>,
    pub enhancement: Option<EnhancementRules>,
}

/// Load both rule documents.
///
/// Explicit paths win over discovery. Returns `Ok(None)` when no skill rules
/// file exists anywhere; a missing enhancement file is simply absent.
pub fn load_rules(
    locator: &RulesLocator,
    skills_override: Option<&Path>,
    enhancement_override: Option<&Path>,
) -> Result<Option<LoadedRules>> {
    let skills_path = match skills_override {
        Some(path) => path.to_path_buf(),
        None => match locator.locate(SKILL_RULES_FILE) {
            Some(path) => path,
            None => return Ok(None),
        },
    };
    let skills: SkillRules = load_json(&skills_path)?;

    let enhancement_path = match enhancement_override {
        Some(path) => Some(path.to_path_buf()),
        None => locator.locate(ENHANCEMENT_RULES_FILE),
    };
    let enhancement = enhancement_path
        .as_deref()
        .map(load_json::<EnhancementRules>)
        .transpose()?;

    Ok(Some(LoadedRules {
        skills_path,
        skills,
        enhancement_path,
        enhancement,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"{
        "version": "1.0",
        "skills": {
            "zeta-guard": {
                "type": "guardrail",
                "enforcement": "block",
                "priority": "critical",
                "promptTriggers": { "keywords": ["drop table"] }
            },
            "alpha-docs": {
                "type": "domain",
                "enforcement": "suggest",
                "priority": "low",
                "description": "Writing documentation"
            }
        }
    }"#;

    #[test]
    fn test_skill_rules_keep_file_order() {
        let rules: SkillRules = serde_json::from_str(RULES).unwrap();
        let names: Vec<&str> = rules.skills.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta-guard", "alpha-docs"]);

        let guard = &rules.skills["zeta-guard"];
        assert_eq!(guard.skill_type, SkillType::Guardrail);
        assert_eq!(guard.enforcement, Enforcement::Block);
        assert_eq!(guard.priority, Priority::Critical);
        assert!(guard.prompt_triggers.as_ref().unwrap().intent_patterns.is_empty());

        assert!(rules.skills["alpha-docs"].prompt_triggers.is_none());
    }

    #[test]
    fn test_unknown_priority_rejected() {
        let bad = RULES.replace("\"critical\"", "\"urgent\"");
        assert!(serde_json::from_str::<SkillRules>(&bad).is_err());
    }

    #[test]
    fn test_enhancement_rules_parse() {
        let rules: EnhancementRules = serde_json::from_str(
            r#"{"version":"1","enhancementRules":{"api":{"patterns":["API"],"suggestions":["Name the endpoint"],"relatedSkill":"backend","priority":"high"}}}"#,
        )
        .unwrap();
        let api = &rules.enhancement_rules["api"];
        assert_eq!(api.related_skill, "backend");
        assert_eq!(api.priority, Priority::High);
    }

    #[test]
    fn test_candidates_project_first() {
        let locator = RulesLocator::new("/work/app", Some(PathBuf::from("/home/me")));
        let candidates = locator.candidates(SKILL_RULES_FILE);
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/work/app/.claude/skills/skill-rules.json"),
                PathBuf::from("/home/me/.claude/skills/skill-rules.json"),
            ]
        );
    }

    #[test]
    fn test_candidates_without_home() {
        let locator = RulesLocator::new("/work/app", None);
        assert_eq!(locator.candidates(SKILL_RULES_FILE).len(), 1);
    }
}
