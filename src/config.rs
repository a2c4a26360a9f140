//! Defaults and runtime settings.

use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Directory holding rule files, relative to a project or home directory
pub const SKILLS_DIR: [&str; 2] = [".claude", "skills"];

/// Skill rule file name
pub const SKILL_RULES_FILE: &str = "skill-rules.json";

/// Enhancement rule file name
pub const ENHANCEMENT_RULES_FILE: &str = "prompt-enhancement-rules.json";

/// Prompts must be longer than this (in chars) before the rewriter is called
pub const MIN_ENHANCE_PROMPT_CHARS: usize = 10;

/// Prompts must be longer than this (in chars) to get a fallback recommendation
pub const FALLBACK_MIN_PROMPT_CHARS: usize = 20;

/// Maximum number of context enhancement suggestions shown
pub const MAX_CONTEXT_SUGGESTIONS: usize = 5;

/// Upper bound on a single rewriter call
pub const REWRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default rewriter backend: Claude CLI in headless mode
pub const DEFAULT_REWRITER_PROGRAM: &str = "claude";
pub const DEFAULT_REWRITER_ARGS: [&str; 1] = ["--print"];

/// Environment flag set on the rewriter child so the nested hook stays silent
pub const SKIP_ENHANCE_ENV: &str = "SKIP_PROMPT_ENHANCE";

/// Number of prompt chars kept in activity log entries
pub const LOG_PROMPT_CHARS: usize = 200;

// ============================================================================
// Settings
// ============================================================================

/// Which rewriter to run and for how long.
#[derive(Debug, Clone)]
pub struct RewriterSettings {
    pub program: String,
    /// Arguments placed before the instruction text
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Default for RewriterSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_REWRITER_PROGRAM.to_string(),
            args: DEFAULT_REWRITER_ARGS.iter().map(|a| a.to_string()).collect(),
            timeout: REWRITE_TIMEOUT,
        }
    }
}

/// Settings for one hook run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Call the rewriter when something matched
    pub enhance: bool,
    pub rewriter: RewriterSettings,
    /// Merge TF-IDF related skills into the report
    pub tfidf: bool,
    /// Directory for JSONL activity logs; `None` disables logging
    pub log_dir: Option<PathBuf>,
    /// Explicit skill rules file, bypassing discovery
    pub rules_path: Option<PathBuf>,
    /// Explicit enhancement rules file, bypassing discovery
    pub enhancement_rules_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enhance: true,
            rewriter: RewriterSettings::default(),
            tfidf: false,
            log_dir: None,
            rules_path: None,
            enhancement_rules_path: None,
        }
    }
}
