//! Skill Activator - skill activation hook for Claude Code
//!
//! Decides which skills a prompt needs before the assistant answers:
//! - Rule matching: keywords, then case-insensitive intent regexes, per skill
//! - TF-IDF ranking of skills by their descriptions and keywords
//! - Enhancement rules: literal patterns mapped to prompt-improvement hints
//! - Complexity fallback: a default workflow when nothing matched
//!
//! # Input (via stdin)
//! JSON with fields: prompt, cwd, session_id, transcript_path, permission_mode
//!
//! # Output (via stdout)
//! A framed text report, or nothing when there is nothing to say
//!
//! # Rule files
//! `.claude/skills/skill-rules.json` and
//! `.claude/skills/prompt-enhancement-rules.json`, project before home.

pub mod activity_log;
pub mod check;
pub mod config;
pub mod error;
pub mod input;
pub mod matcher;
pub mod pipeline;
pub mod report;
pub mod rewriter;
pub mod rules;

pub use error::{ActivatorError, Result};
pub use input::HookInput;
pub use pipeline::{Activation, EnhanceGuard, Outcome, RunOptions};
pub use report::Report;
pub use rewriter::{CommandRewriter, PromptRewriter, RewriteError, RewriteRequest};
pub use rules::{load_rules, LoadedRules, RulesLocator};
