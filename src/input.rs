//! Hook payloads read from stdin.

use serde::Deserialize;

use crate::error::Result;

/// Payload from the Claude Code `UserPromptSubmit` hook.
///
/// Only `prompt` takes part in matching. `cwd` drives rule discovery and the
/// rewriter's working directory; the rest is carried for the activity log.
#[derive(Debug, Clone, Deserialize)]
pub struct HookInput {
    /// The user's prompt text
    pub prompt: String,

    /// Current working directory
    #[serde(default)]
    pub cwd: String,

    #[serde(default, alias = "sessionId")]
    pub session_id: String,

    #[serde(default, alias = "transcriptPath")]
    pub transcript_path: String,

    /// Permission mode (ask, auto, etc.)
    #[serde(default, alias = "permissionMode")]
    pub permission_mode: String,
}

impl HookInput {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Last path component of `cwd`, used to label log entries.
    pub fn project_name(&self) -> &str {
        self.cwd
            .rsplit(|c: char| c == '/' || c == '\\')
            .find(|part| !part.is_empty())
            .unwrap_or("unknown")
    }
}
