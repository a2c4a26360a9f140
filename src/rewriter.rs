//! Prompt rewriting backends.
//!
//! The pipeline only sees [`PromptRewriter`]. The default backend shells out to
//! the Claude CLI in headless mode; tests and embedders can supply their own.
//! Every call is bounded by the request timeout and is attempted once.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::config::{RewriterSettings, SKIP_ENHANCE_ENV};

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("Failed to start rewriter runtime: {0}")]
    Runtime(io::Error),

    #[error("Failed to spawn rewriter '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    #[error("Failed to collect rewriter output: {0}")]
    Output(io::Error),

    #[error("Rewriter timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rewriter exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}

#[derive(Debug, Clone, Copy)]
pub struct RewriteRequest<'a> {
    /// Prompt as the user typed it
    pub prompt: &'a str,
    /// Working directory for the rewriter; empty means inherit
    pub cwd: &'a str,
    pub timeout: Duration,
}

pub trait PromptRewriter {
    /// Rewritten prompt text, or an error once the call failed or timed out.
    fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<String, RewriteError>;
}

/// Instruction handed to the rewriter, embedding the original prompt.
pub fn enhance_instruction(prompt: &str) -> String {
    format!(
        "prompt-enhancer 스킬을 사용하여 다음 프롬프트를 개선해주세요.\n\
         개선된 프롬프트만 간결하게 출력하세요. 설명 없이 개선된 프롬프트 텍스트만 출력.\n\
         \n\
         원본 프롬프트: {prompt}"
    )
}

/// Runs an external command with the instruction as its last argument and
/// reads the rewritten prompt from stdout.
///
/// The child gets `SKIP_PROMPT_ENHANCE=1` so a hook fired inside it stays
/// silent, and is killed if it outlives the timeout.
#[derive(Debug, Clone)]
pub struct CommandRewriter {
    program: String,
    args: Vec<String>,
}

impl CommandRewriter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_settings(settings: &RewriterSettings) -> Self {
        Self::new(settings.program.clone(), settings.args.clone())
    }

    async fn run(&self, request: &RewriteRequest<'_>) -> Result<String, RewriteError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(enhance_instruction(request.prompt))
            .env(SKIP_ENHANCE_ENV, "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !request.cwd.is_empty() {
            cmd.current_dir(request.cwd);
        }

        let child = cmd.spawn().map_err(|source| RewriteError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let output = tokio::time::timeout(request.timeout, child.wait_with_output())
            .await
            .map_err(|_| RewriteError::Timeout(request.timeout))?
            .map_err(RewriteError::Output)?;

        if !output.status.success() {
            return Err(RewriteError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl PromptRewriter for CommandRewriter {
    fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<String, RewriteError> {
        debug!("Running rewriter {} (timeout {:?})", self.program, request.timeout);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(RewriteError::Runtime)?;

        runtime.block_on(self.run(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str, timeout: Duration) -> RewriteRequest<'_> {
        RewriteRequest {
            prompt,
            cwd: "",
            timeout,
        }
    }

    fn sh(script: &str) -> CommandRewriter {
        // The instruction lands in $0 after the script
        CommandRewriter::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_instruction_embeds_prompt() {
        let instruction = enhance_instruction("add login page");
        assert!(instruction.starts_with("prompt-enhancer"));
        assert!(instruction.ends_with("원본 프롬프트: add login page"));
    }

    #[cfg(unix)]
    #[test]
    fn test_child_sees_skip_flag() {
        let rewriter = sh("echo \"  $SKIP_PROMPT_ENHANCE  \"");
        let out = rewriter
            .rewrite(&request("add login page", Duration::from_secs(10)))
            .unwrap();
        assert_eq!(out, "1");
    }

    #[cfg(unix)]
    #[test]
    fn test_child_receives_instruction() {
        let rewriter = sh("printf '%s' \"$0\"");
        let out = rewriter
            .rewrite(&request("add login page", Duration::from_secs(10)))
            .unwrap();
        assert!(out.ends_with("add login page"));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout() {
        let rewriter = sh("sleep 5");
        let err = rewriter
            .rewrite(&request("slow", Duration::from_millis(200)))
            .unwrap_err();
        assert!(matches!(err, RewriteError::Timeout(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_failure() {
        let rewriter = sh("echo nope >&2; exit 3");
        let err = rewriter
            .rewrite(&request("broken", Duration::from_secs(10)))
            .unwrap_err();
        match err {
            RewriteError::Failed { status, stderr } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let rewriter = CommandRewriter::new("definitely-not-a-real-rewriter-binary", vec![]);
        let err = rewriter
            .rewrite(&request("x", Duration::from_secs(1)))
            .unwrap_err();
        assert!(matches!(err, RewriteError::Spawn { .. }));
    }
}
