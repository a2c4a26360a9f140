//! Daily JSONL log of activation decisions.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::config::LOG_PROMPT_CHARS;
use crate::error::{ActivatorError, Result};
use crate::input::HookInput;
use crate::matcher::MatchType;
use crate::pipeline::Outcome;

#[derive(Debug, Serialize)]
struct LoggedMatch<'a> {
    name: &'a str,
    match_type: MatchType,
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    timestamp: String,
    session_id: &'a str,
    project_name: &'a str,
    cwd: &'a str,
    original_prompt: String,
    matched_skills: Vec<LoggedMatch<'a>>,
    matched_enhancements: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation: Option<&'a str>,
    enhanced: bool,
}

/// Appends one line per reported run to `skill-activation-YYYY-MM-DD.jsonl`.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    dir: PathBuf,
}

impl ActivityLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("skill-activation-{}.jsonl", date.format("%Y-%m-%d")))
    }

    /// Append an entry for `outcome`. Runs without a report are not logged.
    pub fn append(&self, input: &HookInput, outcome: &Outcome) -> Result<Option<PathBuf>> {
        if outcome.report.is_none() {
            return Ok(None);
        }

        let now = Local::now();
        let entry = LogEntry {
            timestamp: now.to_rfc3339(),
            session_id: &input.session_id,
            project_name: input.project_name(),
            cwd: &input.cwd,
            original_prompt: input.prompt.chars().take(LOG_PROMPT_CHARS).collect(),
            matched_skills: outcome
                .skills
                .iter()
                .chain(&outcome.related)
                .map(|m| LoggedMatch {
                    name: &m.name,
                    match_type: m.match_type,
                })
                .collect(),
            matched_enhancements: outcome
                .enhancements
                .iter()
                .map(|e| e.rule_name.as_str())
                .collect(),
            recommendation: outcome.recommendation.as_ref().map(|r| r.skill),
            enhanced: outcome.enhanced_prompt.is_some(),
        };

        let path = self.file_for(now.date_naive());
        serde_json::to_string(&entry)
            .map_err(std::io::Error::other)
            .and_then(|line| write_line(&path, &line))
            .map_err(|source| ActivatorError::LogWrite {
                path: path.clone(),
                source,
            })?;

        Ok(Some(path))
    }
}

fn write_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{classify, SkillMatch};
    use crate::report::Report;
    use crate::rules::{Enforcement, Priority};

    fn input() -> HookInput {
        HookInput::from_json(
            r#"{"prompt":"refactor the payment controller","cwd":"/work/shop","session_id":"abc"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_file_name_uses_date() {
        let log = ActivityLog::new("/logs");
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(
            log.file_for(date),
            PathBuf::from("/logs/skill-activation-2026-03-07.jsonl")
        );
    }

    #[test]
    fn test_append_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("nested"));

        let skill = SkillMatch {
            name: "backend-dev-guidelines".to_string(),
            match_type: MatchType::Keyword,
            priority: Priority::High,
            enforcement: Enforcement::Suggest,
            score: None,
        };
        let outcome = Outcome {
            skills: vec![skill],
            report: Some(Report::Fallback(classify("placeholder report"))),
            ..Outcome::default()
        };

        let path = log.append(&input(), &outcome).unwrap().unwrap();
        log.append(&input(), &outcome).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let entry: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(entry["session_id"], "abc");
        assert_eq!(entry["project_name"], "shop");
        assert_eq!(entry["matched_skills"][0]["name"], "backend-dev-guidelines");
        assert_eq!(entry["matched_skills"][0]["match_type"], "keyword");
        assert_eq!(entry["enhanced"], false);
    }

    #[test]
    fn test_silent_run_not_logged() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path());
        assert!(log.append(&input(), &Outcome::default()).unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
