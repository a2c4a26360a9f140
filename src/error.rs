use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActivatorError {
    #[error("Failed to read stdin: {0}")]
    StdinRead(#[from] io::Error),

    #[error("Failed to parse input JSON: {0}")]
    InputParse(#[from] serde_json::Error),

    #[error("Failed to read rules from {path}: {source}")]
    RulesRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse rules at {path}: {source}")]
    RulesParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid intent pattern {pattern:?} in skill '{skill}': {source}")]
    InvalidPattern {
        skill: String,
        pattern: String,
        source: regex::Error,
    },

    #[error("Failed to resolve current directory: {0}")]
    CurrentDir(io::Error),

    #[error("Missing required fields: {0}")]
    MissingFields(&'static str),

    #[error("Failed to write activity log {path}: {source}")]
    LogWrite { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, ActivatorError>;
