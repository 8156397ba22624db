use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Not in a git repository: {0}")]
    NotARepository(String),

    #[error("Invalid git reference '{reference}': {reason}")]
    InvalidRef { reference: String, reason: String },

    #[error("No common base branch found (tried: {})", .0.join(", "))]
    NoBaseBranch(Vec<String>),

    #[error("Git command failed: git {command}\n{stderr}")]
    Git { command: String, stderr: String },

    #[error("Failed to execute git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to write report to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;
