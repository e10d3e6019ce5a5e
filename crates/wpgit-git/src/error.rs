//! Error types for wpgit-git

use std::path::PathBuf;

/// Result type for wpgit-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in wpgit-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The git binary could not be executed at all.
    #[error("Git is not available ({program}): {message}")]
    ToolUnavailable { program: String, message: String },

    /// Path resolution or boundary violation from wpgit-fs.
    #[error(transparent)]
    Fs(#[from] wpgit_fs::Error),

    #[error("Invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid ref name '{name}': {reason}")]
    InvalidRef { name: String, reason: String },

    #[error("Directory already exists: {path}")]
    DirectoryExists { path: PathBuf },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Not a git repository: {path}")]
    NotARepository { path: PathBuf },

    /// Non-zero exit; `output` carries combined stdout and stderr.
    #[error("`git {command}` failed{}: {output}", code.map(|c| format!(" (exit {c})")).unwrap_or_default())]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Unexpected output from `git {command}`: {output}")]
    UnexpectedOutput { command: String, output: String },
}

impl Error {
    /// Combined command output for failures that carry one.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { output, .. } | Self::UnexpectedOutput { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }
}
