//! Error types for wpgit-github

use chrono::{DateTime, Utc};

/// Result type for wpgit-github operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to GitHub or handling the token
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Remaining quota is zero; retry after `reset_at`.
    #[error("GitHub API rate limit exceeded{}", reset_at.map(|t| format!(", resets at {}", t.to_rfc3339())).unwrap_or_default())]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("Not found on GitHub: {resource}")]
    NotFound { resource: String },

    #[error("GitHub rejected the credentials: {message}")]
    Unauthorized { message: String },

    /// Any other non-success response; `message` is the API's message
    /// field or `HTTP <code>`.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// DNS, connect, timeout or an undecodable response body.
    #[error("GitHub request failed: {message}")]
    Transport { message: String },

    #[error("Token encryption failed: {message}")]
    Encrypt { message: String },

    #[error("Token decryption failed: {message}")]
    Decrypt { message: String },
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport {
            message: e.to_string(),
        }
    }
}
