//! Error types for wpgit-fs

use std::path::PathBuf;

/// Result type for wpgit-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in wpgit-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} config for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    /// The path resolves to the root itself or somewhere outside it.
    #[error("Path {path} escapes the allowed root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Invalid slug '{slug}': {reason}")]
    InvalidSlug { slug: String, reason: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
