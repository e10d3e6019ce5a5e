//! Error types for wpgit-core

use std::path::PathBuf;

/// Result type for wpgit-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Caller-facing classification of any [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed URL, slug, ref name or setting
    InvalidInput,
    /// Unknown slug, missing directory or missing archive
    NotFound,
    /// Slug or directory already exists
    Conflict,
    /// A private repository needs a token and none is configured
    AuthRequired,
    /// The token was rejected
    AuthFailed,
    RateLimited,
    /// API unreachable or returned a malformed or failed response
    TransportError,
    ToolUnavailable,
    /// A git command exited non-zero
    CommandFailed,
    /// A path escaped the plugins or export root
    PathViolation,
    /// State store I/O or serialization
    Storage,
    /// Token cipher or archive writer
    Internal,
}

/// Errors that can occur in wpgit-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Plugin '{slug}' is not managed")]
    PluginNotFound { slug: String },

    #[error("Plugin '{slug}' is already managed")]
    AlreadyManaged { slug: String },

    #[error("Target directory already exists: {path}")]
    DirectoryExists { path: PathBuf },

    #[error("Working tree for '{slug}' not found at {path}")]
    WorkingTreeMissing { slug: String, path: PathBuf },

    #[error("Repository {repo} is private; configure a GitHub token first")]
    TokenRequired { repo: String },

    #[error("Authentication failed for {repo}: {message}")]
    AuthFailed { repo: String, message: String },

    #[error("Could not check out '{reference}': {message}")]
    CheckoutFailed { reference: String, message: String },

    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: String, reason: String },

    #[error("Export not found: {filename}")]
    ExportNotFound { filename: String },

    #[error("Invalid export file name '{filename}'")]
    InvalidExportName { filename: String },

    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error("State store error for '{key}': {message}")]
    Store { key: String, message: String },

    #[error(transparent)]
    Fs(#[from] wpgit_fs::Error),

    #[error(transparent)]
    Git(#[from] wpgit_git::Error),

    #[error(transparent)]
    GitHub(#[from] wpgit_github::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Fs(wpgit_fs::Error::io(path, source))
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PluginNotFound { .. }
            | Self::WorkingTreeMissing { .. }
            | Self::ExportNotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyManaged { .. } | Self::DirectoryExists { .. } => ErrorKind::Conflict,
            Self::TokenRequired { .. } => ErrorKind::AuthRequired,
            Self::AuthFailed { .. } => ErrorKind::AuthFailed,
            Self::CheckoutFailed { .. } => ErrorKind::CommandFailed,
            Self::InvalidSetting { .. } | Self::InvalidExportName { .. } => ErrorKind::InvalidInput,
            Self::Archive { .. } => ErrorKind::Internal,
            Self::Store { .. } => ErrorKind::Storage,
            Self::Fs(e) => fs_kind(e),
            Self::Git(e) => git_kind(e),
            Self::GitHub(e) => github_kind(e),
        }
    }
}

fn fs_kind(e: &wpgit_fs::Error) -> ErrorKind {
    use wpgit_fs::Error as E;
    match e {
        E::OutsideRoot { .. } => ErrorKind::PathViolation,
        E::InvalidSlug { .. } => ErrorKind::InvalidInput,
        _ => ErrorKind::Storage,
    }
}

fn git_kind(e: &wpgit_git::Error) -> ErrorKind {
    use wpgit_git::Error as E;
    match e {
        E::ToolUnavailable { .. } => ErrorKind::ToolUnavailable,
        E::Fs(inner) => fs_kind(inner),
        E::InvalidUrl { .. } | E::InvalidRef { .. } => ErrorKind::InvalidInput,
        E::DirectoryExists { .. } => ErrorKind::Conflict,
        E::DirectoryNotFound { .. } | E::NotARepository { .. } => ErrorKind::NotFound,
        E::CommandFailed { .. } | E::UnexpectedOutput { .. } => ErrorKind::CommandFailed,
    }
}

fn github_kind(e: &wpgit_github::Error) -> ErrorKind {
    use wpgit_github::Error as E;
    match e {
        E::RateLimited { .. } => ErrorKind::RateLimited,
        E::NotFound { .. } => ErrorKind::NotFound,
        E::Unauthorized { .. } => ErrorKind::AuthFailed,
        E::Api { .. } | E::Transport { .. } => ErrorKind::TransportError,
        E::Encrypt { .. } | E::Decrypt { .. } => ErrorKind::Internal,
    }
}
