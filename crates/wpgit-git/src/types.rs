//! Values parsed from git command output

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Information about a single commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Full 40-character commit hash
    pub hash: String,

    /// Abbreviated hash as printed by git
    pub short_hash: String,

    pub author: String,

    pub email: String,

    /// Author timestamp
    pub timestamp: DateTime<Utc>,

    /// First line of the commit message
    pub message: String,
}

impl CommitInfo {
    /// Parse the NUL-separated output of
    /// `git log -1 --format=%H%x00%h%x00%an%x00%ae%x00%at%x00%s`.
    pub(crate) fn parse(output: &str) -> Option<Self> {
        let mut fields = output.trim_end_matches('\n').split('\0');
        let hash = fields.next()?.trim().to_string();
        let short_hash = fields.next()?.to_string();
        let author = fields.next()?.to_string();
        let email = fields.next()?.to_string();
        let seconds: i64 = fields.next()?.trim().parse().ok()?;
        let message = fields.next().unwrap_or("").to_string();

        Some(Self {
            hash,
            short_hash,
            author,
            email,
            timestamp: Utc.timestamp_opt(seconds, 0).single()?,
            message,
        })
    }
}

/// Result of `git status --porcelain`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingTreeStatus {
    pub clean: bool,
    /// Porcelain lines, e.g. ` M widget.php`
    pub changes: Vec<String>,
}

/// Commit counts between HEAD and its upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDiff {
    /// Commits on HEAD not on the remote branch
    pub ahead: u32,
    /// Commits on the remote branch not on HEAD
    pub behind: u32,
}
