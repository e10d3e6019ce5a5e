//! Managed plugin records and the views derived from them

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wpgit_git::{RemoteDiff, WorkingTreeStatus};

/// Lifecycle state of a managed plugin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    #[default]
    UpToDate,
    UpdateAvailable,
    /// Transient while a sync runs
    Syncing,
    Error,
}

impl PluginStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpToDate => "up_to_date",
            Self::UpdateAvailable => "update_available",
            Self::Syncing => "syncing",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repository-backed plugin, keyed by slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedPlugin {
    pub slug: String,
    /// Sanitized `https://github.com/<owner>/<repo>.git`
    pub repo_url: String,
    pub owner: String,
    pub repo: String,
    /// Tracked branch or tag
    pub branch: String,
    #[serde(default)]
    pub local_commit: String,
    #[serde(default)]
    pub remote_commit: String,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auto_sync: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub wp_plugin_name: String,
    #[serde(default)]
    pub wp_plugin_version: String,
    #[serde(default)]
    pub wp_plugin_file: String,
    #[serde(default)]
    pub status: PluginStatus,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub last_commit_message: String,
    #[serde(default)]
    pub last_commit_author: String,
    #[serde(default)]
    pub last_commit_date: Option<DateTime<Utc>>,
    pub added_at: DateTime<Utc>,
}

impl ManagedPlugin {
    /// Record the failure of an operation.
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.status = PluginStatus::Error;
        self.last_error = Some(message.into());
    }

    /// Whether a newer upstream commit is known.
    pub fn has_update(&self) -> bool {
        !self.local_commit.is_empty()
            && !self.remote_commit.is_empty()
            && self.local_commit != self.remote_commit
    }
}

/// A stored record merged with live working-tree facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginView {
    #[serde(flatten)]
    pub plugin: ManagedPlugin,
    pub directory_exists: bool,
    pub is_active: bool,
}

/// Outcome of an update check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCheck {
    pub has_update: bool,
    pub local_commit: String,
    pub remote_commit: String,
}

/// Remote refs available to switch to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefList {
    pub branches: Vec<String>,
    pub tags: Vec<String>,
    pub current: String,
}

/// Working-tree diagnostics for one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalState {
    /// `None` when HEAD is detached
    pub branch: Option<String>,
    pub commit: String,
    pub status: WorkingTreeStatus,
    pub remote_url: String,
    #[serde(flatten)]
    pub diff: RemoteDiff,
}
