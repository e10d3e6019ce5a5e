//! Shaped API responses

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Repository metadata from `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub full_name: String,
    pub private: bool,
    pub default_branch: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

/// A branch or tag reduced to its name and target commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefInfo {
    pub name: String,
    pub commit_sha: String,
}

/// A commit reduced to the fields the manager displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCommit {
    pub sha: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    /// ISO-8601 author date as returned by the API
    pub date: String,
    pub unix_timestamp: i64,
}

/// Result of `GET /repos/{o}/{r}/compare/{base}...{head}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    /// `ahead`, `behind`, `diverged` or `identical`
    pub status: String,
    pub ahead_by: u32,
    pub behind_by: u32,
    pub total_commits: u32,
}

/// The account a token belongs to, from `GET /user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenOwner {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

// Raw wire shapes, reduced by the From impls below.

#[derive(Debug, Deserialize)]
pub(crate) struct RawRef {
    name: String,
    commit: RawSha,
}

#[derive(Debug, Deserialize)]
struct RawSha {
    sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCommit {
    sha: String,
    commit: RawCommitDetail,
}

#[derive(Debug, Deserialize)]
struct RawCommitDetail {
    #[serde(default)]
    message: String,
    author: Option<RawAuthor>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    date: String,
}

impl From<RawRef> for RefInfo {
    fn from(raw: RawRef) -> Self {
        Self {
            name: raw.name,
            commit_sha: raw.commit.sha,
        }
    }
}

impl From<RawCommit> for RemoteCommit {
    fn from(raw: RawCommit) -> Self {
        let (author_name, author_email, date) = raw
            .commit
            .author
            .map(|a| (a.name, a.email, a.date))
            .unwrap_or_default();
        let unix_timestamp = DateTime::parse_from_rfc3339(&date)
            .map(|d| d.timestamp())
            .unwrap_or(0);
        Self {
            sha: raw.sha,
            message: raw.commit.message,
            author_name,
            author_email,
            date,
            unix_timestamp,
        }
    }
}
