//! Git abstraction for WP Git Sync
//!
//! Runs the external `git` binary as a subprocess, one allow-listed
//! subcommand at a time, inside a root directory boundary. Only the small
//! subset of operations needed to clone, track and fast-forward a plugin
//! working tree is exposed.

pub mod client;
pub mod command;
pub mod error;
pub mod naming;
pub mod types;
pub mod url;

pub use client::{Git, GitConfig};
pub use command::Subcommand;
pub use error::{Error, Result};
pub use naming::{slugify, validate_ref_name};
pub use types::{CommitInfo, RemoteDiff, WorkingTreeStatus};
pub use url::{RepoUrl, sanitize_url};
