//! Shared test utilities for the wp-git-sync workspace.
//!
//! Dev-dependency only; never published.
//!
//! # Modules
//!
//! - [`git`]: upstream repositories with real history, served over `file://`
//! - [`github`]: JSON bodies shaped like GitHub REST responses

pub mod git;
pub mod github;

pub use git::{UpstreamRepo, plugin_header, run_git};
