//! GitHub REST client for WP Git Sync
//!
//! Wraps the handful of endpoints needed to verify repositories and poll
//! for updates. Cacheable reads are kept for a fixed TTL; calls that drive
//! the has-update decision always go to the network. Quota exhaustion is
//! reported as [`Error::RateLimited`] with the reset time.

pub mod cache;
pub mod client;
pub mod crypto;
pub mod error;
pub mod types;

pub use cache::ResponseCache;
pub use client::{GitHubClient, GitHubConfig, StaticToken, TokenSource};
pub use crypto::{KeyStrength, TokenCipher};
pub use error::{Error, Result};
pub use types::{Comparison, RefInfo, RemoteCommit, RepoInfo, TokenOwner};
