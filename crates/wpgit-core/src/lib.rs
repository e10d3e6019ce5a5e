//! Core orchestration layer for WP Git Sync
//!
//! Ties the git wrapper and the GitHub client to persisted state:
//!
//! - **Plugin state manager**: add, sync, check, switch refs and remove
//!   repository-backed plugins
//! - **Export engine**: clean, installable zip archives with exclusions and
//!   retention
//! - **State store**: JSON key-value persistence with serialized updates
//!
//! # Architecture
//!
//! ```text
//!                 wpgit-cli
//!                     |
//!                wpgit-core
//!                     |
//!      +--------------+--------------+
//!      |              |              |
//!  wpgit-fs      wpgit-git     wpgit-github
//! ```

pub mod error;
pub mod export;
pub mod host;
pub mod manager;
pub mod plugin;
pub mod repository;
pub mod settings;
pub mod store;

pub use error::{Error, ErrorKind, Result};
pub use export::{ExclusionMatcher, ExportArchive, ExportEngine};
pub use host::{LocalPluginHost, PluginHeader, PluginHost};
pub use manager::{BatchResults, ManagerOptions, PluginManager};
pub use plugin::{LocalState, ManagedPlugin, PluginStatus, PluginView, RefList, UpdateCheck};
pub use repository::PluginRepository;
pub use settings::{Settings, SettingsStore, SettingsUpdate, StoredToken, SyncInterval};
pub use store::{FileStore, KeyValueStore, MemoryStore};
