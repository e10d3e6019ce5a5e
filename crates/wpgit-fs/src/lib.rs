//! Filesystem layer for WP Git Sync
//!
//! Provides normalized paths, slug validation, root-boundary enforcement
//! and atomic, locked I/O used by the upper crates.

pub mod boundary;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use boundary::PathBoundary;
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::{NormalizedPath, validate_slug};
