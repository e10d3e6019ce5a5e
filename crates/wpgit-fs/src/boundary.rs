//! Root-boundary enforcement for working trees and export artifacts
//!
//! Every path handed to a subprocess or a destructive filesystem call is
//! resolved through a [`PathBoundary`] first. Resolution canonicalizes the
//! path (following symlinks) and requires the result to be a strict subpath
//! of the canonical root.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::{Error, Result, validate_slug};

/// A canonical directory that resolved paths must stay inside.
#[derive(Debug, Clone)]
pub struct PathBoundary {
    root: PathBuf,
}

impl PathBoundary {
    /// Create a boundary for an existing directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the root does not exist or cannot be
    /// canonicalized.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = dunce::canonicalize(root).map_err(|e| Error::io(root, e))?;
        Ok(Self { root: canonical })
    }

    /// Create the root directory if needed, then build the boundary.
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| Error::io(root, e))?;
        Self::new(root)
    }

    /// The canonical root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` and ensure it lies strictly inside the root.
    ///
    /// Relative paths are interpreted against the root. Paths that do not
    /// exist yet are resolved through their nearest existing ancestor, so a
    /// symlinked parent still cannot smuggle the result outside the root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let resolved = canonicalize_lenient(&joined)?;
        if resolved == self.root || !resolved.starts_with(&self.root) {
            tracing::warn!(path = %joined.display(), root = %self.root.display(), "Rejected path outside boundary");
            return Err(Error::OutsideRoot {
                path: joined,
                root: self.root.clone(),
            });
        }
        Ok(resolved)
    }

    /// Resolve the directory for a slug directly under the root.
    pub fn child(&self, slug: &str) -> Result<PathBuf> {
        validate_slug(slug)?;
        self.resolve(slug)
    }

    /// Recursively delete a directory inside the boundary.
    ///
    /// A missing directory is not an error.
    pub fn remove_dir(&self, path: impl AsRef<Path>) -> Result<()> {
        let resolved = self.resolve(path)?;
        if !resolved.exists() {
            return Ok(());
        }
        tracing::debug!(path = %resolved.display(), "Removing directory");
        fs::remove_dir_all(&resolved).map_err(|e| Error::io(&resolved, e))
    }

    /// Delete a single file inside the boundary.
    pub fn remove_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let resolved = self.resolve(path)?;
        fs::remove_file(&resolved).map_err(|e| Error::io(&resolved, e))
    }
}

/// Canonicalize a path that may not exist yet.
///
/// The longest existing prefix is canonicalized and the remaining
/// components are appended after rejecting any `..` among them.
fn canonicalize_lenient(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return dunce::canonicalize(path).map_err(|e| Error::io(path, e));
    }

    let mut existing = path.to_path_buf();
    let mut missing = Vec::new();
    while !existing.exists() {
        let Some(name) = existing.file_name().map(|n| n.to_os_string()) else {
            break;
        };
        missing.push(name);
        if !existing.pop() {
            break;
        }
    }

    let mut resolved = dunce::canonicalize(&existing).map_err(|e| Error::io(&existing, e))?;
    for name in missing.into_iter().rev() {
        let component = Path::new(&name);
        if component
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
        {
            return Err(Error::OutsideRoot {
                path: path.to_path_buf(),
                root: existing.clone(),
            });
        }
        resolved.push(component);
    }
    Ok(resolved)
}
