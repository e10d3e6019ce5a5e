//! Clean, installable zip exports of managed plugins
//!
//! An export copies the working tree into a scratch directory inside the
//! export directory, leaving out VCS metadata and excluded paths, then
//! archives the copy under a top-level `<slug>/` folder. The scratch copy
//! is removed whether or not archiving succeeds.

mod archive;
mod exclusions;
mod walk;

pub use archive::write_zip;
pub use exclusions::ExclusionMatcher;
pub use walk::{EntryKind, TreeEntry, walk_tree};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use wpgit_fs::PathBoundary;
use wpgit_fs::io::write_text;
use wpgit_fs::NormalizedPath;

use crate::repository::PluginRepository;
use crate::settings::SettingsStore;
use crate::{Error, Result};

const INDEX_SILENCE: &str = "<?php\n// Silence is golden.\n";
const HTACCESS: &str = "Options -Indexes\n";

/// A zip archive in the export directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArchive {
    pub filename: String,
    pub file_path: PathBuf,
    /// Set when a public base URL for the export directory is configured
    pub download_url: Option<String>,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Creates, lists and prunes plugin exports.
#[derive(Clone)]
pub struct ExportEngine {
    export_dir: PathBuf,
    base_url: Option<String>,
    plugins_root: PathBoundary,
    plugins: PluginRepository,
    settings: SettingsStore,
}

impl ExportEngine {
    pub fn new(
        export_dir: impl Into<PathBuf>,
        base_url: Option<String>,
        plugins_root: PathBoundary,
        plugins: PluginRepository,
        settings: SettingsStore,
    ) -> Self {
        Self {
            export_dir: export_dir.into(),
            base_url: base_url.filter(|u| !u.trim().is_empty()),
            plugins_root,
            plugins,
            settings,
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Archive the working tree of `slug`.
    pub fn export_plugin(&self, slug: &str) -> Result<ExportArchive> {
        let plugin = self.plugins.require(slug)?;
        let source = self.plugins_root.child(slug)?;
        if !source.is_dir() {
            return Err(Error::WorkingTreeMissing {
                slug: slug.to_string(),
                path: source,
            });
        }

        let settings = self.settings.load()?;
        let matcher = ExclusionMatcher::new(&settings.export_exclusions)?;
        let export_root = self.prepare_export_dir()?;

        let label = if plugin.wp_plugin_version.is_empty() {
            plugin.local_commit.chars().take(7).collect::<String>()
        } else {
            plugin.wp_plugin_version.clone()
        };
        let filename = self.unique_filename(slug, &label, Utc::now());
        let dest = export_root.root().join(&filename);

        let scratch = tempfile::Builder::new()
            .prefix(".export-")
            .tempdir_in(export_root.root())
            .map_err(|e| Error::io(export_root.root(), e))?;
        let staged = scratch.path().join(slug);

        let result = copy_filtered(&source, &staged, &matcher)
            .and_then(|()| write_zip(&staged, &dest, slug));
        if let Err(e) = scratch.close() {
            tracing::warn!(error = %e, "Failed to remove export scratch directory");
        }

        let size_bytes = match result {
            Ok(size) => size,
            Err(e) => {
                remove_partial(&dest);
                return Err(e);
            }
        };
        tracing::info!(slug, %filename, size_bytes, "Export created");

        Ok(ExportArchive {
            download_url: self.download_url(&filename),
            file_path: dest,
            filename,
            size_bytes,
            created_at: Utc::now(),
        })
    }

    /// Archives in the export directory, newest first.
    pub fn list_exports(&self) -> Result<Vec<ExportArchive>> {
        if !self.export_dir.is_dir() {
            return Ok(Vec::new());
        }
        let read = fs::read_dir(&self.export_dir).map_err(|e| Error::io(&self.export_dir, e))?;
        let mut archives = Vec::new();
        for entry in read {
            let entry = entry.map_err(|e| Error::io(&self.export_dir, e))?;
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !is_archive_name(&filename) {
                continue;
            }
            let metadata = entry.metadata().map_err(|e| Error::io(entry.path(), e))?;
            if !metadata.is_file() {
                continue;
            }
            let created_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            archives.push(ExportArchive {
                download_url: self.download_url(&filename),
                file_path: entry.path(),
                filename,
                size_bytes: metadata.len(),
                created_at,
            });
        }
        archives.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.filename.cmp(&a.filename)));
        Ok(archives)
    }

    /// Delete one archive by its file name.
    pub fn delete_export(&self, filename: &str) -> Result<()> {
        if !is_archive_name(filename) {
            return Err(Error::InvalidExportName {
                filename: filename.to_string(),
            });
        }
        let path = self.export_dir.join(filename);
        if !path.is_file() {
            return Err(Error::ExportNotFound {
                filename: filename.to_string(),
            });
        }
        PathBoundary::new(&self.export_dir)?.remove_file(filename)?;
        tracing::info!(%filename, "Export deleted");
        Ok(())
    }

    /// Remove archives older than the configured retention; returns how many.
    pub fn cleanup_old_exports(&self) -> Result<usize> {
        let hours = self.settings.load()?.cleanup_exports_after;
        self.cleanup_older_than(Utc::now() - Duration::hours(i64::from(hours)))
    }

    fn cleanup_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut removed = 0;
        for archive in self.list_exports()? {
            if archive.created_at >= cutoff {
                continue;
            }
            match self.delete_export(&archive.filename) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(filename = %archive.filename, error = %e, "Failed to remove old export"),
            }
        }
        if removed > 0 {
            tracing::info!(removed, "Old exports cleaned up");
        }
        Ok(removed)
    }

    /// Create the export directory with listing disabled.
    fn prepare_export_dir(&self) -> Result<PathBoundary> {
        let boundary = PathBoundary::create(&self.export_dir)?;
        for (name, content) in [("index.php", INDEX_SILENCE), (".htaccess", HTACCESS)] {
            let path = boundary.root().join(name);
            if !path.exists() {
                write_text(&NormalizedPath::new(&path), content)?;
            }
        }
        Ok(boundary)
    }

    fn unique_filename(&self, slug: &str, label: &str, now: DateTime<Utc>) -> String {
        let label: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '-' })
            .collect();
        let label = if label.is_empty() { "unknown".to_string() } else { label };
        let stem = format!("{slug}-{label}-{}", now.format("%Y%m%d-%H%M%S"));

        let mut filename = format!("{stem}.zip");
        let mut n = 2;
        while self.export_dir.join(&filename).exists() {
            filename = format!("{stem}-{n}.zip");
            n += 1;
        }
        filename
    }

    fn download_url(&self, filename: &str) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}/{filename}", base.trim_end_matches('/')))
    }
}

/// A bare `*.zip` file name with no path components.
fn is_archive_name(filename: &str) -> bool {
    filename.ends_with(".zip")
        && filename.len() > ".zip".len()
        && !filename.starts_with('.')
        && !filename.contains(['/', '\\'])
        && !filename.contains("..")
}

fn copy_filtered(source: &Path, dest: &Path, matcher: &ExclusionMatcher) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;
    for entry in walk_tree(source, |rel| matcher.is_excluded(rel))? {
        let target = dest.join(&entry.relative);
        match entry.kind {
            EntryKind::Dir => fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?,
            EntryKind::File => {
                fs::copy(&entry.path, &target).map_err(|e| Error::io(&target, e))?;
            }
        }
    }
    Ok(())
}

/// Delete a half-written archive after a failed export. A missing file is
/// fine; anything else is logged and left behind.
fn remove_partial(dest: &Path) {
    match fs::remove_file(dest) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %dest.display(), error = %e, "Failed to remove partial export");
        }
    }
}
