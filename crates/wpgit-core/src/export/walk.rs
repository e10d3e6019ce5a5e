//! Tree walk shared by the export copy and the archive writer

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
}

/// An entry below the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the root, `/`-separated
    pub relative: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Walk `root` depth-first in name order, yielding directories before
/// their contents.
///
/// `skip` is consulted for every entry; a skipped directory is not
/// descended into. Symbolic links are not followed and not yielded.
pub fn walk_tree(root: &Path, skip: impl Fn(&str) -> bool) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match relative_path(root, entry.path()) {
            Some(relative) => !skip(&relative),
            None => false,
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            Error::io(path, source)
        })?;
        let file_type = entry.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            tracing::debug!(path = %entry.path().display(), "Skipping non-regular entry");
            continue;
        };
        let Some(relative) = relative_path(root, entry.path()) else {
            continue;
        };
        entries.push(TreeEntry {
            relative,
            path: entry.into_path(),
            kind,
        });
    }
    Ok(entries)
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn yields_relative_entries_and_prunes_skipped_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/deep")).unwrap();
        fs::create_dir_all(root.join("skip/me")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("src/deep/a.php"), "a").unwrap();
        fs::write(root.join("skip/me/b.php"), "b").unwrap();
        fs::write(root.join("top.php"), "t").unwrap();

        let entries = walk_tree(root, |rel| rel == "skip").unwrap();
        let listed: Vec<_> = entries.iter().map(|e| (e.relative.as_str(), e.kind)).collect();
        assert_eq!(
            listed,
            vec![
                ("empty", EntryKind::Dir),
                ("src", EntryKind::Dir),
                ("src/deep", EntryKind::Dir),
                ("src/deep/a.php", EntryKind::File),
                ("top.php", EntryKind::File),
            ]
        );
    }
}
