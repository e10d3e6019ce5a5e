//! Zip archive writer

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::walk::{EntryKind, walk_tree};
use crate::{Error, Result};

/// Archive every entry under `source` into a new zip at `dest`, rooted
/// under `prefix/`. Empty directories are kept.
///
/// Returns the size of the written archive in bytes.
pub fn write_zip(source: &Path, dest: &Path, prefix: &str) -> Result<u64> {
    let file = File::create(dest).map_err(|e| Error::io(dest, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let files = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let dirs = SimpleFileOptions::default().unix_permissions(0o755);

    zip.add_directory(format!("{prefix}/"), dirs)
        .map_err(archive_err)?;
    for entry in walk_tree(source, |_| false)? {
        let name = format!("{prefix}/{}", entry.relative);
        match entry.kind {
            EntryKind::Dir => zip.add_directory(format!("{name}/"), dirs).map_err(archive_err)?,
            EntryKind::File => {
                zip.start_file(name, files).map_err(archive_err)?;
                let mut input = File::open(&entry.path).map_err(|e| Error::io(&entry.path, e))?;
                io::copy(&mut input, &mut zip).map_err(|e| Error::io(&entry.path, e))?;
            }
        }
    }

    let mut writer = zip.finish().map_err(archive_err)?;
    io::Write::flush(&mut writer).map_err(|e| Error::io(dest, e))?;
    drop(writer);

    let size = std::fs::metadata(dest).map_err(|e| Error::io(dest, e))?.len();
    Ok(size)
}

fn archive_err(e: zip::result::ZipError) -> Error {
    Error::Archive {
        message: e.to_string(),
    }
}
