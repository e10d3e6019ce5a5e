//! The WordPress side of a managed plugin: header metadata and activation

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{ACTIVE_PLUGINS_KEY, KeyValueStore};
use crate::{Error, Result};

/// WordPress only scans the start of a file for its header.
const HEADER_SCAN_BYTES: u64 = 8 * 1024;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^[ \t/*#@]*Plugin Name:(.*)$").unwrap());
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^[ \t/*#@]*Version:(.*)$").unwrap());

/// Metadata from a plugin's main file header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginHeader {
    pub name: String,
    pub version: String,
    /// `<slug>/<file>.php`, as WordPress identifies the plugin
    pub entry_file: String,
}

/// The host application the plugins are installed into.
pub trait PluginHost: Send + Sync {
    /// Header of the plugin whose working tree is `dir`, if one is found.
    fn read_header(&self, dir: &Path) -> Option<PluginHeader>;

    fn is_active(&self, slug: &str) -> Result<bool>;

    fn deactivate(&self, slug: &str) -> Result<()>;
}

/// Reads headers from disk and tracks activation in the `active_plugins` key.
#[derive(Clone)]
pub struct LocalPluginHost {
    store: Arc<dyn KeyValueStore>,
}

impl LocalPluginHost {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Mark `entry_file` (`<slug>/<file>.php`) active.
    pub fn activate(&self, entry_file: &str) -> Result<()> {
        let entry = entry_file.to_string();
        self.modify(|active| {
            if !active.contains(&entry) {
                active.push(entry.clone());
            }
        })
    }

    fn active(&self) -> Result<Vec<String>> {
        match self.store.get(ACTIVE_PLUGINS_KEY)? {
            Some(value) => serde_json::from_value(value).map_err(|e| Error::Store {
                key: ACTIVE_PLUGINS_KEY.into(),
                message: e.to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }

    fn modify(&self, mut f: impl FnMut(&mut Vec<String>)) -> Result<()> {
        self.store.update(ACTIVE_PLUGINS_KEY, &mut |current| {
            let mut active: Vec<String> = match current {
                Some(value) => serde_json::from_value(value).map_err(|e| Error::Store {
                    key: ACTIVE_PLUGINS_KEY.into(),
                    message: e.to_string(),
                })?,
                None => Vec::new(),
            };
            f(&mut active);
            Ok(Some(Value::from(active)))
        })
    }
}

impl PluginHost for LocalPluginHost {
    fn read_header(&self, dir: &Path) -> Option<PluginHeader> {
        let slug = dir.file_name()?.to_string_lossy().into_owned();
        let mut candidates: Vec<_> = fs::read_dir(dir)
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "php"))
            .collect();
        candidates.sort();

        candidates.into_iter().find_map(|path| {
            let head = read_head(&path)?;
            let name = capture(&NAME_PATTERN, &head)?;
            let file = path.file_name()?.to_string_lossy().into_owned();
            Some(PluginHeader {
                name,
                version: capture(&VERSION_PATTERN, &head).unwrap_or_default(),
                entry_file: format!("{slug}/{file}"),
            })
        })
    }

    fn is_active(&self, slug: &str) -> Result<bool> {
        let prefix = format!("{slug}/");
        Ok(self.active()?.iter().any(|entry| entry.starts_with(&prefix)))
    }

    fn deactivate(&self, slug: &str) -> Result<()> {
        let prefix = format!("{slug}/");
        self.modify(|active| active.retain(|entry| !entry.starts_with(&prefix)))?;
        tracing::info!(slug, "Plugin deactivated");
        Ok(())
    }
}

fn read_head(path: &Path) -> Option<String> {
    let mut buffer = Vec::new();
    File::open(path)
        .ok()?
        .take(HEADER_SCAN_BYTES)
        .read_to_end(&mut buffer)
        .ok()?;
    Some(String::from_utf8_lossy(&buffer).replace('\r', "\n"))
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    let value = pattern.captures(text)?.get(1)?.as_str();
    // Trailing comment closers are not part of the value
    let value = value.trim().trim_end_matches("*/").trim();
    (!value.is_empty()).then(|| value.to_string())
}
