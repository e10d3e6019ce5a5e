//! Persistent key-value state
//!
//! The manager keeps its records under a handful of keys (`managed_plugins`,
//! `settings`, `active_plugins`). [`KeyValueStore::update`] is the only
//! read-modify-write primitive; implementations serialize it per store so
//! concurrent writers are ordered rather than lost.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use wpgit_fs::io::{LockGuard, read_text, write_atomic};
use wpgit_fs::{NormalizedPath, validate_slug};

use crate::{Error, Result};

pub const MANAGED_PLUGINS_KEY: &str = "managed_plugins";
pub const SETTINGS_KEY: &str = "settings";
pub const ACTIVE_PLUGINS_KEY: &str = "active_plugins";

/// Mutation applied by [`KeyValueStore::update`]; returning `None` deletes the key.
pub type Mutation<'a> = dyn FnMut(Option<Value>) -> Result<Option<Value>> + 'a;

/// Storage backend for JSON values.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Atomically replace the value under `key` with the result of `f`.
    ///
    /// When `f` fails nothing is written and its error is returned.
    fn update(&self, key: &str, f: &mut Mutation<'_>) -> Result<()>;

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut value = Some(value);
        self.update(key, &mut |_| Ok(value.take()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.update(key, &mut |_| Ok(None))
    }
}

/// One JSON file per key under a data directory.
///
/// `update` holds an in-process mutex and an exclusive `fs2` lock on the
/// key's sidecar lock file for the whole read-modify-write; writes go
/// through a temp file and rename.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<NormalizedPath> {
        validate_slug(key)?;
        Ok(NormalizedPath::new(self.dir.join(format!("{key}.json"))))
    }

    fn read(path: &NormalizedPath, key: &str) -> Result<Option<Value>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = read_text(path)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text).map(Some).map_err(|e| Error::Store {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Self::read(&self.path_for(key)?, key)
    }

    fn update(&self, key: &str, f: &mut Mutation<'_>) -> Result<()> {
        let path = self.path_for(key)?;
        let _local = self.write_lock.lock().map_err(|_| Error::Store {
            key: key.to_string(),
            message: "store mutex poisoned".into(),
        })?;
        let _lock = LockGuard::acquire(&path.to_native())?;

        let current = Self::read(&path, key)?;
        match f(current)? {
            Some(value) => {
                let bytes = serde_json::to_vec_pretty(&value).map_err(|e| Error::Store {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
                write_atomic(&path, &bytes)?;
            }
            None if path.exists() => {
                let native = path.to_native();
                std::fs::remove_file(&native).map_err(|e| Error::io(&native, e))?;
            }
            None => {}
        }
        tracing::debug!(key, "State updated");
        Ok(())
    }
}

/// Volatile store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self.values.lock().map_err(|_| poisoned(key))?;
        Ok(values.get(key).cloned())
    }

    fn update(&self, key: &str, f: &mut Mutation<'_>) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| poisoned(key))?;
        match f(values.get(key).cloned())? {
            Some(value) => {
                values.insert(key.to_string(), value);
            }
            None => {
                values.remove(key);
            }
        }
        Ok(())
    }
}

fn poisoned(key: &str) -> Error {
    Error::Store {
        key: key.to_string(),
        message: "store mutex poisoned".into(),
    }
}
