//! Global settings record and the stored GitHub token

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wpgit_github::{TokenCipher, TokenSource};

use crate::store::{KeyValueStore, SETTINGS_KEY};
use crate::{Error, Result};

pub const MIN_CLEANUP_HOURS: u32 = 1;
pub const MAX_CLEANUP_HOURS: u32 = 168;

/// How often the external scheduler runs auto-sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncInterval {
    #[default]
    Hourly,
    TwiceDaily,
    Daily,
}

impl SyncInterval {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::TwiceDaily => "twicedaily",
            Self::Daily => "daily",
        }
    }
}

impl fmt::Display for SyncInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncInterval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hourly" => Ok(Self::Hourly),
            "twicedaily" => Ok(Self::TwiceDaily),
            "daily" => Ok(Self::Daily),
            other => Err(Error::InvalidSetting {
                name: "auto_sync_interval".into(),
                reason: format!("'{other}' is not one of hourly, twicedaily, daily"),
            }),
        }
    }
}

/// Persisted settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Encrypted token; empty when unset
    pub github_token: String,
    pub auto_sync_interval: SyncInterval,
    /// Glob patterns excluded from exports, in order
    pub export_exclusions: Vec<String>,
    /// Age in hours after which exports are removed
    pub cleanup_exports_after: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_token: String::new(),
            auto_sync_interval: SyncInterval::default(),
            export_exclusions: default_exclusions(),
            cleanup_exports_after: 24,
        }
    }
}

pub fn default_exclusions() -> Vec<String> {
    [
        ".git",
        ".github",
        ".gitignore",
        ".gitattributes",
        ".editorconfig",
        "node_modules",
        ".DS_Store",
        "Thumbs.db",
        "*.log",
        "composer.lock",
        "package-lock.json",
        "phpunit.xml",
        "phpcs.xml",
        ".env",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Settings {
    /// Clamp and tidy values after loading or editing.
    pub fn normalized(mut self) -> Self {
        self.cleanup_exports_after = self
            .cleanup_exports_after
            .clamp(MIN_CLEANUP_HOURS, MAX_CLEANUP_HOURS);
        self.export_exclusions = self
            .export_exclusions
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }
}

/// Partial settings change; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub auto_sync_interval: Option<SyncInterval>,
    pub export_exclusions: Option<Vec<String>>,
    pub cleanup_exports_after: Option<u32>,
}

/// Typed access to the `settings` key.
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Result<Settings> {
        match self.store.get(SETTINGS_KEY)? {
            Some(value) => serde_json::from_value::<Settings>(value)
                .map(Settings::normalized)
                .map_err(|e| Error::Store {
                    key: SETTINGS_KEY.into(),
                    message: e.to_string(),
                }),
            None => Ok(Settings::default()),
        }
    }

    /// Apply `f` to the current settings and persist the result.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let mut f = Some(f);
        let mut saved = None;
        self.store.update(SETTINGS_KEY, &mut |current| {
            let mut settings = match current {
                Some(value) => serde_json::from_value::<Settings>(value).map_err(|e| Error::Store {
                    key: SETTINGS_KEY.into(),
                    message: e.to_string(),
                })?,
                None => Settings::default(),
            };
            if let Some(f) = f.take() {
                f(&mut settings);
            }
            let settings = settings.normalized();
            let value = serde_json::to_value(&settings).map_err(|e| Error::Store {
                key: SETTINGS_KEY.into(),
                message: e.to_string(),
            })?;
            saved = Some(settings);
            Ok(Some(value))
        })?;
        saved.ok_or_else(|| Error::Store {
            key: SETTINGS_KEY.into(),
            message: "update did not run".into(),
        })
    }
}

/// Token source that decrypts the stored token on every read.
pub struct StoredToken {
    settings: SettingsStore,
    cipher: TokenCipher,
}

impl StoredToken {
    pub fn new(settings: SettingsStore, cipher: TokenCipher) -> Self {
        Self { settings, cipher }
    }

    /// Decrypted token, `Ok(None)` when unset.
    pub fn read(&self) -> Result<Option<String>> {
        let stored = self.settings.load()?.github_token;
        let token = self.cipher.decrypt(&stored)?;
        Ok((!token.is_empty()).then_some(token))
    }
}

impl TokenSource for StoredToken {
    fn token(&self) -> Option<String> {
        match self.read() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Stored GitHub token is unusable; continuing unauthenticated");
                None
            }
        }
    }
}
