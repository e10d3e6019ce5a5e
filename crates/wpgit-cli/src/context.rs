//! Application configuration and the services built from it
//!
//! Configuration is read from `--config`, or `wpgit.toml` in the current
//! directory when present. Unset directories fall back to the platform data
//! directory; `--plugins-dir` and `--data-dir` override whatever the file
//! says.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wpgit_core::{ExportEngine, FileStore, LocalPluginHost, ManagerOptions, PluginManager};
use wpgit_fs::{ConfigStore, NormalizedPath};
use wpgit_git::GitConfig;
use wpgit_github::GitHubConfig;

use crate::cli::Cli;
use crate::error::Result;

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "wpgit.toml";

/// Environment variable holding the token encryption secret.
pub const SITE_SECRET_ENV: &str = "WPGIT_SITE_SECRET";

/// On-disk application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Plugin working trees (default `<data_dir>/plugins`)
    pub plugins_dir: Option<PathBuf>,

    /// Persisted state (default `<platform data dir>/wpgit`)
    pub data_dir: Option<PathBuf>,

    /// Export archives (default `<data_dir>/exports`)
    pub export_dir: Option<PathBuf>,

    /// Public URL the export directory is served under
    pub export_base_url: Option<String>,

    /// Secret for token encryption; `WPGIT_SITE_SECRET` takes precedence
    pub site_secret: Option<String>,

    pub github_api_url: Option<String>,

    pub git_binary: Option<PathBuf>,

    /// `url.<base>.insteadOf` rules passed to every git invocation
    pub url_rewrites: BTreeMap<String, String>,
}

impl AppConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            tracing::debug!("No configuration file, using defaults");
            return Ok(Self::default());
        }
        tracing::debug!(path = %path.display(), "Loading configuration");
        Ok(ConfigStore::new().load(&NormalizedPath::new(&path))?)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(dir) = &cli.plugins_dir {
            self.plugins_dir = Some(dir.clone());
        }
        if let Some(dir) = &cli.data_dir {
            self.data_dir = Some(dir.clone());
        }
        self
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("wpgit")
        })
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.plugins_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("plugins"))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("exports"))
    }

    /// Site secret from the environment, then the file.
    pub fn site_secret(&self) -> Option<String> {
        std::env::var(SITE_SECRET_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.site_secret.clone())
    }

    fn manager_options(&self) -> ManagerOptions {
        let mut git = GitConfig {
            url_rewrites: self.url_rewrites.clone(),
            ..GitConfig::default()
        };
        if let Some(program) = &self.git_binary {
            git.program = program.clone();
        }
        let mut github = GitHubConfig::default();
        if let Some(url) = &self.github_api_url {
            github.api_url = url.trim_end_matches('/').to_string();
        }
        ManagerOptions {
            plugins_dir: self.plugins_dir(),
            git,
            github,
            site_secret: self.site_secret(),
        }
    }
}

/// Services shared by every command.
pub struct AppContext {
    pub config: AppConfig,
    pub manager: PluginManager,
    pub host: Arc<LocalPluginHost>,
    pub json: bool,
}

impl AppContext {
    /// Load configuration and open the state store and plugin manager.
    pub fn open(cli: &Cli) -> Result<Self> {
        let config = AppConfig::load(cli.config.as_deref())?.with_overrides(cli);
        let store = Arc::new(FileStore::new(config.data_dir())?);
        let host = Arc::new(LocalPluginHost::new(store.clone()));
        let manager = PluginManager::open(store, host.clone(), config.manager_options())?;
        Ok(Self {
            config,
            manager,
            host,
            json: cli.json,
        })
    }

    pub fn exports(&self) -> ExportEngine {
        self.manager
            .export_engine(self.config.export_dir(), self.config.export_base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn derived_directories_follow_data_dir() {
        let config = AppConfig {
            data_dir: Some(PathBuf::from("/srv/wpgit")),
            ..AppConfig::default()
        };
        assert_eq!(config.plugins_dir(), PathBuf::from("/srv/wpgit/plugins"));
        assert_eq!(config.export_dir(), PathBuf::from("/srv/wpgit/exports"));
    }

    #[test]
    fn explicit_directories_win() {
        let config = AppConfig {
            data_dir: Some(PathBuf::from("/srv/wpgit")),
            plugins_dir: Some(PathBuf::from("/var/www/wp-content/plugins")),
            ..AppConfig::default()
        };
        assert_eq!(
            config.plugins_dir(),
            PathBuf::from("/var/www/wp-content/plugins")
        );
    }

    #[test]
    fn load_toml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wpgit.toml");
        fs::write(
            &path,
            r#"
plugins_dir = "/var/www/plugins"
github_api_url = "http://127.0.0.1:9999"

[url_rewrites]
"file:///mirror/" = "https://github.com/"
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.plugins_dir, Some(PathBuf::from("/var/www/plugins")));
        assert_eq!(
            config.github_api_url.as_deref(),
            Some("http://127.0.0.1:9999")
        );
        assert_eq!(
            config.url_rewrites.get("file:///mirror/").map(String::as_str),
            Some("https://github.com/")
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&temp.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn cli_overrides_replace_file_values() {
        let cli = Cli::try_parse_from(["wpgit", "--plugins-dir", "/tmp/p", "--data-dir", "/tmp/d", "list"])
            .unwrap();
        let config = AppConfig {
            plugins_dir: Some(PathBuf::from("/var/www/plugins")),
            ..AppConfig::default()
        }
        .with_overrides(&cli);
        assert_eq!(config.plugins_dir(), PathBuf::from("/tmp/p"));
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/d"));
    }
}
