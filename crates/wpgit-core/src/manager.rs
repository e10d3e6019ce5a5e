//! Plugin state manager
//!
//! Each managed plugin moves through `up_to_date ⇄ update_available`, with
//! `syncing` while a sync runs and `error` after any failed operation. The
//! manager is the only writer of the plugin collection and mutates records
//! exclusively through [`PluginRepository::update`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use wpgit_fs::{PathBoundary, validate_slug};
use wpgit_git::{Git, GitConfig, RemoteDiff, RepoUrl, slugify, validate_ref_name};
use wpgit_github::{GitHubClient, GitHubConfig, KeyStrength, TokenCipher, TokenOwner};

use crate::export::{ExclusionMatcher, ExportEngine};
use crate::host::{PluginHeader, PluginHost};
use crate::plugin::{LocalState, ManagedPlugin, PluginStatus, PluginView, RefList, UpdateCheck};
use crate::repository::PluginRepository;
use crate::settings::{Settings, SettingsStore, SettingsUpdate, StoredToken};
use crate::store::KeyValueStore;
use crate::{Error, Result};

/// Results of a batch operation, one per slug.
pub type BatchResults<T> = BTreeMap<String, Result<T>>;

/// Everything needed to open a [`PluginManager`].
#[derive(Debug, Clone, Default)]
pub struct ManagerOptions {
    /// Directory holding one working tree per plugin
    pub plugins_dir: PathBuf,
    pub git: GitConfig,
    pub github: GitHubConfig,
    /// Secret the token encryption key is derived from
    pub site_secret: Option<String>,
}

/// Orchestrates git, the GitHub API and persisted state per plugin.
pub struct PluginManager {
    git: Git,
    github: GitHubClient,
    plugins: PluginRepository,
    settings: SettingsStore,
    token: Arc<StoredToken>,
    cipher: TokenCipher,
    host: Arc<dyn PluginHost>,
}

impl PluginManager {
    /// Open the manager, verifying that `git` is usable.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        host: Arc<dyn PluginHost>,
        options: ManagerOptions,
    ) -> Result<Self> {
        let boundary = PathBoundary::create(&options.plugins_dir)?;
        let git = Git::new(boundary, options.git)?;

        let cipher = TokenCipher::new(options.site_secret.as_deref());
        let settings = SettingsStore::new(Arc::clone(&store));
        let token = Arc::new(StoredToken::new(settings.clone(), cipher.clone()));
        let github = GitHubClient::new(options.github, token.clone())?;

        Ok(Self {
            git,
            github,
            plugins: PluginRepository::new(store),
            settings,
            token,
            cipher,
            host,
        })
    }

    pub fn plugins_root(&self) -> &Path {
        self.git.boundary().root()
    }

    pub fn github(&self) -> &GitHubClient {
        &self.github
    }

    pub fn key_strength(&self) -> KeyStrength {
        self.cipher.strength()
    }

    /// Export engine over the same plugins and settings.
    pub fn export_engine(&self, export_dir: impl Into<PathBuf>, base_url: Option<String>) -> ExportEngine {
        ExportEngine::new(
            export_dir,
            base_url,
            self.git.boundary().clone(),
            self.plugins.clone(),
            self.settings.clone(),
        )
    }

    /// Clone a GitHub repository into the plugins root and start managing it.
    ///
    /// `branch` defaults to the repository's default branch and `slug` to the
    /// slugified repository name. Nothing is persisted unless every step
    /// succeeds; a partially cloned directory is removed.
    pub fn add_plugin(&self, url: &str, branch: Option<&str>, slug: Option<&str>) -> Result<ManagedPlugin> {
        let repo_url = RepoUrl::parse(url)?;
        let info = self
            .github
            .verify_repo(repo_url.owner(), repo_url.repo())
            .map_err(|e| match e {
                wpgit_github::Error::Unauthorized { message } => Error::AuthFailed {
                    repo: repo_url.full_name(),
                    message,
                },
                other => other.into(),
            })?;

        let slug = match slug {
            Some(slug) => slug.trim().to_string(),
            None => slugify(repo_url.repo()),
        };
        validate_slug(&slug)?;
        if self.plugins.contains(&slug)? {
            return Err(Error::AlreadyManaged { slug });
        }
        let dir = self.git.boundary().child(&slug)?;
        if dir.exists() {
            return Err(Error::DirectoryExists { path: dir });
        }

        let token = self.token.read()?;
        if info.private && token.is_none() {
            return Err(Error::TokenRequired {
                repo: repo_url.full_name(),
            });
        }

        let branch = branch
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(String::from)
            .unwrap_or_else(|| info.default_branch.clone());
        validate_ref_name(&branch)?;

        tracing::info!(repo = %repo_url.full_name(), %slug, %branch, "Adding plugin");
        self.git
            .with_token(token.as_deref())
            .clone_repo(&repo_url.https_url(), &slug, Some(&branch))
            .map_err(|e| reword_clone_error(e, &repo_url, info.private, token.is_some()))?;

        let now = Utc::now();
        let result = self.describe_tree(Path::new(&slug)).and_then(|tree| {
            let mut plugin = ManagedPlugin {
                slug: slug.clone(),
                repo_url: repo_url.https_url(),
                owner: repo_url.owner().to_string(),
                repo: repo_url.repo().to_string(),
                branch: branch.clone(),
                local_commit: String::new(),
                remote_commit: String::new(),
                last_sync: Some(now),
                auto_sync: false,
                is_private: info.private,
                wp_plugin_name: String::new(),
                wp_plugin_version: String::new(),
                wp_plugin_file: String::new(),
                status: PluginStatus::UpToDate,
                last_error: None,
                last_commit_message: String::new(),
                last_commit_author: String::new(),
                last_commit_date: None,
                added_at: now,
            };
            tree.apply(&mut plugin);
            self.plugins.insert(plugin.clone())?;
            Ok(plugin)
        });

        if result.is_err() {
            if let Err(cleanup) = self.git.boundary().remove_dir(Path::new(&slug)) {
                tracing::warn!(%slug, error = %cleanup, "Failed to remove clone after failed add");
            }
        }
        result
    }

    /// Fetch, hard-reset and fast-forward the working tree of `slug`.
    ///
    /// Local modifications are discarded. A tree checked out at a tag is
    /// left detached and not pulled.
    pub fn sync_plugin(&self, slug: &str) -> Result<ManagedPlugin> {
        let plugin = self.plugins.require(slug)?;
        let dir = self.require_tree(slug)?;

        self.plugins.update(slug, |p| p.status = PluginStatus::Syncing)?;
        tracing::info!(slug, branch = %plugin.branch, "Syncing plugin");

        match self.sync_tree(&dir, &plugin.branch) {
            Ok(tree) => {
                let saved = self.plugins.update(slug, |p| {
                    tree.apply(p);
                    p.status = PluginStatus::UpToDate;
                    p.last_error = None;
                    p.last_sync = Some(Utc::now());
                })?;
                tracing::info!(slug, commit = %saved.local_commit, "Plugin synced");
                Ok(saved)
            }
            Err(e) => Err(self.record_failure(slug, e)),
        }
    }

    /// Compare the working-tree HEAD with the live remote tip of the
    /// tracked ref. Never touches the working tree.
    pub fn check_updates(&self, slug: &str) -> Result<UpdateCheck> {
        let plugin = self.plugins.require(slug)?;

        let outcome = (|| -> Result<UpdateCheck> {
            let dir = self.require_tree(slug)?;
            let local_commit = self.git.get_current_commit(&dir, false)?;
            let remote_commit = self
                .github
                .get_latest_commit(&plugin.owner, &plugin.repo, &plugin.branch)?
                .sha;
            Ok(UpdateCheck {
                has_update: local_commit != remote_commit,
                local_commit,
                remote_commit,
            })
        })();

        match outcome {
            Ok(check) => {
                self.plugins.update(slug, |p| {
                    p.local_commit = check.local_commit.clone();
                    p.remote_commit = check.remote_commit.clone();
                    p.status = if check.has_update {
                        PluginStatus::UpdateAvailable
                    } else {
                        PluginStatus::UpToDate
                    };
                    p.last_error = None;
                })?;
                tracing::info!(slug, has_update = check.has_update, "Checked for updates");
                Ok(check)
            }
            Err(e) => Err(self.record_failure(slug, e)),
        }
    }

    /// Check every managed plugin; failures are reported per slug.
    pub fn check_all_updates(&self) -> Result<BatchResults<UpdateCheck>> {
        let slugs: Vec<String> = self.plugins.all()?.into_keys().collect();
        Ok(slugs
            .into_iter()
            .map(|slug| {
                let result = self.check_updates(&slug);
                (slug, result)
            })
            .collect())
    }

    /// Sync every plugin with auto-sync enabled; failures are reported per slug.
    pub fn sync_auto_enabled(&self) -> Result<BatchResults<ManagedPlugin>> {
        let slugs: Vec<String> = self
            .plugins
            .all()?
            .into_values()
            .filter(|p| p.auto_sync)
            .map(|p| p.slug)
            .collect();
        Ok(slugs
            .into_iter()
            .map(|slug| {
                let result = self.sync_plugin(&slug);
                (slug, result)
            })
            .collect())
    }

    pub fn toggle_auto_sync(&self, slug: &str, enabled: bool) -> Result<ManagedPlugin> {
        let saved = self.plugins.update(slug, |p| p.auto_sync = enabled)?;
        tracing::info!(slug, enabled, "Auto-sync toggled");
        Ok(saved)
    }

    /// Switch the tracked ref to `new_ref` (branch or tag) and sync.
    ///
    /// A failed checkout leaves the record unchanged.
    pub fn change_branch(&self, slug: &str, new_ref: &str) -> Result<ManagedPlugin> {
        validate_ref_name(new_ref)?;
        self.plugins.require(slug)?;
        let dir = self.require_tree(slug)?;

        let git = self.authed_git();
        git.fetch(&dir, true, true)?;
        git.checkout(&dir, new_ref).map_err(|e| Error::CheckoutFailed {
            reference: new_ref.to_string(),
            message: e.to_string(),
        })?;

        self.plugins.update(slug, |p| p.branch = new_ref.to_string())?;
        tracing::info!(slug, reference = new_ref, "Tracked ref changed");
        self.sync_plugin(slug)
    }

    /// Remote branches and tags, plus the tracked ref.
    pub fn get_refs(&self, slug: &str) -> Result<RefList> {
        let plugin = self.plugins.require(slug)?;
        let names = |refs: Vec<wpgit_github::RefInfo>| -> Vec<String> {
            refs.into_iter().map(|r| r.name).collect()
        };
        Ok(RefList {
            branches: names(self.github.get_branches(&plugin.owner, &plugin.repo)?),
            tags: names(self.github.get_tags(&plugin.owner, &plugin.repo)?),
            current: plugin.branch,
        })
    }

    /// Stop managing `slug`, deactivating it first and optionally deleting
    /// its working tree.
    pub fn remove_plugin(&self, slug: &str, delete_files: bool) -> Result<ManagedPlugin> {
        self.plugins.require(slug)?;
        if self.host.is_active(slug)? {
            self.host.deactivate(slug)?;
        }
        if delete_files {
            self.git.boundary().remove_dir(Path::new(slug))?;
        }
        let removed = self.plugins.remove(slug)?;
        tracing::info!(slug, delete_files, "Plugin removed");
        Ok(removed)
    }

    pub fn get_plugin(&self, slug: &str) -> Result<PluginView> {
        let plugin = self.plugins.require(slug)?;
        self.view(plugin)
    }

    pub fn get_all_plugins(&self) -> Result<Vec<PluginView>> {
        self.plugins
            .all()?
            .into_values()
            .map(|plugin| self.view(plugin))
            .collect()
    }

    /// Working-tree diagnostics for `slug`.
    pub fn get_local_state(&self, slug: &str) -> Result<LocalState> {
        self.plugins.require(slug)?;
        let dir = self.require_tree(slug)?;
        let branch = self.git.get_current_branch(&dir)?;
        let diff = match &branch {
            Some(branch) => self.git.get_remote_diff(&dir, Some(branch))?,
            None => RemoteDiff::default(),
        };
        Ok(LocalState {
            commit: self.git.get_current_commit(&dir, false)?,
            status: self.git.get_status(&dir)?,
            remote_url: self.git.get_remote_url(&dir)?,
            branch,
            diff,
        })
    }

    pub fn get_settings(&self) -> Result<Settings> {
        self.settings.load()
    }

    /// Apply a partial settings change. Exclusion patterns must compile.
    pub fn update_settings(&self, update: SettingsUpdate) -> Result<Settings> {
        if let Some(patterns) = &update.export_exclusions {
            ExclusionMatcher::new(patterns)?;
        }
        self.settings.update(|s| {
            if let Some(interval) = update.auto_sync_interval {
                s.auto_sync_interval = interval;
            }
            if let Some(patterns) = update.export_exclusions {
                s.export_exclusions = patterns;
            }
            if let Some(hours) = update.cleanup_exports_after {
                s.cleanup_exports_after = hours;
            }
        })
    }

    /// Encrypt and store `token`; an empty token clears it.
    pub fn set_token(&self, token: &str) -> Result<()> {
        let encrypted = self.cipher.encrypt(token.trim())?;
        self.settings.update(|s| s.github_token = encrypted)?;
        self.github.clear_cache();
        tracing::info!(cleared = token.trim().is_empty(), "GitHub token updated");
        Ok(())
    }

    /// Check `candidate`, or the stored token, against `GET /user`.
    pub fn verify_token(&self, candidate: Option<&str>) -> Result<TokenOwner> {
        let token = match candidate {
            Some(candidate) => candidate.trim().to_string(),
            None => self.token.read()?.unwrap_or_default(),
        };
        Ok(self.github.verify_token(&token)?)
    }

    fn view(&self, mut plugin: ManagedPlugin) -> Result<PluginView> {
        let directory_exists = self
            .git
            .boundary()
            .child(&plugin.slug)
            .map(|dir| dir.is_dir())
            .unwrap_or(false);
        if !directory_exists {
            plugin.status = PluginStatus::Error;
            plugin.last_error = Some("Plugin directory not found".into());
        }
        let is_active = self.host.is_active(&plugin.slug)?;
        Ok(PluginView {
            plugin,
            directory_exists,
            is_active,
        })
    }

    fn require_tree(&self, slug: &str) -> Result<PathBuf> {
        let dir = self.git.boundary().child(slug)?;
        if !dir.is_dir() {
            return Err(Error::WorkingTreeMissing {
                slug: slug.to_string(),
                path: dir,
            });
        }
        Ok(dir)
    }

    fn sync_tree(&self, dir: &Path, reference: &str) -> Result<TreeState> {
        let git = self.authed_git();
        git.fetch(dir, true, true)?;
        if let Err(e) = git.checkout(dir, reference) {
            tracing::warn!(reference, error = %e, "Checkout before sync failed; continuing");
        }
        git.reset(dir, "HEAD", true)?;
        if git.get_current_branch(dir)?.is_some() {
            git.pull(dir)?;
        } else {
            tracing::debug!(reference, "HEAD is detached; skipping pull");
        }
        self.describe_tree(dir)
    }

    fn describe_tree(&self, dir: &Path) -> Result<TreeState> {
        let commit = self.git.get_commit_info(dir, "HEAD")?;
        let resolved = self.git.boundary().resolve(dir)?;
        Ok(TreeState {
            header: self.host.read_header(&resolved),
            commit,
        })
    }

    /// Persist the error state for `slug` and hand the error back.
    fn record_failure(&self, slug: &str, error: Error) -> Error {
        tracing::warn!(slug, error = %error, "Plugin operation failed");
        if let Err(e) = self.plugins.update(slug, |p| p.fail(error.to_string())) {
            tracing::warn!(slug, error = %e, "Failed to persist error state");
        }
        error
    }

    fn authed_git(&self) -> Git {
        let token = self.token.read().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Stored GitHub token is unusable; continuing unauthenticated");
            None
        });
        self.git.with_token(token.as_deref())
    }
}

/// HEAD commit and plugin header read after a clone or sync.
struct TreeState {
    commit: wpgit_git::CommitInfo,
    header: Option<PluginHeader>,
}

impl TreeState {
    fn apply(&self, plugin: &mut ManagedPlugin) {
        plugin.local_commit = self.commit.hash.clone();
        plugin.remote_commit = self.commit.hash.clone();
        plugin.last_commit_message = self.commit.message.clone();
        plugin.last_commit_author = self.commit.author.clone();
        plugin.last_commit_date = Some(self.commit.timestamp);
        let (name, version, file) = match &self.header {
            Some(h) => (h.name.clone(), h.version.clone(), h.entry_file.clone()),
            None => Default::default(),
        };
        plugin.wp_plugin_name = name;
        plugin.wp_plugin_version = version;
        plugin.wp_plugin_file = file;
    }
}

const AUTH_FAILURE_MARKERS: &[&str] = &[
    "authentication failed",
    "could not read username",
    "terminal prompts disabled",
    "invalid username or password",
    "repository not found",
    "returned error: 403",
    "returned error: 401",
];

/// Turn a credential failure during clone into an auth error that reflects
/// the repository's visibility and whether a token was sent.
fn reword_clone_error(error: wpgit_git::Error, repo: &RepoUrl, is_private: bool, has_token: bool) -> Error {
    let is_auth = error.output().is_some_and(|output| {
        let output = output.to_lowercase();
        AUTH_FAILURE_MARKERS.iter().any(|m| output.contains(m))
    });
    if !is_auth {
        return error.into();
    }
    let repo = repo.full_name();
    match (is_private, has_token) {
        (_, false) => Error::TokenRequired { repo },
        (true, true) => Error::AuthFailed {
            repo,
            message: "the token was rejected or cannot access this private repository".into(),
        },
        (false, true) => Error::AuthFailed {
            repo,
            message: "the token was rejected".into(),
        },
    }
}
