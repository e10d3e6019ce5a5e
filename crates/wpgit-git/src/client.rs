//! High-level git operations on plugin working trees

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use wpgit_fs::PathBoundary;

use crate::command::{GitOutput, Invocation, Subcommand};
use crate::types::{CommitInfo, RemoteDiff, WorkingTreeStatus};
use crate::{Error, RepoUrl, Result, validate_ref_name};

/// Runtime configuration for the git wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Path or name of the git executable
    pub program: PathBuf,

    /// `url.<base>.insteadOf` rules, keyed by replacement base and mapping to
    /// the prefix it replaces (e.g. a mirror for `https://github.com/`)
    pub url_rewrites: BTreeMap<String, String>,

    /// Abort transfers slower than 1 KiB/s for this many seconds
    pub low_speed_time_secs: u32,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
            url_rewrites: BTreeMap::new(),
            low_speed_time_secs: 30,
        }
    }
}

/// Git command wrapper bound to a plugins root.
///
/// Construction probes the binary once; a missing or broken git is reported
/// as [`Error::ToolUnavailable`] before any operation can run. Every path is
/// resolved through the root [`PathBoundary`].
#[derive(Debug, Clone)]
pub struct Git {
    config: GitConfig,
    boundary: PathBoundary,
    version: String,
    token: Option<String>,
}

impl Git {
    /// Create a wrapper after verifying the git binary responds.
    pub fn new(boundary: PathBoundary, config: GitConfig) -> Result<Self> {
        let probe = Invocation {
            program: &config.program,
            config: Vec::new(),
            subcommand: Subcommand::Version,
            args: Vec::new(),
        };
        let version = probe
            .run(boundary.root())
            .map_err(|e| Error::ToolUnavailable {
                program: config.program.display().to_string(),
                message: e.to_string(),
            })?
            .first_line();
        tracing::debug!(%version, "Detected git");

        Ok(Self {
            config,
            boundary,
            version,
            token: None,
        })
    }

    /// A copy of this wrapper that authenticates network commands with
    /// `token`. The token is sent as an HTTP header and never stored in
    /// the repository configuration.
    pub fn with_token(&self, token: Option<&str>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()).map(String::from),
            ..self.clone()
        }
    }

    /// `git version` output captured at construction.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn boundary(&self) -> &PathBoundary {
        &self.boundary
    }

    /// Clone `url` into `<root>/<dest_slug>`, optionally at `branch`.
    ///
    /// A partially created destination is removed when the clone fails.
    pub fn clone_repo(&self, url: &str, dest_slug: &str, branch: Option<&str>) -> Result<PathBuf> {
        let url = RepoUrl::parse(url)?;
        let dest = self.boundary.child(dest_slug)?;
        if dest.exists() {
            return Err(Error::DirectoryExists { path: dest });
        }

        let mut args = vec!["--quiet".to_string()];
        if let Some(branch) = branch {
            validate_ref_name(branch)?;
            args.push("--branch".into());
            args.push(branch.into());
        }
        args.push("--".into());
        args.push(url.https_url());
        args.push(dest.to_string_lossy().into_owned());

        tracing::info!(url = %url, dest = %dest.display(), "Cloning repository");
        match self.exec(self.boundary.root(), Subcommand::Clone, args) {
            Ok(_) => Ok(dest),
            Err(e) => {
                if let Err(cleanup) = self.boundary.remove_dir(&dest) {
                    tracing::warn!(error = %cleanup, "Failed to remove partial clone");
                }
                Err(e)
            }
        }
    }

    /// Fetch from origin, optionally all remotes and tags.
    pub fn fetch(&self, path: &Path, all: bool, tags: bool) -> Result<Vec<String>> {
        let mut args = vec!["--prune".to_string()];
        if all {
            args.push("--all".into());
        }
        if tags {
            args.push("--tags".into());
            args.push("--force".into());
        }
        self.run_in(path, Subcommand::Fetch, args).map(|o| o.lines())
    }

    /// Fast-forward the current branch from its upstream.
    pub fn pull(&self, path: &Path) -> Result<Vec<String>> {
        self.run_in(path, Subcommand::Pull, vec!["--ff-only".into()])
            .map(|o| o.lines())
    }

    /// Check out a branch or tag.
    ///
    /// The trailing `--` makes git resolve `reference` as a ref only; a name
    /// that matches a file but no ref fails instead of restoring the file.
    pub fn checkout(&self, path: &Path, reference: &str) -> Result<Vec<String>> {
        validate_ref_name(reference)?;
        self.run_in(
            path,
            Subcommand::Checkout,
            vec!["--quiet".into(), reference.into(), "--".into()],
        )
        .map(|o| o.lines())
    }

    /// Reset the working tree to `reference`.
    pub fn reset(&self, path: &Path, reference: &str, hard: bool) -> Result<Vec<String>> {
        if reference != "HEAD" {
            validate_ref_name(reference)?;
        }
        let mut args = vec!["--quiet".to_string()];
        if hard {
            args.push("--hard".into());
        }
        args.push(reference.into());
        args.push("--".into());
        self.run_in(path, Subcommand::Reset, args).map(|o| o.lines())
    }

    /// Current branch name, or `None` when HEAD is detached (e.g. on a tag).
    pub fn get_current_branch(&self, path: &Path) -> Result<Option<String>> {
        let branch = self
            .run_in(
                path,
                Subcommand::RevParse,
                vec!["--abbrev-ref".into(), "HEAD".into()],
            )?
            .first_line();
        Ok((branch != "HEAD" && !branch.is_empty()).then_some(branch))
    }

    /// HEAD commit hash, full or abbreviated.
    pub fn get_current_commit(&self, path: &Path, short: bool) -> Result<String> {
        let mut args = Vec::new();
        if short {
            args.push("--short".to_string());
        }
        args.push("HEAD".into());
        let output = self.run_in(path, Subcommand::RevParse, args)?;
        let hash = output.first_line();
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::UnexpectedOutput {
                command: "rev-parse HEAD".into(),
                output: output.stdout,
            });
        }
        Ok(hash)
    }

    pub fn get_commit_info(&self, path: &Path, reference: &str) -> Result<CommitInfo> {
        if reference != "HEAD" {
            validate_ref_name(reference)?;
        }
        let output = self.run_in(
            path,
            Subcommand::Log,
            vec![
                "-1".into(),
                "--format=%H%x00%h%x00%an%x00%ae%x00%at%x00%s".into(),
                reference.into(),
                "--".into(),
            ],
        )?;
        CommitInfo::parse(&output.stdout).ok_or_else(|| Error::UnexpectedOutput {
            command: format!("log -1 {reference}"),
            output: output.stdout,
        })
    }

    pub fn get_status(&self, path: &Path) -> Result<WorkingTreeStatus> {
        let changes = self
            .run_in(path, Subcommand::Status, vec!["--porcelain".into()])?
            .stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(String::from)
            .collect::<Vec<_>>();
        Ok(WorkingTreeStatus {
            clean: changes.is_empty(),
            changes,
        })
    }

    /// Local and remote-tracking branch names, `origin/` stripped, sorted.
    pub fn get_branches(&self, path: &Path) -> Result<Vec<String>> {
        let lines = self
            .run_in(
                path,
                Subcommand::Branch,
                vec!["--all".into(), "--format=%(refname:short)".into()],
            )?
            .lines();
        let mut branches: Vec<String> = lines
            .into_iter()
            .filter(|b| b != "origin" && b != "origin/HEAD" && !b.starts_with('('))
            .map(|b| b.strip_prefix("origin/").map(String::from).unwrap_or(b))
            .collect();
        branches.sort();
        branches.dedup();
        Ok(branches)
    }

    pub fn get_tags(&self, path: &Path) -> Result<Vec<String>> {
        self.run_in(path, Subcommand::Tag, vec!["--list".into()])
            .map(|o| o.lines())
    }

    /// The `origin` URL as configured, before any `insteadOf` rewriting.
    pub fn get_remote_url(&self, path: &Path) -> Result<String> {
        self.run_in(
            path,
            Subcommand::Config,
            vec!["--get".into(), "remote.origin.url".into()],
        )
        .map(|o| o.first_line())
    }

    /// Count commits ahead of and behind `origin/<branch>`.
    ///
    /// Uses the current branch when `branch` is `None`.
    pub fn get_remote_diff(&self, path: &Path, branch: Option<&str>) -> Result<RemoteDiff> {
        let branch = match branch {
            Some(b) => b.to_string(),
            None => self
                .get_current_branch(path)?
                .ok_or_else(|| Error::InvalidRef {
                    name: "HEAD".into(),
                    reason: "HEAD is detached; no upstream branch to compare".into(),
                })?,
        };
        validate_ref_name(&branch)?;

        let output = self.run_in(
            path,
            Subcommand::RevList,
            vec![
                "--left-right".into(),
                "--count".into(),
                format!("HEAD...origin/{branch}"),
            ],
        )?;
        let line = output.first_line();
        let mut counts = line.split_whitespace().map(str::parse::<u32>);
        match (counts.next(), counts.next()) {
            (Some(Ok(ahead)), Some(Ok(behind))) => Ok(RemoteDiff { ahead, behind }),
            _ => Err(Error::UnexpectedOutput {
                command: "rev-list --left-right --count".into(),
                output: output.stdout,
            }),
        }
    }

    /// Whether `path` is the top of a git working tree inside the root.
    pub fn is_repo(&self, path: &Path) -> bool {
        let Ok(resolved) = self.boundary.resolve(path) else {
            return false;
        };
        resolved.join(".git").exists()
            && self
                .exec(
                    &resolved,
                    Subcommand::RevParse,
                    vec!["--is-inside-work-tree".into()],
                )
                .map(|o| o.first_line() == "true")
                .unwrap_or(false)
    }

    fn run_in(&self, path: &Path, subcommand: Subcommand, args: Vec<String>) -> Result<GitOutput> {
        let resolved = self.boundary.resolve(path)?;
        if !resolved.is_dir() {
            return Err(Error::DirectoryNotFound { path: resolved });
        }
        self.exec(&resolved, subcommand, args)
    }

    fn exec(&self, cwd: &Path, subcommand: Subcommand, args: Vec<String>) -> Result<GitOutput> {
        Invocation {
            program: &self.config.program,
            config: self.config_pairs(subcommand),
            subcommand,
            args,
        }
        .run(cwd)
    }

    fn config_pairs(&self, subcommand: Subcommand) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("credential.helper".to_string(), String::new()),
            ("core.askPass".to_string(), String::new()),
        ];
        for (base, instead_of) in &self.config.url_rewrites {
            pairs.push((format!("url.{base}.insteadOf"), instead_of.clone()));
        }
        if subcommand.is_network() {
            pairs.push(("http.lowSpeedLimit".into(), "1000".into()));
            pairs.push((
                "http.lowSpeedTime".into(),
                self.config.low_speed_time_secs.to_string(),
            ));
            if let Some(token) = &self.token {
                let credential = BASE64.encode(format!("x-access-token:{token}"));
                pairs.push((
                    "http.extraHeader".into(),
                    format!("Authorization: Basic {credential}"),
                ));
            }
        }
        pairs
    }
}
