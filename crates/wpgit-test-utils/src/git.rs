//! Upstream repositories with real history.
//!
//! An [`UpstreamRepo`] is a bare repository laid out as
//! `<tmp>/<owner>/<repo>.git` plus a private working clone used to author
//! commits. Pointing git's `url.<base>.insteadOf` at [`UpstreamRepo::url_rewrite`]
//! makes `https://github.com/<owner>/<repo>.git` clone from it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Run `git` with `args` in `dir`, panicking with stderr on failure.
///
/// Returns trimmed stdout.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .unwrap_or_else(|e| panic!("run_git: failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "run_git: `git {args:?}` failed in {}:\n{}",
            dir.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Minimal WordPress plugin main file with a standard header.
pub fn plugin_header(name: &str, version: &str) -> String {
    format!("<?php\n/**\n * Plugin Name: {name}\n * Version: {version}\n * Description: Test fixture\n */\n")
}

/// A bare upstream repository with one `main` commit containing
/// `<repo>.php` (plugin header) and `README.md`.
pub struct UpstreamRepo {
    temp_dir: TempDir,
    owner: String,
    repo: String,
}

impl UpstreamRepo {
    /// Create the upstream with an initial commit on `main`.
    ///
    /// # Panics
    /// Panics if any git operation fails.
    pub fn new(owner: &str, repo: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let upstream = Self {
            temp_dir,
            owner: owner.to_string(),
            repo: repo.to_string(),
        };

        let bare = upstream.bare_path();
        fs::create_dir_all(&bare).unwrap();
        run_git(&bare, &["init", "--bare", "--quiet"]);
        run_git(&bare, &["symbolic-ref", "HEAD", "refs/heads/main"]);

        let work = upstream.work_path();
        fs::create_dir_all(&work).unwrap();
        run_git(&work, &["init", "--quiet"]);
        run_git(&work, &["config", "user.email", "test@test.com"]);
        run_git(&work, &["config", "user.name", "Test User"]);
        run_git(&work, &["config", "commit.gpgsign", "false"]);
        run_git(&work, &["checkout", "-q", "-b", "main"]);
        run_git(&work, &["remote", "add", "origin", bare.to_str().unwrap()]);

        fs::write(
            work.join(format!("{repo}.php")),
            plugin_header(&title_case(repo), "1.0.0"),
        )
        .unwrap();
        fs::write(work.join("README.md"), format!("# {repo}\n")).unwrap();
        run_git(&work, &["add", "."]);
        run_git(&work, &["commit", "-q", "-m", "Initial commit"]);
        run_git(&work, &["push", "-q", "-u", "origin", "main"]);

        upstream
    }

    /// Root containing `<owner>/<repo>.git`.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn bare_path(&self) -> PathBuf {
        self.root().join(&self.owner).join(format!("{}.git", self.repo))
    }

    /// Authoring clone, kept outside the `<owner>` directory.
    pub fn work_path(&self) -> PathBuf {
        self.root().join(".work").join(&self.repo)
    }

    /// `https://github.com/<owner>/<repo>`
    pub fn github_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }

    /// `(base, instead_of)` pair for git's `url.<base>.insteadOf`.
    pub fn url_rewrite(&self) -> (String, String) {
        (
            format!("file://{}/", self.root().display()),
            "https://github.com/".to_string(),
        )
    }

    /// Commit a file on `branch` (created from the current HEAD if missing)
    /// and push it. Returns the new commit hash.
    pub fn commit_file(&self, branch: &str, path: &str, content: &str, message: &str) -> String {
        let work = self.work_path();
        self.switch_to(branch);
        let target = work.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&target, content).unwrap();
        run_git(&work, &["add", "."]);
        run_git(&work, &["commit", "-q", "-m", message]);
        run_git(&work, &["push", "-q", "origin", branch]);
        run_git(&work, &["rev-parse", "HEAD"])
    }

    /// Create and push `name` at the tip of `from`.
    pub fn create_branch(&self, name: &str, from: &str) {
        let work = self.work_path();
        run_git(&work, &["branch", name, from]);
        run_git(&work, &["push", "-q", "origin", name]);
    }

    /// Create and push a lightweight tag at the tip of `branch`.
    pub fn tag(&self, name: &str, branch: &str) -> String {
        let work = self.work_path();
        run_git(&work, &["tag", name, branch]);
        run_git(&work, &["push", "-q", "origin", name]);
        self.tag_sha(name)
    }

    /// Tip of `branch` in the bare repository, read through git2.
    pub fn head_sha(&self, branch: &str) -> String {
        let repo = git2::Repository::open_bare(self.bare_path()).unwrap();
        let reference = repo
            .find_reference(&format!("refs/heads/{branch}"))
            .unwrap_or_else(|e| panic!("head_sha: branch {branch} not found: {e}"));
        reference.peel_to_commit().unwrap().id().to_string()
    }

    /// Commit a tag points at, read through git2.
    pub fn tag_sha(&self, tag: &str) -> String {
        let repo = git2::Repository::open_bare(self.bare_path()).unwrap();
        let object = repo
            .revparse_single(&format!("refs/tags/{tag}"))
            .unwrap_or_else(|e| panic!("tag_sha: tag {tag} not found: {e}"));
        object.peel_to_commit().unwrap().id().to_string()
    }

    fn switch_to(&self, branch: &str) {
        let work = self.work_path();
        let exists = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")])
            .current_dir(&work)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if exists {
            run_git(&work, &["checkout", "-q", branch]);
        } else {
            run_git(&work, &["checkout", "-q", "-b", branch]);
        }
    }
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
