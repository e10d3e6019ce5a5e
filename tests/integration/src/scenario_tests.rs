//! Full-stack scenarios over the on-disk state store
//!
//! Each scenario wires a real [`FileStore`], the default plugin host, git
//! against a local upstream and a mock GitHub API, the same way the CLI does.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use mockito::{Mock, Server, ServerGuard};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wpgit_core::{
    ErrorKind, FileStore, LocalPluginHost, ManagerOptions, PluginManager, PluginStatus,
    SettingsUpdate,
};
use wpgit_git::GitConfig;
use wpgit_github::GitHubConfig;
use wpgit_test_utils::github::{commit_body, repo_body};
use wpgit_test_utils::{UpstreamRepo, run_git};

const WIDGET_URL: &str = "https://github.com/acme/widget";

struct Site {
    upstream: UpstreamRepo,
    server: ServerGuard,
    root: TempDir,
}

impl Site {
    fn new() -> Self {
        Self {
            upstream: UpstreamRepo::new("acme", "widget"),
            server: Server::new(),
            root: TempDir::new().unwrap(),
        }
    }

    fn open(&self, secret: &str) -> PluginManager {
        let (base, instead_of) = self.upstream.url_rewrite();
        let mut git = GitConfig::default();
        git.url_rewrites.insert(base, instead_of);

        let store = Arc::new(FileStore::new(self.root.path().join("data")).unwrap());
        let host = Arc::new(LocalPluginHost::new(store.clone()));
        PluginManager::open(
            store,
            host,
            ManagerOptions {
                plugins_dir: self.plugins_dir(),
                git,
                github: GitHubConfig {
                    api_url: self.server.url(),
                    ..GitHubConfig::default()
                },
                site_secret: Some(secret.into()),
            },
        )
        .unwrap()
    }

    fn plugins_dir(&self) -> PathBuf {
        self.root.path().join("plugins")
    }

    fn head(&self, slug: &str) -> String {
        run_git(&self.plugins_dir().join(slug), &["rev-parse", "HEAD"])
    }

    fn mock_repo(&mut self) -> Mock {
        self.server
            .mock("GET", "/repos/acme/widget")
            .with_status(200)
            .with_body(repo_body("acme", "widget", false, "main"))
            .create()
    }

    fn mock_tip(&mut self, sha: &str) -> Mock {
        self.server
            .mock("GET", "/repos/acme/widget/commits/main")
            .with_status(200)
            .with_body(commit_body(sha, "Upstream tip"))
            .create()
    }
}

fn zip_names(path: &std::path::Path) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#[test]
fn plugin_lifecycle_from_add_to_export() {
    let mut site = Site::new();
    let _repo = site.mock_repo();
    let manager = site.open("site-secret");

    // Add: default branch, slug derived from the repository name
    let plugin = manager.add_plugin(WIDGET_URL, Some("main"), None).unwrap();
    assert_eq!(plugin.slug, "widget");
    assert_eq!(plugin.status, PluginStatus::UpToDate);
    assert!(!plugin.is_private);
    let initial = site.upstream.head_sha("main");
    assert_eq!(site.head("widget"), initial);

    // No upstream change
    let tip = site.mock_tip(&initial);
    assert!(!manager.check_updates("widget").unwrap().has_update);
    drop(tip);

    // Upstream moves on; the check must not touch the working tree
    site.upstream
        .commit_file("main", "includes/class-widget.php", "<?php\n", "Add class");
    site.upstream
        .commit_file("main", "tests/test-widget.php", "<?php\n", "Add tests");
    site.upstream
        .commit_file("main", "docs/CHANGELOG.md", "# Changes\n", "Add changelog");
    let latest = site
        .upstream
        .commit_file("main", "markdown.txt", "not markdown\n", "Add notes");
    let _tip = site.mock_tip(&latest);

    let check = manager.check_updates("widget").unwrap();
    assert!(check.has_update);
    assert_eq!(check.remote_commit, latest);
    assert_eq!(
        manager.get_plugin("widget").unwrap().plugin.status,
        PluginStatus::UpdateAvailable
    );
    assert_eq!(site.head("widget"), initial);

    // Sync fast-forwards to the remote tip
    let synced = manager.sync_plugin("widget").unwrap();
    assert_eq!(synced.local_commit, latest);
    assert_eq!(synced.status, PluginStatus::UpToDate);
    assert_eq!(site.head("widget"), latest);

    // Export honours configured exclusions and never ships VCS metadata
    manager
        .update_settings(SettingsUpdate {
            export_exclusions: Some(vec!["*.md".into(), "tests".into()]),
            ..SettingsUpdate::default()
        })
        .unwrap();
    let exports = manager.export_engine(site.root.path().join("exports"), None);
    let archive = exports.export_plugin("widget").unwrap();
    let names = zip_names(&archive.file_path);

    assert!(names.iter().all(|n| n.starts_with("widget/")), "{names:?}");
    assert!(names.contains(&"widget/widget.php".to_string()));
    assert!(names.contains(&"widget/markdown.txt".to_string()));
    assert!(names.contains(&"widget/includes/class-widget.php".to_string()));
    assert!(!names.iter().any(|n| n.split('/').any(|c| c == ".git")));
    assert!(!names.iter().any(|n| n.ends_with(".md")), "{names:?}");
    assert!(!names.iter().any(|n| n.starts_with("widget/tests")), "{names:?}");
}

#[test]
fn switching_to_a_tag_pins_the_working_tree() {
    let mut site = Site::new();
    let _repo = site.mock_repo();
    let manager = site.open("site-secret");
    manager.add_plugin(WIDGET_URL, Some("main"), None).unwrap();

    site.upstream
        .commit_file("main", "widget.php", &wpgit_test_utils::plugin_header("Widget", "2.0.0"), "Release 2.0");
    let tag_sha = site.upstream.tag("v2.0", "main");
    site.upstream
        .commit_file("main", "unreleased.php", "<?php\n", "Start 2.1");

    let plugin = manager.change_branch("widget", "v2.0").unwrap();
    assert_eq!(plugin.branch, "v2.0");
    assert_eq!(plugin.status, PluginStatus::UpToDate);
    assert_eq!(plugin.wp_plugin_version, "2.0.0");
    assert_eq!(site.head("widget"), tag_sha);

    // Re-syncing a tag stays on the tag
    let again = manager.sync_plugin("widget").unwrap();
    assert_eq!(again.local_commit, tag_sha);
    assert!(!site.plugins_dir().join("widget/unreleased.php").exists());
}

#[test]
fn duplicate_add_conflicts_and_keeps_one_record() {
    let mut site = Site::new();
    let _repo = site.mock_repo();
    let manager = site.open("site-secret");

    manager.add_plugin(WIDGET_URL, None, None).unwrap();
    let err = manager.add_plugin(WIDGET_URL, None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(manager.get_all_plugins().unwrap().len(), 1);
}

#[test]
fn state_survives_reopening() {
    let mut site = Site::new();
    let _repo = site.mock_repo();

    {
        let manager = site.open("site-secret");
        manager.add_plugin(WIDGET_URL, None, None).unwrap();
        manager.toggle_auto_sync("widget", true).unwrap();
        manager.set_token("ghp_persisted").unwrap();
    }

    let stored = std::fs::read_to_string(site.root.path().join("data/settings.json")).unwrap();
    assert!(!stored.contains("ghp_persisted"));

    let reopened = site.open("site-secret");
    let view = reopened.get_plugin("widget").unwrap();
    assert!(view.plugin.auto_sync);
    assert!(view.directory_exists);
    assert!(!reopened.get_settings().unwrap().github_token.is_empty());

    // A different secret cannot read the stored token
    let _user = site
        .server
        .mock("GET", "/user")
        .with_status(200)
        .with_body(r#"{"login":"octocat"}"#)
        .expect(0)
        .create();
    let wrong_key = site.open("another-secret");
    assert!(wrong_key.verify_token(None).is_err());
}

#[test]
fn concurrent_writers_do_not_lose_updates() {
    let mut site = Site::new();
    let _repo = site.mock_repo();
    let setup = site.open("site-secret");
    setup.add_plugin(WIDGET_URL, None, Some("widget")).unwrap();
    setup.add_plugin(WIDGET_URL, None, Some("widget-copy")).unwrap();
    drop(setup);

    let handles: Vec<_> = ["widget", "widget-copy"]
        .into_iter()
        .map(|slug| {
            let manager = site.open("site-secret");
            thread::spawn(move || {
                for i in 0..20 {
                    manager.toggle_auto_sync(slug, i % 2 == 1).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let manager = site.open("site-secret");
    for view in manager.get_all_plugins().unwrap() {
        assert!(view.plugin.auto_sync, "{} lost its last update", view.plugin.slug);
    }
}
