//! CLI tests that need neither the network nor a managed plugin
//!
//! These tests exercise the compiled binary using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `wpgit` isolated to a sandbox data directory.
fn wpgit(sandbox: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wpgit"));
    cmd.current_dir(sandbox.path())
        .env_remove("WPGIT_CONFIG")
        .env_remove("WPGIT_PLUGINS_DIR")
        .env("WPGIT_SITE_SECRET", "cli-test-secret")
        .env("NO_COLOR", "1")
        .arg("--data-dir")
        .arg(sandbox.path().join("data"));
    cmd
}

#[test]
fn help_lists_commands() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("check-all"))
        .stdout(predicate::str::contains("cleanup-exports"));
}

#[test]
fn version_flag() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wpgit"));
}

#[test]
fn no_command_shows_hint() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .assert()
        .success()
        .stdout(predicate::str::contains("wpgit --help"));
}

#[test]
fn list_is_empty_initially() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No managed plugins"));
}

#[test]
fn list_json_is_an_empty_array() {
    let sandbox = TempDir::new().unwrap();
    let output = wpgit(&sandbox).args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value, serde_json::json!([]));
}

#[test]
fn unknown_slug_fails_with_error_line() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .args(["show", "ghost"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn invalid_url_is_rejected_before_any_request() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .args(["add", "https://gitlab.com/acme/widget"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("github.com"));
}

#[test]
fn settings_show_defaults() {
    let sandbox = TempDir::new().unwrap();
    let output = wpgit(&sandbox)
        .args(["settings", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["auto_sync_interval"], "hourly");
    assert_eq!(value["cleanup_exports_after"], 24);
    assert_eq!(value["token_configured"], false);
    assert_eq!(value["default_encryption_key"], false);
    assert!(
        value["export_exclusions"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!("node_modules"))
    );
}

#[test]
fn settings_set_persists_between_runs() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .args([
            "settings",
            "set",
            "--interval",
            "daily",
            "--exclude",
            "*.md",
            "--exclude",
            "tests",
            "--cleanup-after",
            "48",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings saved"));

    let output = wpgit(&sandbox)
        .args(["settings", "show", "--json"])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["auto_sync_interval"], "daily");
    assert_eq!(value["cleanup_exports_after"], 48);
    assert_eq!(value["export_exclusions"], serde_json::json!(["*.md", "tests"]));
}

#[test]
fn settings_set_rejects_unknown_interval() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .args(["settings", "set", "--interval", "weekly"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("weekly"));
}

#[test]
fn settings_set_without_changes_is_an_error() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .args(["settings", "set"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to change"));
}

#[test]
fn missing_site_secret_is_flagged() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .env_remove("WPGIT_SITE_SECRET")
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("WPGIT_SITE_SECRET"));
}

#[test]
fn token_set_no_verify_then_clear() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .args(["token", "set", "ghp_example", "--no-verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not verified"));

    let stored = std::fs::read_to_string(sandbox.path().join("data/settings.json")).unwrap();
    assert!(!stored.contains("ghp_example"));

    wpgit(&sandbox)
        .args(["token", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Token removed"));
}

#[test]
fn token_verify_without_token_fails() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .args(["token", "verify"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn exports_empty_and_bad_names_rejected() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .arg("exports")
        .assert()
        .success()
        .stdout(predicate::str::contains("No exports"));

    wpgit(&sandbox)
        .args(["delete-export", "../settings.json"])
        .assert()
        .failure();
}

#[test]
fn cleanup_with_no_exports_removes_nothing() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .args(["cleanup-exports", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"removed\": 0"));
}

#[test]
fn missing_git_binary_is_reported() {
    let sandbox = TempDir::new().unwrap();
    let config = sandbox.path().join("wpgit.toml");
    std::fs::write(&config, "git_binary = \"/nonexistent/git\"\n").unwrap();
    wpgit(&sandbox)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("/nonexistent/git"));
}

#[test]
fn explicit_config_must_exist() {
    let sandbox = TempDir::new().unwrap();
    wpgit(&sandbox)
        .args(["--config", "absent.toml", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}
