//! JSON bodies shaped like the GitHub REST API responses the client reads.

use serde_json::{Value, json};

/// `GET /repos/{owner}/{repo}`
pub fn repo_body(owner: &str, repo: &str, private: bool, default_branch: &str) -> String {
    json!({
        "full_name": format!("{owner}/{repo}"),
        "private": private,
        "default_branch": default_branch,
        "description": "Test repository",
        "html_url": format!("https://github.com/{owner}/{repo}"),
    })
    .to_string()
}

/// A single commit object as returned by `GET /repos/{o}/{r}/commits/{ref}`.
pub fn commit_value(sha: &str, message: &str) -> Value {
    json!({
        "sha": sha,
        "commit": {
            "message": message,
            "author": {
                "name": "Test User",
                "email": "test@test.com",
                "date": "2024-01-15T10:30:00Z",
            },
        },
    })
}

pub fn commit_body(sha: &str, message: &str) -> String {
    commit_value(sha, message).to_string()
}

/// `GET /repos/{o}/{r}/branches` or `/tags` for `(name, sha)` pairs.
pub fn refs_body(refs: &[(&str, &str)]) -> String {
    Value::Array(
        refs.iter()
            .map(|(name, sha)| json!({ "name": name, "commit": { "sha": sha } }))
            .collect(),
    )
    .to_string()
}
