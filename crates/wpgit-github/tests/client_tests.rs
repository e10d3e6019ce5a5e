//! GitHub client tests against a mock API server

use std::sync::Arc;

use mockito::{Matcher, Server};
use pretty_assertions::assert_eq;
use rstest::rstest;
use wpgit_github::{Error, GitHubClient, GitHubConfig, StaticToken};
use wpgit_test_utils::github::{commit_body, commit_value, refs_body, repo_body};

fn client(server: &Server, token: Option<&str>) -> GitHubClient {
    let config = GitHubConfig {
        api_url: server.url(),
        ..GitHubConfig::default()
    };
    GitHubClient::new(config, Arc::new(StaticToken(token.map(String::from)))).unwrap()
}

#[test]
fn get_repo_shapes_response_and_caches_it() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/repos/acme/widget")
        .match_header("accept", "application/vnd.github.v3+json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(repo_body("acme", "widget", false, "main"))
        .expect(1)
        .create();

    let client = client(&server, None);
    let first = client.get_repo("acme", "widget").unwrap();
    let second = client.get_repo("acme", "widget").unwrap();

    assert_eq!(first.full_name, "acme/widget");
    assert!(!first.private);
    assert_eq!(first.default_branch, "main");
    assert_eq!(first, second);
    mock.assert();
}

#[test]
fn clear_cache_forces_a_new_request() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/repos/acme/widget")
        .with_status(200)
        .with_body(repo_body("acme", "widget", true, "main"))
        .expect(2)
        .create();

    let client = client(&server, None);
    client.get_repo("acme", "widget").unwrap();
    client.clear_cache();
    client.get_repo("acme", "widget").unwrap();
    mock.assert();
}

#[test]
fn latest_commit_is_never_cached() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/repos/acme/widget/commits/main")
        .with_status(200)
        .with_body(commit_body("abc123", "Fix output escaping"))
        .expect(2)
        .create();

    let client = client(&server, None);
    let commit = client.get_latest_commit("acme", "widget", "main").unwrap();
    client.get_latest_commit("acme", "widget", "main").unwrap();

    assert_eq!(commit.sha, "abc123");
    assert_eq!(commit.message, "Fix output escaping");
    assert_eq!(commit.author_name, "Test User");
    assert_eq!(commit.author_email, "test@test.com");
    assert_eq!(commit.unix_timestamp, 1_705_314_600);
    mock.assert();
}

#[test]
fn branches_and_tags_are_reduced_to_name_and_sha() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/repos/acme/widget/branches")
        .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
        .with_status(200)
        .with_body(refs_body(&[("main", "aaa"), ("develop", "bbb")]))
        .create();
    let _mock = server
        .mock("GET", "/repos/acme/widget/tags")
        .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
        .with_status(200)
        .with_body(refs_body(&[("v1.0.0", "ccc")]))
        .create();

    let client = client(&server, None);
    let branches = client.get_branches("acme", "widget").unwrap();
    let tags = client.get_tags("acme", "widget").unwrap();

    let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["main", "develop"]);
    assert_eq!(branches[1].commit_sha, "bbb");
    assert_eq!(tags[0].name, "v1.0.0");
    assert_eq!(tags[0].commit_sha, "ccc");
}

#[test]
fn ref_names_are_percent_encoded_in_the_path() {
    let mut server = Server::new();
    let wrong = server
        .mock("GET", "/repos/acme/widget/commits/feat")
        .with_status(200)
        .with_body(commit_body("bad", "Wrong branch"))
        .expect(0)
        .create();
    let right = server
        .mock(
            "GET",
            Matcher::Regex(r"^/repos/acme/widget/commits/feat(%23|#)1$".into()),
        )
        .with_status(200)
        .with_body(commit_body("good", "Right branch"))
        .create();

    let commit = client(&server, None)
        .get_latest_commit("acme", "widget", "feat#1")
        .unwrap();
    assert_eq!(commit.sha, "good");
    right.assert();
    wrong.assert();
}

#[test]
fn slashes_in_ref_names_stay_path_separators() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/repos/acme/widget/commits/feature/login")
        .with_status(200)
        .with_body(commit_body("abc", "Login form"))
        .create();

    let commit = client(&server, None)
        .get_latest_commit("acme", "widget", "feature/login")
        .unwrap();
    assert_eq!(commit.sha, "abc");
    mock.assert();
}

#[test]
fn tags_follow_next_links_across_pages() {
    let mut server = Server::new();
    let next = format!(
        r#"<{0}/repos/acme/widget/tags?per_page=100&page=2>; rel="next", <{0}/repos/acme/widget/tags?per_page=100&page=2>; rel="last""#,
        server.url()
    );
    let first = server
        .mock("GET", "/repos/acme/widget/tags")
        .match_query(Matcher::Exact("per_page=100".into()))
        .with_status(200)
        .with_header("link", next.as_str())
        .with_body(refs_body(&[("v2.0.0", "bbb"), ("v1.1.0", "aaa")]))
        .create();
    let second = server
        .mock("GET", "/repos/acme/widget/tags")
        .match_query(Matcher::Exact("per_page=100&page=2".into()))
        .with_status(200)
        .with_body(refs_body(&[("v1.0.0", "ccc")]))
        .create();

    let client = client(&server, None);
    let tags = client.get_tags("acme", "widget").unwrap();
    let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["v2.0.0", "v1.1.0", "v1.0.0"]);

    // The combined list is cached as one response
    client.get_tags("acme", "widget").unwrap();
    first.assert();
    second.assert();
}

#[test]
fn next_links_to_another_host_are_ignored() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/repos/acme/widget/branches")
        .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
        .with_status(200)
        .with_header(
            "link",
            r#"<http://elsewhere.invalid/repos/acme/widget/branches?page=2>; rel="next""#,
        )
        .with_body(refs_body(&[("main", "aaa")]))
        .create();

    let branches = client(&server, Some("secret"))
        .get_branches("acme", "widget")
        .unwrap();
    assert_eq!(branches.len(), 1);
    mock.assert();
}

#[test]
fn get_commits_passes_branch_and_count() {
    let mut server = Server::new();
    let body = serde_json::Value::Array(vec![
        commit_value("c2", "Second"),
        commit_value("c1", "First"),
    ])
    .to_string();
    let mock = server
        .mock("GET", "/repos/acme/widget/commits")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("sha".into(), "develop".into()),
            Matcher::UrlEncoded("per_page".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(body)
        .create();

    let commits = client(&server, None)
        .get_commits("acme", "widget", "develop", 2)
        .unwrap();
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].sha, "c2");
    mock.assert();
}

#[test]
fn compare_commits_returns_counts() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/repos/acme/widget/compare/aaa...bbb")
        .with_status(200)
        .with_body(r#"{"status":"behind","ahead_by":0,"behind_by":3,"total_commits":3,"commits":[]}"#)
        .create();

    let comparison = client(&server, None)
        .compare_commits("acme", "widget", "aaa", "bbb")
        .unwrap();
    assert_eq!(comparison.status, "behind");
    assert_eq!(comparison.behind_by, 3);
    assert_eq!(comparison.ahead_by, 0);
}

#[test]
fn configured_token_is_sent_as_bearer() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/repos/acme/secret")
        .match_header("authorization", "Bearer ghp_test")
        .with_status(200)
        .with_body(repo_body("acme", "secret", true, "main"))
        .create();

    let info = client(&server, Some("ghp_test"))
        .verify_repo("acme", "secret")
        .unwrap();
    assert!(info.private);
    mock.assert();
}

#[rstest]
#[case(403)]
#[case(429)]
fn exhausted_quota_is_rate_limited(#[case] status: usize) {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/repos/acme/widget/commits/main")
        .with_status(status)
        .with_header("x-ratelimit-remaining", "0")
        .with_header("x-ratelimit-reset", "1700000000")
        .with_body(r#"{"message":"API rate limit exceeded"}"#)
        .create();

    let err = client(&server, None)
        .get_latest_commit("acme", "widget", "main")
        .unwrap_err();
    match err {
        Error::RateLimited { reset_at } => {
            assert_eq!(reset_at.map(|t| t.timestamp()), Some(1_700_000_000));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[test]
fn forbidden_with_quota_left_is_a_plain_api_error() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/repos/acme/widget")
        .with_status(403)
        .with_header("x-ratelimit-remaining", "42")
        .with_body(r#"{"message":"Resource not accessible by integration"}"#)
        .create();

    let err = client(&server, None).get_repo("acme", "widget").unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Resource not accessible by integration");
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[test]
fn missing_repository_is_not_found() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/repos/acme/missing")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create();

    let err = client(&server, None).verify_repo("acme", "missing").unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn server_error_without_message_reports_status_code() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/repos/acme/widget")
        .with_status(502)
        .with_body("<html>bad gateway</html>")
        .create();

    let err = client(&server, None).get_repo("acme", "widget").unwrap_err();
    assert_eq!(err.to_string(), "HTTP 502");
}

#[test]
fn malformed_body_is_a_transport_error() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/repos/acme/widget")
        .with_status(200)
        .with_body("{not json")
        .create();

    let err = client(&server, None).get_repo("acme", "widget").unwrap_err();
    assert!(matches!(err, Error::Transport { .. }));
}

#[test]
fn verify_token_uses_candidate_token() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/user")
        .match_header("authorization", "Bearer candidate")
        .with_status(200)
        .with_body(r#"{"login":"octocat","name":"The Octocat"}"#)
        .create();

    let owner = client(&server, Some("stored")).verify_token("candidate").unwrap();
    assert_eq!(owner.login, "octocat");
    assert_eq!(owner.name.as_deref(), Some("The Octocat"));
    mock.assert();
}

#[test]
fn rejected_token_is_unauthorized() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/user")
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create();

    let err = client(&server, None).verify_token("bad").unwrap_err();
    match err {
        Error::Unauthorized { message } => assert_eq!(message, "Bad credentials"),
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[test]
fn unreachable_api_is_a_transport_error() {
    let config = GitHubConfig {
        api_url: "http://127.0.0.1:1".into(),
        ..GitHubConfig::default()
    };
    let err = GitHubClient::anonymous(config)
        .unwrap()
        .get_repo("acme", "widget")
        .unwrap_err();
    assert!(matches!(err, Error::Transport { .. }));
}
