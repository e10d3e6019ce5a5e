//! Blocking GitHub REST client

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use reqwest::{StatusCode, Url};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, LINK};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::ResponseCache;
use crate::types::{RawCommit, RawRef};
use crate::{Comparison, Error, RefInfo, RemoteCommit, RepoInfo, Result, TokenOwner};

const ACCEPT_V3: &str = "application/vnd.github.v3+json";

/// Items requested per page on list endpoints.
pub const PAGE_SIZE: u32 = 100;

/// Pages followed on list endpoints before giving up.
pub const MAX_PAGES: u32 = 10;

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API base URL, without a trailing slash
    pub api_url: String,

    pub user_agent: String,

    #[serde(with = "secs")]
    pub timeout: Duration,

    /// Timeout for `GET /user`
    #[serde(with = "secs")]
    pub verify_timeout: Duration,

    #[serde(with = "secs")]
    pub cache_ttl: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".into(),
            user_agent: concat!("wpgit/", env!("CARGO_PKG_VERSION")).into(),
            timeout: Duration::from_secs(30),
            verify_timeout: Duration::from_secs(15),
            cache_ttl: crate::cache::DEFAULT_TTL,
        }
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// Supplies the bearer token for each request.
///
/// Implementations read the stored token lazily so a changed or cleared
/// token is picked up without rebuilding the client.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A fixed token, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone().filter(|t| !t.is_empty())
    }
}

/// GitHub REST client with a response cache and rate-limit detection.
pub struct GitHubClient {
    http: Client,
    config: GitHubConfig,
    cache: ResponseCache,
    tokens: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    pub fn new(config: GitHubConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            cache: ResponseCache::new(config.cache_ttl),
            config,
            tokens,
        })
    }

    /// Client without credentials.
    pub fn anonymous(config: GitHubConfig) -> Result<Self> {
        Self::new(config, Arc::new(StaticToken(None)))
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// Check that the repository exists and is visible with the current
    /// credentials. Always live.
    pub fn verify_repo(&self, owner: &str, repo: &str) -> Result<RepoInfo> {
        let path = ["repos", owner, repo];
        let value: Value = self.get_live(&path, &[])?;
        let info = serde_json::from_value(value.clone()).map_err(malformed)?;
        self.cache.insert(ResponseCache::key(&endpoint(&path), &[]), value);
        Ok(info)
    }

    pub fn get_repo(&self, owner: &str, repo: &str) -> Result<RepoInfo> {
        self.get_cached(&["repos", owner, repo], &[])
    }

    /// All branches, following pagination up to [`MAX_PAGES`] pages.
    pub fn get_branches(&self, owner: &str, repo: &str) -> Result<Vec<RefInfo>> {
        let raw: Vec<RawRef> = self.get_paged(&["repos", owner, repo, "branches"])?;
        Ok(raw.into_iter().map(RefInfo::from).collect())
    }

    /// All tags, following pagination up to [`MAX_PAGES`] pages.
    pub fn get_tags(&self, owner: &str, repo: &str) -> Result<Vec<RefInfo>> {
        let raw: Vec<RawRef> = self.get_paged(&["repos", owner, repo, "tags"])?;
        Ok(raw.into_iter().map(RefInfo::from).collect())
    }

    /// A commit by hash. Commits are immutable, so the response is cached.
    pub fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<RemoteCommit> {
        let raw: RawCommit = self.get_cached(&ref_path(&["repos", owner, repo, "commits"], sha), &[])?;
        Ok(raw.into())
    }

    /// Tip of a branch or tag. Never cached; this drives update detection.
    pub fn get_latest_commit(&self, owner: &str, repo: &str, reference: &str) -> Result<RemoteCommit> {
        let raw: RawCommit =
            self.get_live(&ref_path(&["repos", owner, repo, "commits"], reference), &[])?;
        Ok(raw.into())
    }

    /// The most recent `count` commits on `branch`.
    pub fn get_commits(&self, owner: &str, repo: &str, branch: &str, count: u32) -> Result<Vec<RemoteCommit>> {
        let raw: Vec<RawCommit> = self.get_cached(
            &["repos", owner, repo, "commits"],
            &[("sha", branch.to_string()), ("per_page", count.clamp(1, 100).to_string())],
        )?;
        Ok(raw.into_iter().map(RemoteCommit::from).collect())
    }

    /// Compare `base...head`. Never cached.
    pub fn compare_commits(&self, owner: &str, repo: &str, base: &str, head: &str) -> Result<Comparison> {
        let range = format!("{base}...{head}");
        self.get_live(&ref_path(&["repos", owner, repo, "compare"], &range), &[])
    }

    /// Identify the owner of `token` with `GET /user`.
    ///
    /// Uses `token` rather than the configured source so a candidate can be
    /// checked before it is saved.
    pub fn verify_token(&self, token: &str) -> Result<TokenOwner> {
        if token.is_empty() {
            return Err(Error::Unauthorized {
                message: "no token provided".into(),
            });
        }
        let url = self.url(&["user"])?;
        tracing::debug!(%url, "GitHub request");
        let response = self
            .http
            .get(url)
            .header(ACCEPT, ACCEPT_V3)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .timeout(self.config.verify_timeout)
            .send()?;
        decode(response, "/user")
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// API URL for `segments`. Each segment is percent-encoded, so `#`, `?`
    /// and `%` in ref names stay part of the path.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_url).map_err(|e| Error::Transport {
            message: format!("invalid API URL {}: {e}", self.config.api_url),
        })?;
        url.path_segments_mut()
            .map_err(|()| Error::Transport {
                message: format!("API URL {} cannot carry a path", self.config.api_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_cached<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, String)]) -> Result<T> {
        let key = ResponseCache::key(&endpoint(segments), query);
        if let Some(value) = self.cache.get(&key) {
            tracing::debug!(endpoint = %endpoint(segments), "GitHub cache hit");
            return serde_json::from_value(value).map_err(malformed);
        }
        let value: Value = self.get_live(segments, query)?;
        let shaped = serde_json::from_value(value.clone()).map_err(malformed)?;
        self.cache.insert(key, value);
        Ok(shaped)
    }

    fn get_live<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, String)]) -> Result<T> {
        let mut url = self.url(segments)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        decode(self.send(url)?, &endpoint(segments))
    }

    /// Collect every page of a list endpoint by following `Link: rel="next"`.
    ///
    /// Stops after [`MAX_PAGES`] pages, and never follows a link to another
    /// host so the token stays with the configured API.
    fn get_paged<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Vec<T>> {
        let query = [("per_page", PAGE_SIZE.to_string())];
        let name = endpoint(segments);
        let key = ResponseCache::key(&name, &query);
        if let Some(value) = self.cache.get(&key) {
            tracing::debug!(endpoint = %name, "GitHub cache hit");
            return serde_json::from_value(value).map_err(malformed);
        }

        let mut first = self.url(segments)?;
        first
            .query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));

        let mut items: Vec<Value> = Vec::new();
        let mut next = Some(first.clone());
        let mut pages = 0;
        while let Some(url) = next.take() {
            let response = self.send(url)?;
            let link = next_link(response.headers()).filter(|l| l.origin() == first.origin());
            let page: Vec<Value> = decode(response, &name)?;
            items.extend(page);
            pages += 1;
            if pages == MAX_PAGES && link.is_some() {
                tracing::warn!(endpoint = %name, pages, "Stopped following pagination");
                break;
            }
            next = link;
        }

        let value = Value::Array(items);
        let shaped = serde_json::from_value(value.clone()).map_err(malformed)?;
        self.cache.insert(key, value);
        Ok(shaped)
    }

    fn send(&self, url: Url) -> Result<Response> {
        tracing::debug!(%url, "GitHub request");
        let mut request = self.http.get(url).header(ACCEPT, ACCEPT_V3);
        if let Some(token) = self.tokens.token() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        Ok(request.send()?)
    }
}

/// `prefix` followed by the `/`-separated components of a ref name.
fn ref_path<'a>(prefix: &[&'a str], reference: &'a str) -> Vec<&'a str> {
    prefix.iter().copied().chain(reference.split('/')).collect()
}

/// Display form of an endpoint, used for logs, cache keys and errors.
fn endpoint(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}

/// The `rel="next"` target of a `Link` header, if any.
fn next_link(headers: &HeaderMap) -> Option<Url> {
    let value = headers.get(LINK)?.to_str().ok()?;
    value.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().eq_ignore_ascii_case(r#"rel="next""#));
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        if is_next { Url::parse(target).ok() } else { None }
    })
}

fn malformed(e: serde_json::Error) -> Error {
    Error::Transport {
        message: format!("malformed response: {e}"),
    }
}

/// Map a response to `T` or the matching error.
fn decode<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        let body = response.text()?;
        return serde_json::from_str(&body).map_err(malformed);
    }

    let headers = response.headers().clone();
    if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS) && quota_exhausted(&headers) {
        let reset_at = reset_time(&headers);
        tracing::warn!(endpoint, reset_at = ?reset_at, "GitHub rate limit exceeded");
        return Err(Error::RateLimited { reset_at });
    }

    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    tracing::debug!(endpoint, status = status.as_u16(), %message, "GitHub request failed");

    match status {
        StatusCode::NOT_FOUND => Err(Error::NotFound {
            resource: endpoint.to_string(),
        }),
        StatusCode::UNAUTHORIZED => Err(Error::Unauthorized { message }),
        _ => Err(Error::Api {
            status: status.as_u16(),
            message,
        }),
    }
}

fn quota_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

fn reset_time(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let seconds: i64 = headers.get("x-ratelimit-reset")?.to_str().ok()?.trim().parse().ok()?;
    Utc.timestamp_opt(seconds, 0).single()
}
