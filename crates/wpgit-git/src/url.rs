//! GitHub repository URL sanitization and parsing

use std::fmt;

use crate::{Error, Result};

const HTTPS_PREFIX: &str = "https://github.com/";
const SSH_PREFIX: &str = "git@github.com:";

/// A validated GitHub repository identity.
///
/// Constructed only through [`RepoUrl::parse`], so an instance always holds
/// a well-formed `{owner, repo}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoUrl {
    owner: String,
    repo: String,
}

impl RepoUrl {
    /// Parse an HTTPS or SSH GitHub URL.
    ///
    /// Accepted forms:
    /// - `https://github.com/<owner>/<repo>[.git][/]`
    /// - `git@github.com:<owner>/<repo>[.git]`
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidUrl {
            url: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let rest = strip_prefix_ignore_case(trimmed, HTTPS_PREFIX)
            .or_else(|| strip_prefix_ignore_case(trimmed, SSH_PREFIX))
            .ok_or_else(|| invalid("only github.com HTTPS or SSH URLs are supported"))?;

        let rest = rest.strip_suffix('/').unwrap_or(rest);
        let rest = rest.strip_suffix(".git").unwrap_or(rest);

        let mut segments = rest.split('/');
        let (Some(owner), Some(repo), None) = (segments.next(), segments.next(), segments.next())
        else {
            return Err(invalid("expected exactly <owner>/<repo>"));
        };

        validate_segment(owner).map_err(|reason| invalid(&format!("owner {reason}")))?;
        validate_segment(repo).map_err(|reason| invalid(&format!("repository {reason}")))?;

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// `owner/repo`, as used by the REST API.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Canonical clone URL: `https://github.com/<owner>/<repo>.git`.
    pub fn https_url(&self) -> String {
        format!("{HTTPS_PREFIX}{}/{}.git", self.owner, self.repo)
    }
}

impl fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.https_url())
    }
}

/// Sanitize a user-supplied URL into the canonical HTTPS clone form.
pub fn sanitize_url(input: &str) -> Result<String> {
    RepoUrl::parse(input).map(|url| url.https_url())
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

fn validate_segment(segment: &str) -> std::result::Result<(), &'static str> {
    if segment.is_empty() {
        return Err("is empty");
    }
    if segment == "." || segment == ".." {
        return Err("is a relative path segment");
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err("contains unsupported characters");
    }
    Ok(())
}
