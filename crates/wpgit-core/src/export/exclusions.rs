//! Path exclusion rules for exports

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::{Error, Result};

/// Always excluded, whatever the configured list says.
const VCS_DIR: &str = ".git";

/// Compiled exclusion patterns.
///
/// Patterns without a `/` are tested against every component of a relative
/// path, so `tests` removes a whole subtree and `*.md` matches Markdown files
/// at any depth. Patterns with a `/` are tested against the full relative
/// path and each of its ancestors. `*` and `?` never cross a `/`; `**` does.
#[derive(Debug, Clone)]
pub struct ExclusionMatcher {
    component: GlobSet,
    path: GlobSet,
}

impl ExclusionMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut component = GlobSetBuilder::new();
        let mut path = GlobSetBuilder::new();
        component.add(compile(VCS_DIR)?);

        for raw in patterns {
            let pattern = raw.as_ref().trim().trim_matches('/');
            if pattern.is_empty() {
                continue;
            }
            if pattern.contains('/') {
                path.add(compile(pattern)?);
            } else {
                component.add(compile(pattern)?);
            }
        }

        Ok(Self {
            component: component.build().map_err(invalid("<set>"))?,
            path: path.build().map_err(invalid("<set>"))?,
        })
    }

    /// Whether `relative` (forward slashes, no leading `/`) is excluded.
    pub fn is_excluded(&self, relative: &str) -> bool {
        let relative = relative.trim_matches('/');
        if relative.is_empty() {
            return false;
        }
        if relative.split('/').any(|c| self.component.is_match(c)) {
            return true;
        }
        if self.path.is_empty() {
            return false;
        }
        ancestors(relative).any(|prefix| self.path.is_match(prefix))
    }
}

/// `a/b/c` → `a`, `a/b`, `a/b/c`
fn ancestors(relative: &str) -> impl Iterator<Item = &str> {
    relative
        .match_indices('/')
        .map(move |(i, _)| &relative[..i])
        .chain(std::iter::once(relative))
}

fn compile(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(invalid(pattern))
}

fn invalid(pattern: &str) -> impl Fn(globset::Error) -> Error + '_ {
    move |e| Error::InvalidSetting {
        name: "export_exclusions".into(),
        reason: format!("'{pattern}': {e}"),
    }
}
