//! Repository name to slug mapping and ref name validation

use crate::{Error, Result};

/// Convert a repository name into a plugin slug.
///
/// Lower-cases ASCII, keeps letters, digits, `-` and `_`, and collapses any
/// other run of characters into a single dash.
/// `My.Cool_Plugin` -> `my-cool_plugin`
pub fn slugify(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut last_was_dash = true; // Start true to skip leading dashes

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Validate a branch or tag name before it reaches a git argument vector.
///
/// Follows the `git check-ref-format` rules that matter here and rejects a
/// leading dash so a ref can never be parsed as an option.
pub fn validate_ref_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidRef {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("empty"));
    }
    if name.starts_with('-') {
        return Err(invalid("must not start with '-'"));
    }
    if name.starts_with('/') || name.ends_with('/') || name.contains("//") {
        return Err(invalid("malformed path separators"));
    }
    if name.ends_with('.') || name.ends_with(".lock") {
        return Err(invalid("must not end with '.' or '.lock'"));
    }
    if name.contains("..") || name.contains("@{") || name == "@" {
        return Err(invalid("contains a forbidden sequence"));
    }
    if name.split('/').any(|part| part.starts_with('.')) {
        return Err(invalid("components must not start with '.'"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_control() || c.is_whitespace() || "~^:?*[\\".contains(*c))
    {
        return Err(invalid(&format!("character {c:?} is not allowed")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("widget"), "widget");
    }

    #[test]
    fn test_slugify_mixed_case_and_dots() {
        assert_eq!(slugify("My.Cool_Plugin"), "my-cool_plugin");
    }

    #[test]
    fn test_ref_with_option_prefix_rejected() {
        assert!(validate_ref_name("--upload-pack=evil").is_err());
    }
}
