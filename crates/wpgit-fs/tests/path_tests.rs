use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use wpgit_fs::{NormalizedPath, validate_slug};

#[test]
fn test_normalize_backslashes_to_forward() {
    let path = NormalizedPath::new("foo\\bar\\baz");
    assert_eq!(path.as_str(), "foo/bar/baz");
}

#[test]
fn test_join_resolves_parent_segments() {
    let root = NormalizedPath::new("/srv/plugins");
    assert_eq!(root.join("widget").as_str(), "/srv/plugins/widget");
    assert_eq!(root.join("../secrets.txt").as_str(), "/srv/secrets.txt");
}

#[test]
fn test_parent_and_file_name() {
    let path = NormalizedPath::new("widget/includes/class-widget.php");
    assert_eq!(path.parent().unwrap().as_str(), "widget/includes");
    assert_eq!(path.file_name(), Some("class-widget.php"));
    assert_eq!(path.extension(), Some("php"));
}

#[test]
fn test_dotfile_has_no_extension() {
    let path = NormalizedPath::new("widget/.gitignore");
    assert_eq!(path.extension(), None);
}

#[rstest]
#[case("widget")]
#[case("my-plugin")]
#[case("my_plugin.v2")]
#[case("Plugin42")]
fn test_valid_slugs(#[case] slug: &str) {
    assert!(validate_slug(slug).is_ok(), "{slug} should be valid");
}

#[rstest]
#[case("")]
#[case(".")]
#[case("..")]
#[case(".hidden")]
#[case("-dash")]
#[case("a/b")]
#[case("a\\b")]
#[case("with space")]
fn test_invalid_slugs(#[case] slug: &str) {
    assert!(validate_slug(slug).is_err(), "{slug:?} should be rejected");
}

#[test]
fn test_overlong_slug_is_rejected() {
    let slug = "a".repeat(101);
    assert!(validate_slug(&slug).is_err());
}

fn segments() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            4 => "[a-z0-9_-]{1,8}",
            1 => Just(".".to_string()),
            1 => Just("..".to_string()),
            1 => Just(String::new()),
        ],
        0..10,
    )
}

proptest! {
    #[test]
    fn normalized_paths_have_no_dot_segments(parts in segments(), windows in any::<bool>()) {
        let sep = if windows { "\\" } else { "/" };
        let path = NormalizedPath::new(parts.join(sep));
        prop_assert!(!path.as_str().contains('\\'));
        prop_assert!(path.components().all(|c| c != "." && c != ".."));
    }

    #[test]
    fn normalizing_twice_changes_nothing(parts in segments(), absolute in any::<bool>()) {
        let raw = format!("{}{}", if absolute { "/" } else { "" }, parts.join("/"));
        let once = NormalizedPath::new(&raw);
        let twice = NormalizedPath::new(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn absolute_paths_stay_absolute_after_join(parts in segments()) {
        let joined = NormalizedPath::new("/srv/plugins").join(&parts.join("/"));
        prop_assert!(joined.as_str().starts_with('/'));
    }

    #[test]
    fn well_formed_slugs_are_accepted(slug in "[A-Za-z0-9_][A-Za-z0-9_.-]{0,99}") {
        prop_assert!(validate_slug(&slug).is_ok(), "{} should be valid", slug);
    }

    #[test]
    fn slugs_with_separators_are_rejected(a in "[a-z]{1,10}", b in "[a-z]{1,10}", sep in prop_oneof![Just('/'), Just('\\')]) {
        let slug = format!("{a}{sep}{b}");
        prop_assert!(validate_slug(&slug).is_err());
    }
}
