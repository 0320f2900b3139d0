use super::*;
use proptest::prelude::*;

fn is_valid_slug(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    let bytes = s.as_bytes();
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    alnum(bytes[0])
        && alnum(bytes[bytes.len() - 1])
        && bytes.iter().all(|&b| alnum(b) || b == b'-')
        && !s.contains("--")
}

#[test]
fn test_sanitize_examples() {
    assert_eq!(sanitize("Acme Co!"), "acme-co");
    assert_eq!(sanitize("  --Foo__Bar--  "), "foo-bar");
    assert_eq!(sanitize("dev-123"), "dev-123");
    assert_eq!(sanitize("a---b"), "a-b");
    assert_eq!(sanitize("!!!"), "");
    assert_eq!(sanitize(""), "");
}

#[test]
fn test_sanitize_is_case_insensitive() {
    assert_eq!(sanitize("ACME CO"), sanitize("acme co"));
}

#[test]
fn test_sanitize_drops_non_ascii_letters() {
    assert_eq!(sanitize("Café Überwald"), "caf-berwald");
}

#[test]
fn test_repository_name_for_prefixes_sanitized_name() {
    let name = repository_name_for("Acme Co!").expect("non-empty");
    assert_eq!(name.as_str(), "okta-terraform-acme-co");
}

#[test]
fn test_repository_name_for_rejects_unusable_names() {
    assert!(repository_name_for("  ***  ").is_none());
}

proptest! {
    #[test]
    fn prop_sanitize_is_idempotent(name in ".*") {
        let once = sanitize(&name);
        prop_assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn prop_sanitize_output_is_a_valid_slug(name in ".*") {
        let out = sanitize(&name);
        prop_assert!(is_valid_slug(&out), "invalid slug {:?} from {:?}", out, name);
    }
}
