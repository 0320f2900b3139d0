use super::*;

#[derive(Debug, Error)]
#[error("outer failure")]
struct Outer {
    #[source]
    inner: Inner,
}

#[derive(Debug, Error)]
#[error("inner failure")]
struct Inner;

#[test]
fn test_error_chain_lists_every_cause() {
    let err = Outer { inner: Inner };
    assert_eq!(error_chain(&err), "outer failure\ncaused by: inner failure");
}

#[test]
fn test_error_chain_without_source_is_the_message() {
    assert_eq!(error_chain(&Inner), "inner failure");
}

#[test]
fn test_missing_configuration_names_all_keys() {
    let err = ConfigurationError::Missing {
        missing: vec!["GITHUB_TOKEN".into(), "COMPONENT_SECRET".into()],
    };
    assert_eq!(
        err.to_string(),
        "Missing required environment variables: GITHUB_TOKEN, COMPONENT_SECRET"
    );
}
