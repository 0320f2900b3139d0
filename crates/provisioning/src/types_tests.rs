use super::*;
use serde_json::json;

fn request_with_email(email: Option<&str>) -> ProvisioningRequest {
    ProvisioningRequest {
        instance_id: InstanceId::new("i1").expect("non-empty"),
        demo_id: None,
        user_id: None,
        component_id: None,
        user_email: email.map(str::to_string),
        org: OrgIdentity {
            name: "Acme".into(),
            api_token: SecretString::new("tok"),
            base_url: OrgIdentity::DEFAULT_BASE_URL.into(),
        },
        configuration: ComponentConfiguration::default(),
    }
}

#[test]
fn test_secret_string_is_redacted_in_debug_and_display() {
    let secret = SecretString::new("00abcdef");
    assert_eq!(format!("{secret}"), "[REDACTED]");
    assert!(!format!("{secret:?}").contains("00abcdef"));
    assert_eq!(secret.expose(), "00abcdef");
}

#[test]
fn test_configuration_reads_recognised_keys() {
    let config = ComponentConfiguration::from_json(&json!({
        "repo_visibility": "public",
        "auto_import": false,
        "other": 1
    }));

    assert_eq!(config.repo_visibility, Some(Visibility::Public));
    assert!(!config.auto_import_allowed());
}

#[test]
fn test_configuration_keeps_only_recognised_keys() {
    let config = ComponentConfiguration::from_json(&json!({
        "auto_import": true,
        "region": "us-east-1",
        "nested": { "deep": [1, 2, 3] }
    }));

    assert_eq!(
        config,
        ComponentConfiguration {
            repo_visibility: None,
            auto_import: Some(true),
        }
    );
}

#[test]
fn test_configuration_treats_unknown_visibility_as_private() {
    let config = ComponentConfiguration::from_json(&json!({ "repo_visibility": "internal" }));
    assert_eq!(config.repo_visibility, Some(Visibility::Private));
}

#[test]
fn test_configuration_only_explicit_false_blocks_auto_import() {
    assert!(ComponentConfiguration::from_json(&json!({})).auto_import_allowed());
    assert!(ComponentConfiguration::from_json(&json!({ "auto_import": "no" })).auto_import_allowed());
    assert!(ComponentConfiguration::from_json(&json!(null)).auto_import_allowed());
}

#[test]
fn test_collaborator_username_is_email_local_part() {
    let request = request_with_email(Some("jane-doe42@example.com"));
    assert_eq!(request.collaborator_username(), Some("jane-doe42"));
}

#[test]
fn test_collaborator_username_rejects_local_parts_that_are_not_logins() {
    for email in [
        "jane.doe@example.com",
        "../../orgs/victim/memberships/attacker@example.com",
        "a?b@example.com",
        "a#b@example.com",
    ] {
        assert_eq!(request_with_email(Some(email)).collaborator_username(), None, "{email}");
    }
}

#[test]
fn test_collaborator_username_absent_without_usable_email() {
    assert_eq!(request_with_email(None).collaborator_username(), None);
    assert_eq!(request_with_email(Some("@example.com")).collaborator_username(), None);
}

#[test]
fn test_ready_metadata_serialises_with_platform_field_names() {
    let metadata = ReadyMetadata {
        repo_url: "https://github.com/bot/okta-terraform-acme".into(),
        repo_name: RepositoryName::new("okta-terraform-acme").expect("non-empty"),
        repo_id: RepositoryId::new(7),
        owner: OwnerLogin::new("bot").expect("non-empty"),
        created_at: Timestamp::now(),
    };

    let value = serde_json::to_value(&metadata).expect("serialise");

    assert_eq!(value["repo_name"], "okta-terraform-acme");
    assert_eq!(value["repo_id"], 7);
    assert_eq!(value["owner"], "bot");
    assert!(value["created_at"].is_string());
}
