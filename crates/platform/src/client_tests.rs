use mockito::{Matcher, Server};
use provisioning::{OwnerLogin, RepositoryId, RepositoryName, Timestamp};
use serde_json::json;

use super::*;

const INSTANCE: &str = "inst-42";

fn settings(server: &Server, token: Option<&str>) -> PlatformSettings {
    PlatformSettings {
        api_url: server.url(),
        api_token: token.map(SecretString::new),
        component_secret: SecretString::new("whsec"),
    }
}

fn instance() -> InstanceId {
    InstanceId::new(INSTANCE).expect("instance")
}

fn instance_path() -> String {
    format!("/api/v1/component-instances/{INSTANCE}")
}

#[tokio::test]
async fn test_progress_is_patched_with_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PATCH", instance_path().as_str())
        .match_header("authorization", "Bearer platform-token")
        .match_body(Matcher::Json(json!({
            "state": "provisioning",
            "progress": 40,
            "message": "Creating GitHub Environments...",
        })))
        .with_status(200)
        .create_async()
        .await;

    PlatformClient::new(&settings(&server, Some("platform-token")))
        .publish_progress(&instance(), 40, "Creating GitHub Environments...")
        .await
        .expect("reported");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_ready_carries_metadata_and_full_progress() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PATCH", instance_path().as_str())
        .match_body(Matcher::PartialJson(json!({
            "state": "ready",
            "progress": 100,
            "message": "Repository configured successfully",
            "metadata": {
                "repo_url": "https://github.com/bot/okta-terraform-acme",
                "repo_name": "okta-terraform-acme",
                "repo_id": 77,
                "owner": "bot",
            },
        })))
        .with_status(200)
        .create_async()
        .await;

    let metadata = ReadyMetadata {
        repo_url: "https://github.com/bot/okta-terraform-acme".into(),
        repo_name: RepositoryName::new("okta-terraform-acme").expect("name"),
        repo_id: RepositoryId::new(77),
        owner: OwnerLogin::new("bot").expect("owner"),
        created_at: Timestamp::now(),
    };
    PlatformClient::new(&settings(&server, Some("t")))
        .publish_ready(&instance(), &metadata)
        .await
        .expect("reported");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_resets_progress_and_omits_message() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PATCH", instance_path().as_str())
        .match_body(Matcher::Json(json!({
            "state": "error",
            "progress": 0,
            "error_message": "Creating GitHub Environments: boom",
            "error_details": "Step create_environments failed\ncaused by: boom",
        })))
        .with_status(204)
        .create_async()
        .await;

    PlatformClient::new(&settings(&server, Some("t")))
        .publish_error(
            &instance(),
            "Creating GitHub Environments: boom",
            "Step create_environments failed\ncaused by: boom",
        )
        .await
        .expect("reported");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_deleted_state() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PATCH", instance_path().as_str())
        .match_body(Matcher::Json(json!({
            "state": "deleted",
            "message": "Repository archived",
        })))
        .with_status(200)
        .create_async()
        .await;

    PlatformClient::new(&settings(&server, Some("t")))
        .publish_deleted(&instance(), "Repository archived")
        .await
        .expect("reported");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_success_status_is_an_api_error() {
    let mut server = Server::new_async().await;
    server
        .mock("PATCH", instance_path().as_str())
        .with_status(503)
        .with_body("unavailable")
        .create_async()
        .await;

    let err = PlatformClient::new(&settings(&server, Some("t")))
        .publish_progress(&instance(), 20, "Creating repository from template...")
        .await
        .expect_err("rejected");

    match err {
        ReportError::Api { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "unavailable");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reports_are_skipped_without_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PATCH", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = PlatformClient::new(&settings(&server, None));
    client
        .publish_progress(&instance(), 0, "Initializing...")
        .await
        .expect("skipped");
    client
        .publish_error(&instance(), "m", "d")
        .await
        .expect("skipped");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_instance_id_is_escaped_as_one_path_segment() {
    let mut server = Server::new_async().await;
    let traversal = server
        .mock("PATCH", "/admin/users")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;
    let escaped = server
        .mock(
            "PATCH",
            "/api/v1/component-instances/..%2F..%2F..%2Fadmin%2Fusers",
        )
        .with_status(200)
        .create_async()
        .await;

    let hostile = InstanceId::new("../../../admin/users").expect("instance");
    PlatformClient::new(&settings(&server, Some("platform-token")))
        .publish_deleted(&hostile, "Repository archived")
        .await
        .expect("reported");

    traversal.assert_async().await;
    escaped.assert_async().await;
}

#[tokio::test]
async fn test_dot_instance_id_is_refused_without_a_request() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("PATCH", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = PlatformClient::new(&settings(&server, Some("platform-token")))
        .publish_progress(&InstanceId::new("..").expect("instance"), 0, "Initializing...")
        .await
        .expect_err("refused");

    assert!(matches!(err, ReportError::UnaddressableInstance { ref instance } if instance == ".."));
    any.assert_async().await;
}
