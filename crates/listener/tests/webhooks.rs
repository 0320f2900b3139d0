use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use listener::signature::{sign, SIGNATURE_HEADER};
use listener::{build_router, AppState};
use orchestrator::{InFlightRegistry, Provisioner, ProvisionerSettings};
use provisioning::testing::{FakeRepositoryHost, HostCall, RecordingStatusReporter, Report};
use provisioning::{
    FeatureFlags, OwnerLogin, ProvisioningDefaults, RuntimeEnvironment, SecretString,
    SettlePolicy,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SECRET: &str = "component-secret";

struct TestApp {
    state: AppState,
    host: Arc<FakeRepositoryHost>,
    reporter: Arc<RecordingStatusReporter>,
}

impl TestApp {
    fn new(environment: RuntimeEnvironment) -> Self {
        Self::with_host(environment, FakeRepositoryHost::new())
    }

    fn with_host(environment: RuntimeEnvironment, host: FakeRepositoryHost) -> Self {
        let host = Arc::new(host);
        let reporter = Arc::new(RecordingStatusReporter::new());
        let provisioner = Provisioner::new(
            host.clone(),
            reporter.clone(),
            ProvisionerSettings {
                owner: OwnerLogin::new("demo-engineering-bot").unwrap(),
                features: FeatureFlags::default(),
                settle: SettlePolicy {
                    poll_interval: Duration::from_millis(10),
                    timeout: Duration::from_secs(60),
                },
                defaults: ProvisioningDefaults::default(),
            },
        );

        let state = AppState {
            environment,
            component_secret: SecretString::new(SECRET),
            provisioner: Arc::new(provisioner),
            in_flight: InFlightRegistry::new(),
        };
        Self {
            state,
            host,
            reporter,
        }
    }

    fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Waits for the background task to publish a terminal report.
    async fn wait_for(&self, done: impl Fn(&[Report]) -> bool) -> Vec<Report> {
        for _ in 0..200 {
            let reports = self.reporter.reports();
            if done(&reports) {
                return reports;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out; reports so far: {:?}", self.reporter.reports());
    }
}

/// Send a POST with the given raw body and optional signature header.
async fn post(
    app: axum::Router,
    uri: &str,
    body: &[u8],
    signature: Option<String>,
) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        req = req.header(SIGNATURE_HEADER, signature);
    }
    let req = req.body(Body::from(body.to_vec())).unwrap();

    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

/// Send a correctly signed POST.
async fn post_signed(app: axum::Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let bytes = serde_json::to_vec(body).unwrap();
    let signature = sign(&bytes, SECRET).unwrap();
    post(app, uri, &bytes, Some(signature)).await
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn requested_body(instance: &str) -> Value {
    json!({
        "demo_id": "demo-7",
        "user_id": "u-1",
        "user_email": "jdoe@example.com",
        "component_id": "okta-terraform",
        "component_instance_id": instance,
        "configuration": {},
        "okta_org": { "name": "Acme Co!", "api_token": "okta-token" },
    })
}

const REQUESTED: &str = "/webhooks/component-requested";
const UPDATED: &str = "/webhooks/component-updated";
const DELETED: &str = "/webhooks/component-deleted";

// ---------------------------------------------------------------------------
// Health and fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_reports_service_and_version() {
    let app = TestApp::new(RuntimeEnvironment::Production);

    let (status, body) = get(app.router(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "okta-terraform-webhook-handler");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::new(RuntimeEnvironment::Production);

    let (status, body) = get(app.router(), "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found", "path": "/nope" }));
}

// ---------------------------------------------------------------------------
// component-requested
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_signed_request_is_accepted_and_provisioned() {
    let app = TestApp::new(RuntimeEnvironment::Production);

    let (status, body) = post_signed(app.router(), REQUESTED, &requested_body("i1")).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(
        body,
        json!({
            "status": "accepted",
            "message": "Provisioning started",
            "component_instance_id": "i1",
            "estimated_time": "60 seconds",
        })
    );

    let reports = app
        .wait_for(|reports| reports.iter().any(Report::is_terminal))
        .await;
    match reports.last() {
        Some(Report::Ready { metadata, .. }) => {
            assert_eq!(metadata.repo_name.as_str(), "okta-terraform-acme-co");
        }
        other => panic!("expected ready, got {other:?}"),
    }

    // The slot is released once the detached run ends.
    for _ in 0..100 {
        if app.state.in_flight.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(app.state.in_flight.is_empty());
}

#[tokio::test]
async fn test_numeric_identifiers_are_accepted() {
    let app = TestApp::new(RuntimeEnvironment::Production);
    let body = json!({
        "demo_id": 42,
        "user_id": 1001,
        "component_id": 7,
        "component_instance_id": 123456,
        "okta_org": { "name": "Acme", "api_token": "okta-token" },
    });

    let (status, body) = post_signed(app.router(), REQUESTED, &body).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["component_instance_id"], "123456");
}

#[tokio::test]
async fn test_invalid_signature_is_rejected_without_side_effects() {
    let app = TestApp::new(RuntimeEnvironment::Production);
    let bytes = serde_json::to_vec(&requested_body("i1")).unwrap();

    let (status, body) = post(app.router(), REQUESTED, &bytes, Some("deadbeef".into())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid signature");
    assert!(app.host.calls().is_empty());
    assert!(app.reporter.reports().is_empty());
}

#[tokio::test]
async fn test_missing_signature_is_rejected() {
    let app = TestApp::new(RuntimeEnvironment::Production);
    let bytes = serde_json::to_vec(&requested_body("i1")).unwrap();

    let (status, _) = post(app.router(), REQUESTED, &bytes, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.host.calls().is_empty());
}

#[tokio::test]
async fn test_development_mode_skips_verification() {
    let app = TestApp::new(RuntimeEnvironment::Development);
    let bytes = serde_json::to_vec(&requested_body("i1")).unwrap();

    let (status, _) = post(
        app.router(),
        REQUESTED,
        &bytes,
        Some("test-signature-ignored-in-dev-mode".into()),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_other_environments_still_verify() {
    let app = TestApp::new(RuntimeEnvironment::Other);
    let bytes = serde_json::to_vec(&requested_body("i1")).unwrap();

    let (status, _) = post(app.router(), REQUESTED, &bytes, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_okta_org_is_400_listing_required_fields() {
    let app = TestApp::new(RuntimeEnvironment::Production);

    let (status, body) = post_signed(
        app.router(),
        REQUESTED,
        &json!({ "component_instance_id": "i1" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");
    assert_eq!(body["missing"], json!(["okta_org"]));
    assert!(body["required"]
        .as_array()
        .unwrap()
        .contains(&json!("okta_org")));
    assert!(app.host.calls().is_empty());
    assert!(app.reporter.reports().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let app = TestApp::new(RuntimeEnvironment::Production);
    let bytes = b"{\"component_instance_id\":";
    let signature = sign(bytes, SECRET).unwrap();

    let (status, body) = post(app.router(), REQUESTED, bytes, Some(signature)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Malformed payload"));
}

#[tokio::test]
async fn test_duplicate_delivery_while_running_is_409() {
    // Never materializes, so the first run stays in flight.
    let app = TestApp::with_host(
        RuntimeEnvironment::Production,
        FakeRepositoryHost::new().materialize_after(u32::MAX),
    );

    let (first, _) = post_signed(app.router(), REQUESTED, &requested_body("dup")).await;
    let (second, body) = post_signed(app.router(), REQUESTED, &requested_body("dup")).await;
    let (other, _) = post_signed(app.router(), REQUESTED, &requested_body("other")).await;

    assert_eq!(first, StatusCode::ACCEPTED);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["component_instance_id"], "dup");
    assert_eq!(other, StatusCode::ACCEPTED);
}

// ---------------------------------------------------------------------------
// component-updated / component-deleted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_updated_is_acknowledged_only() {
    let app = TestApp::new(RuntimeEnvironment::Production);

    let (status, body) = post_signed(
        app.router(),
        UPDATED,
        &json!({ "component_instance_id": "i1", "configuration": { "repo_visibility": "public" } }),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, json!({ "status": "accepted" }));
    assert!(app.host.calls().is_empty());
}

#[tokio::test]
async fn test_updated_requires_signature() {
    let app = TestApp::new(RuntimeEnvironment::Production);

    let (status, _) = post(app.router(), UPDATED, b"{}", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleted_without_metadata_is_a_no_op() {
    let app = TestApp::new(RuntimeEnvironment::Production);

    let (status, body) =
        post_signed(app.router(), DELETED, &json!({ "component_instance_id": "i1" })).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, json!({ "status": "accepted" }));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(app.host.calls().is_empty());
    assert!(app.reporter.reports().is_empty());
}

#[tokio::test]
async fn test_deleted_with_metadata_archives_and_reports() {
    let app = TestApp::new(RuntimeEnvironment::Production);

    let (status, _) = post_signed(
        app.router(),
        DELETED,
        &json!({
            "component_instance_id": "i1",
            "metadata": { "owner": "demo-engineering-bot", "repo_name": "okta-terraform-acme" },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let reports = app
        .wait_for(|reports| matches!(reports.last(), Some(Report::Deleted { .. })))
        .await;
    assert_eq!(reports.len(), 1);
    assert!(matches!(
        app.host.calls().as_slice(),
        [HostCall::Archive { name, .. }] if name.as_str() == "okta-terraform-acme"
    ));
}
