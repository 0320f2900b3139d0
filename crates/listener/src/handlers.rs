//! Route handlers.
//!
//! Lifecycle routes authenticate the raw body first, validate it second, and
//! only then start work. Work runs on a detached task; the HTTP response is
//! sent before the first remote call is made.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::error::IngressError;
use crate::payload::{self, ComponentDeleted, ComponentRequested, ComponentUpdated, Decommission};
use crate::signature::{self, SIGNATURE_HEADER};
use crate::state::AppState;

const SERVICE_NAME: &str = "okta-terraform-webhook-handler";
const ESTIMATED_TIME: &str = "60 seconds";

type Accepted = (StatusCode, Json<Value>);

fn accepted(body: Value) -> Accepted {
    (StatusCode::ACCEPTED, Json(body))
}

/// Rejects the request unless it carries a valid signature. Skipped only in
/// development.
fn authenticate(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), IngressError> {
    if state.environment.skips_signature_verification() {
        tracing::warn!("Development mode: skipping signature verification");
        return Ok(());
    }

    let presented = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if signature::verify(body, presented, state.component_secret.expose()) {
        Ok(())
    } else {
        tracing::error!(signature_present = presented.is_some(), "Invalid webhook signature");
        Err(IngressError::InvalidSignature)
    }
}

/// `POST /webhooks/component-requested`
pub async fn component_requested(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Accepted, IngressError> {
    tracing::info!("Received component-requested webhook");
    authenticate(&state, &headers, &body)?;

    let request = payload::parse::<ComponentRequested>(&body)?
        .into_request()
        .inspect_err(|err| tracing::error!(error = %err, "Rejected component-requested payload"))?;

    let guard = state.in_flight.try_admit(&request.instance_id).ok_or_else(|| {
        IngressError::AlreadyInProgress {
            instance: request.instance_id.clone(),
        }
    })?;

    tracing::info!(
        instance_id = %request.instance_id,
        demo_id = request.demo_label(),
        component_id = request.component_id.as_ref().map(|c| c.as_str()),
        org = %request.org.name,
        run_id = %guard.run_id(),
        "Component instance requested"
    );

    let ack = json!({
        "status": "accepted",
        "message": "Provisioning started",
        "component_instance_id": request.instance_id,
        "estimated_time": ESTIMATED_TIME,
    });

    let provisioner = Arc::clone(&state.provisioner);
    tokio::spawn(async move {
        // The outcome is published and logged by the provisioner itself.
        let _ = provisioner.run(&request, guard.run_id()).await;
        drop(guard);
    });

    Ok(accepted(ack))
}

/// `POST /webhooks/component-updated`
///
/// Acknowledged and logged; configuration changes are not applied.
pub async fn component_updated(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Accepted, IngressError> {
    tracing::info!("Received component-updated webhook");
    authenticate(&state, &headers, &body)?;

    let update = payload::parse::<ComponentUpdated>(&body)?;
    tracing::info!(
        instance_id = update.component_instance_id.as_deref().unwrap_or("unknown"),
        configuration = %update.configuration,
        "Component configuration updated"
    );

    Ok(accepted(json!({ "status": "accepted" })))
}

/// `POST /webhooks/component-deleted`
pub async fn component_deleted(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Accepted, IngressError> {
    tracing::info!("Received component-deleted webhook");
    authenticate(&state, &headers, &body)?;

    match payload::parse::<ComponentDeleted>(&body)?.into_decommission()? {
        Decommission::NoMetadata { instance } => {
            tracing::warn!(instance_id = %instance, "No repo metadata found, skipping cleanup");
        }
        Decommission::Archive {
            instance,
            owner,
            name,
        } => {
            let provisioner = Arc::clone(&state.provisioner);
            tokio::spawn(async move {
                if let Err(err) = provisioner.decommission(&instance, &owner, &name).await {
                    tracing::error!(
                        instance_id = %instance,
                        repo = %format!("{owner}/{name}"),
                        error = %err,
                        "Failed to archive repository"
                    );
                }
            });
        }
    }

    Ok(accepted(json!({ "status": "accepted" })))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Not found", "path": uri.path() })),
    )
}
