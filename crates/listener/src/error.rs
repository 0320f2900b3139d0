use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use provisioning::InstanceId;
use serde_json::json;
use thiserror::Error;

/// Why an inbound event was rejected before any work started.
#[derive(Debug, Error)]
pub enum IngressError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Missing required fields: {}", missing.join(", "))]
    MissingFields {
        missing: Vec<&'static str>,
        required: &'static [&'static str],
    },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Organization name {name:?} does not yield a usable repository name")]
    UnusableOrgName { name: String },

    #[error("Provisioning already in progress for {instance}")]
    AlreadyInProgress { instance: InstanceId },
}

impl IngressError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::MissingFields { .. } | Self::MalformedPayload(_) | Self::UnusableOrgName { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::AlreadyInProgress { .. } => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::MissingFields { missing, required } => json!({
                "error": "Missing required fields",
                "missing": missing,
                "required": required,
            }),
            Self::AlreadyInProgress { instance } => json!({
                "error": "Provisioning already in progress",
                "component_instance_id": instance,
            }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
