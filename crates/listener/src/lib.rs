//! Provisioner webhook receiver.
//!
//! Receives component lifecycle events from the demo platform over HTTP,
//! authenticates them with the shared-secret HMAC signature, validates their
//! bodies, and hands accepted requests to the [`orchestrator::Provisioner`]
//! on a detached task.
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `POST /webhooks/component-requested` | 202, then provision in the background |
//! | `POST /webhooks/component-updated` | 202, logged only |
//! | `POST /webhooks/component-deleted` | 202, then archive in the background |
//! | `GET /health` | Liveness JSON |
//! | anything else | 404 JSON |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** No domain rules live here beyond request validation.

use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod payload;
pub mod signature;
pub mod state;

pub use error::IngressError;
pub use state::AppState;

/// Largest accepted request body.
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Build the router with all routes and layers.
///
/// Used by [`serve`] and available for integration testing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/webhooks/component-requested",
            post(handlers::component_requested),
        )
        .route(
            "/webhooks/component-updated",
            post(handlers::component_updated),
        )
        .route(
            "/webhooks/component-deleted",
            post(handlers::component_deleted),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the router on a pre-bound listener until `shutdown` resolves.
///
/// In-flight HTTP requests are drained before returning; detached
/// provisioning tasks are not awaited.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Webhook listener started");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Webhook listener stopped");
    Ok(())
}
