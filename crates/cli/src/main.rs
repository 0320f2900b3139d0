//! Provisioner entry point.
//!
//! This binary is the composition root for the service:
//!
//! 1. **Load configuration** from the environment (and an optional `.env`
//!    file). Missing required variables abort startup with one message that
//!    lists all of them.
//! 2. **Wire observability**: `tracing-subscriber` console output plus an
//!    optional OpenTelemetry OTLP span exporter.
//! 3. **Construct infrastructure**: the GitHub REST client and the platform
//!    status client, injected into the [`orchestrator::Provisioner`].
//! 4. **Serve** the webhook listener until SIGINT or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use github::GitHubClient;
use listener::AppState;
use orchestrator::{Provisioner, ProvisionerSettings};
use platform::PlatformClient;
use provisioning::RuntimeEnvironment;

mod config;
mod observability;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loaded = config::load().context("failed to load configuration")?;
    let config = loaded.config;

    let telemetry = observability::init(&config.logging)?;
    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }

    tracing::info!(
        port = config.port,
        environment = config.environment.as_str(),
        template = %format!("{}/{}", config.github.template_owner, config.github.template_repo),
        bot_username = %config.github.bot_username,
        auto_import = config.features.enable_auto_import,
        collaborator_invite = config.features.enable_collaborator_invite,
        otlp_export = telemetry.exporting(),
        "Starting repository provisioner"
    );
    if config.environment == RuntimeEnvironment::Development {
        tracing::warn!("Running in development mode: webhook signatures are NOT verified");
    }

    let github = GitHubClient::new(&config.github).context("failed to build GitHub client")?;
    let platform = PlatformClient::new(&config.platform);
    let provisioner = Provisioner::new(
        Arc::new(github),
        Arc::new(platform),
        ProvisionerSettings::from(&config),
    );
    let state = AppState::new(&config, Arc::new(provisioner));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let socket = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let served = listener::serve(socket, state, shutdown_signal()).await;

    telemetry.shutdown();
    served.context("webhook listener failed")
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
