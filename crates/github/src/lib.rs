//! Provisioner GitHub adapter.
//!
//! Implements [`provisioning::RepositoryHost`] against the GitHub REST API
//! with a personal access token, using [`reqwest`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. URL layout,
//! authentication headers, and response decoding are handled here; the
//! orchestrator never sees them.
//!
//! Every method is one request with no retry. Non-success statuses are mapped
//! onto [`provisioning::GitHubError`]: 404 becomes `NotFound`, everything else
//! becomes `Api` carrying GitHub's `message` field.

mod client;
mod models;

pub use client::GitHubClient;
