//! Provisioner demo-platform adapter.
//!
//! Implements [`provisioning::StatusReporter`] by PATCHing the component
//! instance resource on the demo platform:
//!
//! ```text
//! PATCH {api_url}/api/v1/component-instances/{instance_id}
//! Authorization: Bearer {token}
//! { "state": "provisioning" | "ready" | "error" | "deleted", ... }
//! ```
//!
//! When no API token is configured every report is skipped with a warning
//! and counts as delivered. Reports are never retried or queued.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.

mod client;

pub use client::PlatformClient;
