//! Cross-cutting error types for the provisioning domain.
//!
//! Component-level errors live next to the port that produces them:
//! [`crate::github::GitHubError`], [`crate::platform::ReportError`], and
//! [`crate::sealing::SealError`]. This module holds the configuration error
//! and the helper that renders an error's cause chain for diagnostics.

use thiserror::Error;

/// Boxed error used as the `source` of infrastructure failures, so port
/// errors can carry a transport cause without this crate depending on the
/// transport library.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The service configuration is invalid.
///
/// Produced at startup; the service never starts with an invalid config.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// One or more required settings were not provided.
    #[error("Missing required environment variables: {}", missing.join(", "))]
    Missing {
        /// Every missing key, in declaration order.
        missing: Vec<String>,
    },

    /// A setting was present but could not be parsed.
    #[error("Invalid value for {key}: {message}")]
    Invalid {
        /// The offending key.
        key: String,
        /// What was wrong with it.
        message: String,
    },
}

/// Renders `err` followed by every error in its `source()` chain, one per line.
///
/// This is the diagnostic detail attached to an `error` status report, the
/// closest equivalent of a stack trace for a `Result`-based failure.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        current = cause.source();
    }
    out
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
