//! Port: publishing job state back to the demo platform.
//!
//! The production implementation lives in the `platform` crate.

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::BoxError;
use crate::{InstanceId, ReadyMetadata};

/// Failure to deliver a status report.
///
/// Always logged and otherwise ignored by the orchestrator.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Platform API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The instance id cannot be used as a URL path segment. No request
    /// was sent.
    #[error("Cannot address component instance {instance:?}")]
    UnaddressableInstance { instance: String },

    #[error("Platform request failed")]
    Transport {
        #[source]
        source: BoxError,
    },
}

/// Status-reporting capability set.
///
/// Calls are idempotent from the caller's view: only success or failure is
/// inspected.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    /// Publishes a `provisioning` state with `percent` complete.
    async fn publish_progress(
        &self,
        instance: &InstanceId,
        percent: u8,
        message: &str,
    ) -> Result<(), ReportError>;

    /// Publishes the terminal `ready` state.
    async fn publish_ready(
        &self,
        instance: &InstanceId,
        metadata: &ReadyMetadata,
    ) -> Result<(), ReportError>;

    /// Publishes the terminal `error` state.
    async fn publish_error(
        &self,
        instance: &InstanceId,
        message: &str,
        details: &str,
    ) -> Result<(), ReportError>;

    /// Publishes the `deleted` state after a repository is archived.
    async fn publish_deleted(&self, instance: &InstanceId, message: &str)
        -> Result<(), ReportError>;
}
