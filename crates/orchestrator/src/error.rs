use std::time::Duration;

use provisioning::{error_chain, GitHubError, SealError, SecretName};
use thiserror::Error;

use crate::steps::StepId;

/// Why a single step failed.
#[derive(Debug, Error)]
pub enum StepFailure {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error("Could not seal secret {secret}")]
    Seal {
        secret: SecretName,
        #[source]
        source: SealError,
    },

    #[error("Repository did not materialize within {waited:?}")]
    SettleTimeout { waited: Duration },

    #[error("Organization name {name:?} does not yield a usable repository name")]
    UnusableOrgName { name: String },
}

/// A critical step failed and the run was aborted.
#[derive(Debug, Error)]
#[error("Step {step} failed")]
pub struct ProvisioningError {
    pub step: StepId,
    #[source]
    pub source: StepFailure,
}

impl ProvisioningError {
    pub fn new(step: StepId, source: impl Into<StepFailure>) -> Self {
        Self {
            step,
            source: source.into(),
        }
    }

    /// One-line summary published as the `error_message`.
    pub fn message(&self) -> String {
        format!("{}: {}", self.step.spec().label.trim_end_matches('.'), self.source)
    }

    /// Full cause chain published as the `error_details`.
    pub fn details(&self) -> String {
        error_chain(self)
    }
}
