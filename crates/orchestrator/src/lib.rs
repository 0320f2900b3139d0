//! Provisioning orchestration.
//!
//! Takes an accepted [`provisioning::ProvisioningRequest`] through the fixed
//! step sequence against the [`provisioning::RepositoryHost`] and
//! [`provisioning::StatusReporter`] ports, publishing progress along the way
//! and exactly one terminal outcome at the end.
//!
//! ## Architectural Layer
//!
//! **Orchestration.** Depends only on the `provisioning` domain crate; the
//! concrete GitHub and platform adapters are injected by the binary.

pub mod error;
pub mod in_flight;
pub mod provisioner;
pub mod readme;
pub mod setup_issue;
pub mod steps;

pub use error::{ProvisioningError, StepFailure};
pub use in_flight::{InFlightGuard, InFlightRegistry};
pub use provisioner::{Provisioner, ProvisionerSettings};
pub use steps::{Criticality, StepId, StepSpec, DEPLOYMENT_ENVIRONMENTS, STEPS};
