//! Core domain for the repository provisioner.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and port trait used by the service. Infrastructure crates implement
//! the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no network I/O.
//! It defines *what* is needed; infrastructure crates define *how* to supply
//! it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`InstanceId`, `RepositoryId`, etc.) |
//! | [`types`] | Requests, repository context, secrets, outcomes |
//! | [`errors`] | Configuration error and cause-chain rendering |
//! | [`github`] | `RepositoryHost` port and `GitHubError` |
//! | [`platform`] | `StatusReporter` port and `ReportError` |
//! | [`naming`] | Repository-name sanitization |
//! | [`sealing`] | Sealed-box encryption of secret values |
//! | [`config`] | Immutable `ServiceConfig` |
//! | `testing` | In-memory port fakes (`test-support` feature) |

pub mod config;
pub mod errors;
pub mod github;
pub mod identifiers;
pub mod naming;
pub mod platform;
pub mod sealing;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{
    FeatureFlags, GitHubSettings, LogFormat, LoggingSettings, PlatformSettings,
    ProvisioningDefaults, RuntimeEnvironment, ServiceConfig, SettlePolicy,
};
pub use errors::{error_chain, BoxError, ConfigurationError};
pub use github::{GitHubError, RepositoryHost};
pub use identifiers::{
    ComponentId, DemoId, EnvironmentName, FileRevision, GitRef, InstanceId, IssueNumber, KeyId,
    OwnerLogin, RepositoryId, RepositoryName, RunId, SecretName, UserId, WorkflowId,
};
pub use platform::{ReportError, StatusReporter};
pub use sealing::SealError;
pub use types::{
    ComponentConfiguration, FileContent, FileUpdate, IssueRecord, NewIssue, NewRepository,
    OrgIdentity, ProvisioningOutcome, ProvisioningRequest, ReadyMetadata, RecipientKey,
    RepositoryRecord, SealedSecret, SecretDescriptor, SecretScope, SecretString, Timestamp,
    Visibility,
};
