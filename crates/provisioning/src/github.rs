//! Port: the repository-hosting capabilities the orchestrator drives.
//!
//! The production implementation lives in the `github` crate. Each method is
//! a single remote round trip with no retry; the orchestrator decides per
//! step whether a failure is fatal or ignored.

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::BoxError;
use crate::{
    EnvironmentName, FileContent, FileUpdate, GitRef, IssueRecord, NewIssue, NewRepository,
    OwnerLogin, RecipientKey, RepositoryName, RepositoryRecord, SealedSecret, SecretName,
    SecretScope, WorkflowId,
};

/// Failure of a single repository-host call.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The requested resource does not exist (HTTP 404).
    #[error("GitHub resource not found: {resource}")]
    NotFound {
        /// Human-readable description of what was requested.
        resource: String,
    },

    /// GitHub answered with a non-success status.
    #[error("GitHub API returned {status} for {operation}: {message}")]
    Api {
        /// The operation being attempted (e.g. `"create environment"`).
        operation: String,
        /// HTTP status code.
        status: u16,
        /// `message` field of the error body, or the raw body.
        message: String,
    },

    /// The request never produced a response.
    #[error("GitHub request failed for {operation}")]
    Transport {
        operation: String,
        #[source]
        source: BoxError,
    },

    /// A URL path segment taken from request data was empty or a dot
    /// segment. No request was sent.
    #[error("Refusing to address GitHub with path segment {segment:?}")]
    UnsafePathSegment { segment: String },

    /// The response could not be interpreted.
    #[error("Unexpected GitHub response for {operation}: {message}")]
    InvalidResponse { operation: String, message: String },
}

impl GitHubError {
    /// Returns `true` for [`GitHubError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Repository provisioning capability set.
///
/// Implementations must be safe to share across concurrently running
/// provisioning jobs.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Generates a new repository from the configured template.
    async fn create_from_template(
        &self,
        repository: &NewRepository,
    ) -> Result<RepositoryRecord, GitHubError>;

    /// Returns `true` once the generated repository has content on its
    /// default branch.
    async fn is_materialized(&self, repository: &RepositoryRecord) -> Result<bool, GitHubError>;

    /// Creates the environment, or updates it if it already exists.
    async fn create_environment(
        &self,
        repository: &RepositoryRecord,
        environment: &EnvironmentName,
    ) -> Result<(), GitHubError>;

    /// Fetches the public key secrets in `scope` must be sealed under.
    ///
    /// Keys differ per scope and may rotate; callers must not cache them.
    async fn fetch_public_key(
        &self,
        repository: &RepositoryRecord,
        scope: &SecretScope,
    ) -> Result<RecipientKey, GitHubError>;

    /// Creates or replaces a secret in `scope`.
    async fn put_secret(
        &self,
        repository: &RepositoryRecord,
        scope: &SecretScope,
        name: &SecretName,
        secret: &SealedSecret,
    ) -> Result<(), GitHubError>;

    /// Reads a file from the default branch.
    async fn get_file(
        &self,
        repository: &RepositoryRecord,
        path: &str,
    ) -> Result<FileContent, GitHubError>;

    /// Commits new content for an existing file.
    async fn update_file(
        &self,
        repository: &RepositoryRecord,
        update: &FileUpdate,
    ) -> Result<(), GitHubError>;

    async fn create_issue(
        &self,
        repository: &RepositoryRecord,
        issue: &NewIssue,
    ) -> Result<IssueRecord, GitHubError>;

    /// Triggers a `workflow_dispatch` run.
    async fn dispatch_workflow(
        &self,
        repository: &RepositoryRecord,
        workflow: &WorkflowId,
        git_ref: &GitRef,
        inputs: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), GitHubError>;

    /// Invites `username` with the given permission (e.g. `"admin"`).
    async fn add_collaborator(
        &self,
        repository: &RepositoryRecord,
        username: &str,
        permission: &str,
    ) -> Result<(), GitHubError>;

    /// Marks a repository archived. Addressed by name since the caller may
    /// only hold the metadata published at `ready` time.
    async fn archive_repository(
        &self,
        owner: &OwnerLogin,
        name: &RepositoryName,
    ) -> Result<(), GitHubError>;
}
