//! Shared value types for the provisioning domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! structured values with invariants and flow between the listener, the
//! orchestrator, and the infrastructure adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    ComponentId, DemoId, EnvironmentName, FileRevision, InstanceId, IssueNumber, KeyId, OwnerLogin,
    RepositoryId, RepositoryName, SecretName, UserId,
};

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// A credential or other sensitive string.
///
/// `Debug` and `Display` are redacted so the value never reaches a log line
/// by accident. Call [`SecretString::expose`] at the single point of use.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wraps a sensitive value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the wrapped value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the wrapped value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(\"[REDACTED]\")")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Identity of the Okta tenant a repository is being provisioned for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgIdentity {
    /// Display name of the org. Never used as a path segment without
    /// passing through [`crate::naming::sanitize`].
    pub name: String,

    /// Okta management API token, stored as an environment secret.
    pub api_token: SecretString,

    /// Okta base domain (e.g. `"okta.com"`, `"oktapreview.com"`).
    pub base_url: String,
}

impl OrgIdentity {
    /// Base domain used when the platform does not supply one.
    pub const DEFAULT_BASE_URL: &'static str = "okta.com";
}

/// Repository visibility on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// Parses a visibility string. Anything other than `"public"` is private.
    pub fn parse_lenient(value: &str) -> Self {
        if value.eq_ignore_ascii_case("public") {
            Self::Public
        } else {
            Self::Private
        }
    }

    pub fn is_private(self) -> bool {
        matches!(self, Self::Private)
    }
}

/// Per-request options carried in the platform's free-form `configuration`
/// object.
///
/// Only the keys the orchestrator acts on are read; anything else is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentConfiguration {
    /// `repo_visibility`; `None` defers to the configured default.
    pub repo_visibility: Option<Visibility>,

    /// `auto_import`; only an explicit `false` suppresses the import dispatch.
    pub auto_import: Option<bool>,
}

impl ComponentConfiguration {
    /// Extracts the recognised keys from a JSON value.
    ///
    /// Non-object values yield the default configuration.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };

        Self {
            repo_visibility: map
                .get("repo_visibility")
                .and_then(|v| v.as_str())
                .map(Visibility::parse_lenient),
            auto_import: map.get("auto_import").and_then(|v| v.as_bool()),
        }
    }

    /// Returns `true` unless the request explicitly opted out of auto-import.
    pub fn auto_import_allowed(&self) -> bool {
        self.auto_import != Some(false)
    }
}

/// An accepted request to provision one repository.
///
/// Immutable once constructed by the listener.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    pub instance_id: InstanceId,
    pub demo_id: Option<DemoId>,
    pub user_id: Option<UserId>,
    pub component_id: Option<ComponentId>,
    pub user_email: Option<String>,
    pub org: OrgIdentity,
    pub configuration: ComponentConfiguration,
}

impl ProvisioningRequest {
    /// Guesses a GitHub username from the local-part of the requester's email.
    ///
    /// This is a heuristic: it is right only when the requester's GitHub login
    /// matches their email local-part. Local-parts that cannot be a GitHub
    /// login (anything but ASCII alphanumerics and `-`) yield `None`.
    pub fn collaborator_username(&self) -> Option<&str> {
        let email = self.user_email.as_deref()?;
        let local = email.split('@').next()?.trim();
        let is_login = !local.is_empty()
            && local.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        is_login.then_some(local)
    }

    /// Demo id for display, or `"unknown"` when the platform omitted it.
    pub fn demo_label(&self) -> &str {
        self.demo_id.as_ref().map_or("unknown", |d| d.as_str())
    }
}

// ---------------------------------------------------------------------------
// Repository context
// ---------------------------------------------------------------------------

/// A repository created by the first step, threaded read-only through the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub id: RepositoryId,
    pub html_url: String,
    pub owner: OwnerLogin,
    pub name: RepositoryName,
}

impl RepositoryRecord {
    /// `owner/name` form used in log fields.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Parameters for generating a repository from the configured template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    pub owner: OwnerLogin,
    pub name: RepositoryName,
    pub description: String,
    pub visibility: Visibility,
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Where an Actions secret is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SecretScope {
    Repository,
    Environment(EnvironmentName),
}

impl std::fmt::Display for SecretScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repository => f.write_str("repository"),
            Self::Environment(env) => write!(f, "environment:{env}"),
        }
    }
}

/// A secret to be sealed and stored. Never persisted.
#[derive(Debug, Clone)]
pub struct SecretDescriptor {
    pub name: SecretName,
    pub value: SecretString,
    pub scope: SecretScope,
}

/// A recipient public key fetched for one secret scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientKey {
    pub key_id: KeyId,

    /// Base64-encoded 32-byte X25519 public key.
    pub key: String,
}

/// Ciphertext ready for transmission, paired with the key it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    pub encrypted_value: String,
    pub key_id: KeyId,
}

// ---------------------------------------------------------------------------
// Files and issues
// ---------------------------------------------------------------------------

/// Decoded file content plus the revision needed to update it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub content: String,
    pub revision: FileRevision,
}

/// A change to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpdate {
    pub path: String,
    pub content: String,
    pub revision: FileRevision,
    pub commit_message: String,
}

/// Issue creation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub number: IssueNumber,
    pub html_url: String,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Repository metadata published with the `ready` state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyMetadata {
    pub repo_url: String,
    pub repo_name: RepositoryName,
    pub repo_id: RepositoryId,
    pub owner: OwnerLogin,
    pub created_at: Timestamp,
}

/// Terminal value of one orchestrator run. Exactly one is produced per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    Ready(ReadyMetadata),
    Error { message: String, details: String },
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
