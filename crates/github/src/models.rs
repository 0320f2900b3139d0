//! Request and response bodies for the GitHub endpoints this crate calls.
//!
//! Only the fields the provisioner reads are declared; serde ignores the rest.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRepositoryBody<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub private: bool,
    pub include_all_branches: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnvironmentBody {
    pub wait_timer: u32,
    pub reviewers: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SecretBody<'a> {
    pub encrypted_value: &'a str,
    pub key_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateFileBody<'a> {
    pub message: &'a str,
    /// Base64-encoded file content.
    pub content: String,
    pub sha: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateIssueBody<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub labels: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct DispatchBody<'a> {
    #[serde(rename = "ref")]
    pub git_ref: &'a str,
    pub inputs: &'a serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CollaboratorBody<'a> {
    pub permission: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ArchiveBody {
    pub archived: bool,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct Account {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Repository {
    pub id: u64,
    pub name: String,
    pub html_url: String,
    pub owner: Account,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublicKey {
    pub key_id: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Contents {
    /// Base64 with embedded line breaks.
    pub content: String,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Issue {
    pub number: u64,
    pub html_url: String,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}
