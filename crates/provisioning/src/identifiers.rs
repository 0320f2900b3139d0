//! Newtype domain identifiers.
//!
//! Every concept that has an identity is a distinct newtype wrapping a
//! primitive, so an [`InstanceId`] cannot be passed where a [`DemoId`] is
//! expected even though both are strings on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, from_static(), as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Creates an identifier from a compile-time constant.
            pub fn from_static(value: &'static str) -> Self {
                debug_assert!(!value.is_empty(), "identifier constants must be non-empty");
                Self(value.to_string())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (GitHub-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: GitHub-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// Numeric repository id assigned by GitHub.
    ///
    /// Environment-scoped secret endpoints address repositories by this id
    /// rather than by `owner/name`.
    RepositoryId
}

u64_id! {
    /// Issue number within a repository.
    IssueNumber
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single orchestrator run.
///
/// Generated fresh for every accepted request and attached to the run's span
/// so all log lines from one run can be correlated even when the platform
/// re-delivers the same [`InstanceId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (platform-assigned)
// ---------------------------------------------------------------------------

string_id! {
    /// Platform-supplied component instance id.
    ///
    /// The correlation key for every progress and outcome report.
    InstanceId
}

string_id! {
    /// Demo the component instance belongs to.
    DemoId
}

string_id! {
    /// Platform user that requested the component.
    UserId
}

string_id! {
    /// Platform component type id.
    ComponentId
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (GitHub names)
// ---------------------------------------------------------------------------

string_id! {
    /// A GitHub user or organisation login that owns repositories.
    OwnerLogin
}

string_id! {
    /// Name of a repository within its owner (no `owner/` prefix).
    RepositoryName
}

string_id! {
    /// A deployment environment name within a repository.
    EnvironmentName
}

string_id! {
    /// Name of an Actions secret (e.g. `"OKTA_API_TOKEN"`).
    SecretName
}

string_id! {
    /// Identifier of the public key a secret was sealed under.
    ///
    /// Sent back with the ciphertext so GitHub knows which private key opens it.
    KeyId
}

string_id! {
    /// Workflow file name or numeric id as a string (e.g. `"import-all-resources.yml"`).
    WorkflowId
}

string_id! {
    /// Git blob SHA of a file, used as the optimistic-concurrency token on update.
    FileRevision
}

string_id! {
    /// A Git ref (branch or tag name) such as `"main"`.
    GitRef
}
