//! Immutable service configuration.
//!
//! Built once by the composition root and shared by reference (`Arc`) with
//! every component. Nothing outside the `cli` crate reads process
//! environment.

use std::time::Duration;

use crate::{OwnerLogin, SecretString, Visibility};

/// Deployment mode of the running service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    Development,
    Production,
    /// Any other named environment (e.g. `staging`). Treated like production.
    Other,
}

impl RuntimeEnvironment {
    /// Matches case-sensitively: `"Development"` is not development.
    pub fn parse(value: &str) -> Self {
        match value {
            "development" => Self::Development,
            "production" => Self::Production,
            _ => Self::Other,
        }
    }

    /// Webhook signatures are checked everywhere except development.
    pub fn skips_signature_verification(self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Other => "other",
        }
    }
}

/// Demo platform endpoint and credentials.
#[derive(Debug, Clone)]
pub struct PlatformSettings {
    pub api_url: String,

    /// `None` disables status reporting entirely.
    pub api_token: Option<SecretString>,

    /// Shared secret for webhook signatures.
    pub component_secret: SecretString,
}

/// GitHub endpoint, credentials, and template coordinates.
#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub api_url: String,
    pub token: SecretString,
    pub template_owner: OwnerLogin,
    pub template_repo: String,

    /// Account that owns every provisioned repository.
    pub bot_username: OwnerLogin,
}

/// Optional provisioning behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFlags {
    pub enable_auto_import: bool,
    pub enable_collaborator_invite: bool,
    pub default_repo_visibility: Visibility,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_auto_import: false,
            enable_collaborator_invite: false,
            default_repo_visibility: Visibility::Private,
        }
    }
}

/// Bounds on waiting for a template-generated repository to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Values written into the provisioned repository.
#[derive(Debug, Clone)]
pub struct ProvisioningDefaults {
    /// Stored as the `AWS_ROLE_ARN` repository secret.
    pub aws_role_arn: SecretString,
}

impl Default for ProvisioningDefaults {
    fn default() -> Self {
        Self {
            aws_role_arn: SecretString::new("arn:aws:iam::ACCOUNT_ID:role/REPLACE_ME"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// `EnvFilter` directive (e.g. `"info"`, `"listener=debug,info"`).
    pub filter: String,
    pub format: LogFormat,

    /// OTLP collector endpoint; `None` disables span export.
    pub otlp_endpoint: Option<String>,
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub environment: RuntimeEnvironment,
    pub platform: PlatformSettings,
    pub github: GitHubSettings,
    pub features: FeatureFlags,
    pub settle: SettlePolicy,
    pub defaults: ProvisioningDefaults,
    pub logging: LoggingSettings,
}
