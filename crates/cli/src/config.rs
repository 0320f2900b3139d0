//! Builds the [`ServiceConfig`] from environment variables.
//!
//! | Env Var | Default |
//! |---------|---------|
//! | `PORT` | `3000` |
//! | `APP_ENV` / `NODE_ENV` | `production` (signatures verified) |
//! | `DEMO_PLATFORM_API_URL` | `https://api.demo.okta.com` |
//! | `DEMO_PLATFORM_API_TOKEN` | unset (status reports skipped) |
//! | `COMPONENT_SECRET` | required |
//! | `GITHUB_TOKEN` | required |
//! | `GITHUB_TEMPLATE_OWNER` | required |
//! | `GITHUB_TEMPLATE_REPO` | required |
//! | `GITHUB_BOT_USERNAME` | `demo-engineering-bot` |
//! | `GITHUB_API_URL` | `https://api.github.com` |
//! | `ENABLE_AUTO_IMPORT` | `false` |
//! | `ENABLE_COLLABORATOR_INVITE` | `false` |
//! | `DEFAULT_REPO_VISIBILITY` | `private` |
//! | `AWS_ROLE_ARN` | `arn:aws:iam::ACCOUNT_ID:role/REPLACE_ME` |
//! | `SETTLE_POLL_INTERVAL_MS` | `1000` |
//! | `SETTLE_TIMEOUT_MS` | `30000` |
//! | `RUST_LOG` / `LOG_LEVEL` | `info` |
//! | `LOG_FORMAT` | `json` in production, `pretty` otherwise |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset (no span export) |

use std::str::FromStr;
use std::time::Duration;

use provisioning::{
    ConfigurationError, FeatureFlags, GitHubSettings, LogFormat, LoggingSettings, OwnerLogin,
    PlatformSettings, ProvisioningDefaults, RuntimeEnvironment, SecretString, ServiceConfig,
    SettlePolicy, Visibility,
};

const REQUIRED: [&str; 4] = [
    "GITHUB_TOKEN",
    "GITHUB_TEMPLATE_OWNER",
    "GITHUB_TEMPLATE_REPO",
    "COMPONENT_SECRET",
];

const TOKEN_PREFIXES: [&str; 2] = ["ghp_", "github_pat_"];

/// A validated configuration plus anything worth warning about once logging
/// is up.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: ServiceConfig,
    pub warnings: Vec<String>,
}

/// Loads configuration from the process environment, after applying an
/// optional `.env` file.
pub fn load() -> Result<LoadedConfig, ConfigurationError> {
    // A missing .env file is the normal case in deployed environments.
    let _ = dotenvy::dotenv();
    load_from(|key| std::env::var(key).ok())
}

/// Loads configuration through `lookup`. Empty values count as unset.
pub fn load_from<F>(lookup: F) -> Result<LoadedConfig, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let missing: Vec<String> = REQUIRED
        .iter()
        .filter(|key| get(**key).is_none())
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ConfigurationError::Missing { missing });
    }
    let required = |key: &str| get(key).unwrap_or_default();

    let mut warnings = Vec::new();
    let token = required("GITHUB_TOKEN");
    if !TOKEN_PREFIXES.iter().any(|p| token.starts_with(p)) {
        warnings.push(
            "GITHUB_TOKEN does not appear to be a valid GitHub Personal Access Token".to_string(),
        );
    }

    // Signature checks are skipped only when development is asked for.
    let environment = get("APP_ENV")
        .or_else(|| get("NODE_ENV"))
        .map_or(RuntimeEnvironment::Production, |v| RuntimeEnvironment::parse(&v));

    let log_format = match get("LOG_FORMAT").as_deref() {
        Some("json") => LogFormat::Json,
        Some("pretty") => LogFormat::Pretty,
        Some(other) => {
            return Err(invalid("LOG_FORMAT", format!("expected json or pretty, got {other:?}")))
        }
        None if environment == RuntimeEnvironment::Production => LogFormat::Json,
        None => LogFormat::Pretty,
    };

    let config = ServiceConfig {
        port: parsed(&get, "PORT", 3000)?,
        environment,
        platform: PlatformSettings {
            api_url: get("DEMO_PLATFORM_API_URL")
                .unwrap_or_else(|| "https://api.demo.okta.com".to_string()),
            api_token: get("DEMO_PLATFORM_API_TOKEN").map(SecretString::new),
            component_secret: SecretString::new(required("COMPONENT_SECRET")),
        },
        github: GitHubSettings {
            api_url: get("GITHUB_API_URL").unwrap_or_else(|| "https://api.github.com".to_string()),
            token: SecretString::new(token),
            template_owner: owner(required("GITHUB_TEMPLATE_OWNER"), "GITHUB_TEMPLATE_OWNER")?,
            template_repo: required("GITHUB_TEMPLATE_REPO"),
            bot_username: owner(
                get("GITHUB_BOT_USERNAME").unwrap_or_else(|| "demo-engineering-bot".to_string()),
                "GITHUB_BOT_USERNAME",
            )?,
        },
        features: FeatureFlags {
            enable_auto_import: flag(&get, "ENABLE_AUTO_IMPORT"),
            enable_collaborator_invite: flag(&get, "ENABLE_COLLABORATOR_INVITE"),
            default_repo_visibility: get("DEFAULT_REPO_VISIBILITY")
                .map(|v| Visibility::parse_lenient(&v))
                .unwrap_or(Visibility::Private),
        },
        settle: SettlePolicy {
            poll_interval: Duration::from_millis(parsed(&get, "SETTLE_POLL_INTERVAL_MS", 1000)?),
            timeout: Duration::from_millis(parsed(&get, "SETTLE_TIMEOUT_MS", 30_000)?),
        },
        defaults: get("AWS_ROLE_ARN")
            .map(|arn| ProvisioningDefaults {
                aws_role_arn: SecretString::new(arn),
            })
            .unwrap_or_default(),
        logging: LoggingSettings {
            filter: get("RUST_LOG")
                .or_else(|| get("LOG_LEVEL"))
                .unwrap_or_else(|| "info".to_string()),
            format: log_format,
            otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
        },
    };

    Ok(LoadedConfig { config, warnings })
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigurationError {
    ConfigurationError::Invalid {
        key: key.to_string(),
        message: message.into(),
    }
}

fn parsed<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigurationError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e| invalid(key, format!("{e}"))),
        None => Ok(default),
    }
}

/// Only the exact string `true` enables a flag.
fn flag<G>(get: &G, key: &str) -> bool
where
    G: Fn(&str) -> Option<String>,
{
    get(key).as_deref() == Some("true")
}

fn owner(value: String, key: &str) -> Result<OwnerLogin, ConfigurationError> {
    OwnerLogin::new(value).ok_or_else(|| invalid(key, "must not be empty"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
