//! Inbound event bodies and their validation.
//!
//! Every field is optional at the serde level so that a missing field is
//! reported as a validation failure naming it, not as a parse error.

use provisioning::naming::repository_name_for;
use provisioning::{
    ComponentConfiguration, ComponentId, DemoId, InstanceId, OrgIdentity, OwnerLogin, ProvisioningRequest,
    RepositoryName, SecretString, UserId,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::error::IngressError;

const REQUESTED_FIELDS: &[&str] = &["component_instance_id", "okta_org"];
const ORG_FIELDS: &[&str] = &["okta_org.name", "okta_org.api_token"];
const INSTANCE_FIELDS: &[&str] = &["component_instance_id"];

/// Accepts an identifier sent as a JSON string or number.
///
/// `null` and any other JSON type read as absent.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Parses a JSON body into `T`.
pub fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, IngressError> {
    serde_json::from_slice(body).map_err(|e| IngressError::MalformedPayload(e.to_string()))
}

/// `component-requested` body.
#[derive(Debug, Deserialize)]
pub struct ComponentRequested {
    #[serde(default, deserialize_with = "string_or_number")]
    pub demo_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub component_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub component_instance_id: Option<String>,
    #[serde(default)]
    pub configuration: serde_json::Value,
    pub okta_org: Option<OktaOrg>,
}

#[derive(Debug, Deserialize)]
pub struct OktaOrg {
    pub name: Option<String>,
    pub api_token: Option<String>,
    pub base_url: Option<String>,
}

impl ComponentRequested {
    /// Validates the body and converts it into an immutable request.
    pub fn into_request(self) -> Result<ProvisioningRequest, IngressError> {
        let instance_id = self.component_instance_id.and_then(InstanceId::new);
        let (instance_id, org) = match (instance_id, self.okta_org) {
            (Some(instance_id), Some(org)) => (instance_id, org),
            (instance_id, org) => {
                return Err(missing_fields(
                    REQUESTED_FIELDS,
                    [instance_id.is_none(), org.is_none()],
                ))
            }
        };

        let (name, api_token) = match (non_empty(org.name), non_empty(org.api_token)) {
            (Some(name), Some(api_token)) => (name, api_token),
            (name, api_token) => {
                return Err(missing_fields(ORG_FIELDS, [name.is_none(), api_token.is_none()]))
            }
        };

        if repository_name_for(&name).is_none() {
            return Err(IngressError::UnusableOrgName { name });
        }

        Ok(ProvisioningRequest {
            instance_id,
            demo_id: self.demo_id.and_then(DemoId::new),
            user_id: self.user_id.and_then(UserId::new),
            component_id: self.component_id.and_then(ComponentId::new),
            user_email: non_empty(self.user_email),
            org: OrgIdentity {
                name,
                api_token: SecretString::new(api_token),
                base_url: non_empty(org.base_url)
                    .unwrap_or_else(|| OrgIdentity::DEFAULT_BASE_URL.to_string()),
            },
            configuration: ComponentConfiguration::from_json(&self.configuration),
        })
    }
}

/// `component-updated` body. Acknowledged and logged only.
#[derive(Debug, Deserialize)]
pub struct ComponentUpdated {
    #[serde(default, deserialize_with = "string_or_number")]
    pub component_instance_id: Option<String>,
    #[serde(default)]
    pub configuration: serde_json::Value,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// `component-deleted` body.
#[derive(Debug, Deserialize)]
pub struct ComponentDeleted {
    #[serde(default, deserialize_with = "string_or_number")]
    pub component_instance_id: Option<String>,
    pub metadata: Option<DeletedMetadata>,
}

/// Repository coordinates published with the earlier `ready` report.
#[derive(Debug, Deserialize)]
pub struct DeletedMetadata {
    pub owner: Option<String>,
    pub repo_name: Option<String>,
}

/// What a `component-deleted` event asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decommission {
    Archive {
        instance: InstanceId,
        owner: OwnerLogin,
        name: RepositoryName,
    },
    /// No repository coordinates were supplied; nothing to clean up.
    NoMetadata { instance: InstanceId },
}

impl ComponentDeleted {
    pub fn into_decommission(self) -> Result<Decommission, IngressError> {
        let instance = self
            .component_instance_id
            .and_then(InstanceId::new)
            .ok_or_else(|| missing_fields(INSTANCE_FIELDS, [true]))?;

        let coordinates = self.metadata.and_then(|m| {
            Some((
                m.owner.and_then(OwnerLogin::new)?,
                m.repo_name.and_then(RepositoryName::new)?,
            ))
        });

        Ok(match coordinates {
            Some((owner, name)) => Decommission::Archive {
                instance,
                owner,
                name,
            },
            None => Decommission::NoMetadata { instance },
        })
    }
}

/// Builds a [`IngressError::MissingFields`] from per-field absence flags.
fn missing_fields<const N: usize>(
    required: &'static [&'static str],
    absent: [bool; N],
) -> IngressError {
    IngressError::MissingFields {
        missing: required
            .iter()
            .zip(absent)
            .filter_map(|(field, absent)| absent.then_some(*field))
            .collect(),
        required,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
