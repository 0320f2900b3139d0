use async_trait::async_trait;
use provisioning::{
    InstanceId, PlatformSettings, ReadyMetadata, ReportError, SecretString, StatusReporter,
};
use reqwest::Url;
use serde::Serialize;

const READY_MESSAGE: &str = "Repository configured successfully";

/// Body of a component-instance PATCH. Absent fields are omitted.
#[derive(Debug, Default, Serialize)]
struct StatusUpdate<'a> {
    state: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a ReadyMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_details: Option<&'a str>,
}

/// HTTP client for the demo platform's component-instance API.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    api_url: String,
    api_token: Option<SecretString>,
}

impl PlatformClient {
    pub fn new(settings: &PlatformSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(http: reqwest::Client, settings: &PlatformSettings) -> Self {
        if settings.api_token.is_none() {
            tracing::warn!("No platform API token configured; status reports will be skipped");
        }
        Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            api_token: settings.api_token.clone(),
        }
    }

    /// `{api_url}/api/v1/component-instances/{instance}`, with the instance id
    /// percent-encoded as a single path segment.
    fn instance_url(&self, instance: &InstanceId) -> Result<Url, ReportError> {
        let unaddressable = || ReportError::UnaddressableInstance {
            instance: instance.to_string(),
        };
        if matches!(instance.as_str(), "." | "..") {
            return Err(unaddressable());
        }

        let mut url = Url::parse(&self.api_url).map_err(|e| ReportError::Transport {
            source: Box::new(e),
        })?;
        url.path_segments_mut()
            .map_err(|()| unaddressable())?
            .pop_if_empty()
            .extend(["api", "v1", "component-instances", instance.as_str()]);
        Ok(url)
    }

    async fn patch(&self, instance: &InstanceId, update: &StatusUpdate<'_>) -> Result<(), ReportError> {
        let Some(token) = &self.api_token else {
            tracing::warn!(
                instance_id = %instance,
                state = update.state,
                "No platform API token; skipping status report"
            );
            return Ok(());
        };

        let url = self.instance_url(instance)?;
        let response = self
            .http
            .patch(url)
            .bearer_auth(token.expose())
            .json(update)
            .send()
            .await
            .map_err(|e| ReportError::Transport {
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ReportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            instance_id = %instance,
            state = update.state,
            progress = update.progress,
            "Status reported"
        );
        Ok(())
    }
}

#[async_trait]
impl StatusReporter for PlatformClient {
    async fn publish_progress(
        &self,
        instance: &InstanceId,
        percent: u8,
        message: &str,
    ) -> Result<(), ReportError> {
        self.patch(
            instance,
            &StatusUpdate {
                state: "provisioning",
                progress: Some(percent),
                message: Some(message),
                ..StatusUpdate::default()
            },
        )
        .await
    }

    async fn publish_ready(
        &self,
        instance: &InstanceId,
        metadata: &ReadyMetadata,
    ) -> Result<(), ReportError> {
        self.patch(
            instance,
            &StatusUpdate {
                state: "ready",
                progress: Some(100),
                message: Some(READY_MESSAGE),
                metadata: Some(metadata),
                ..StatusUpdate::default()
            },
        )
        .await
    }

    async fn publish_error(
        &self,
        instance: &InstanceId,
        message: &str,
        details: &str,
    ) -> Result<(), ReportError> {
        self.patch(
            instance,
            &StatusUpdate {
                state: "error",
                progress: Some(0),
                error_message: Some(message),
                error_details: Some(details),
                ..StatusUpdate::default()
            },
        )
        .await
    }

    async fn publish_deleted(&self, instance: &InstanceId, message: &str) -> Result<(), ReportError> {
        self.patch(
            instance,
            &StatusUpdate {
                state: "deleted",
                message: Some(message),
                ..StatusUpdate::default()
            },
        )
        .await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
