//! The provisioning orchestrator.
//!
//! [`Provisioner::run`] executes the step sequence in [`crate::steps`] once
//! for a request:
//!
//! ```text
//! Accepted -> Running(step) -> Ready | Error
//! ```
//!
//! Progress is published before each step and awaited in order, so reported
//! percentages strictly increase within a run. A critical failure ends the
//! run, publishes one `error` outcome and is returned to the caller; a
//! best-effort failure is logged and the run moves on. Nothing is rolled
//! back, and nothing is checkpointed: a process exit mid-run loses the job.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use provisioning::naming::repository_name_for;
use provisioning::sealing::seal_secret;
use provisioning::{
    EnvironmentName, FeatureFlags, FileUpdate, GitRef, InstanceId, NewRepository, OwnerLogin,
    ProvisioningDefaults, ProvisioningOutcome, ProvisioningRequest, ReadyMetadata,
    RepositoryHost, RepositoryName, RepositoryRecord, RunId, SecretDescriptor, SecretName,
    SecretScope, SecretString, ServiceConfig, SettlePolicy, StatusReporter, Timestamp,
    WorkflowId,
};
use tracing::Instrument;

use crate::error::{ProvisioningError, StepFailure};
use crate::readme;
use crate::setup_issue::{self, SetupIssueContext};
use crate::steps::{Criticality, StepId, DEPLOYMENT_ENVIRONMENTS};

const IMPORT_WORKFLOW: &str = "import-all-resources.yml";
const DEFAULT_BRANCH: &str = "main";
const COLLABORATOR_PERMISSION: &str = "admin";
const ARCHIVED_MESSAGE: &str = "Repository archived";

/// The slice of [`ServiceConfig`] the orchestrator acts on.
#[derive(Debug, Clone)]
pub struct ProvisionerSettings {
    /// Account that owns every provisioned repository.
    pub owner: OwnerLogin,
    pub features: FeatureFlags,
    pub settle: SettlePolicy,
    pub defaults: ProvisioningDefaults,
}

impl From<&ServiceConfig> for ProvisionerSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            owner: config.github.bot_username.clone(),
            features: config.features.clone(),
            settle: config.settle,
            defaults: config.defaults.clone(),
        }
    }
}

/// Drives a [`RepositoryHost`] and a [`StatusReporter`] through the
/// provisioning sequence.
///
/// Holds no per-run state; one instance serves every concurrent run.
pub struct Provisioner {
    host: Arc<dyn RepositoryHost>,
    reporter: Arc<dyn StatusReporter>,
    settings: ProvisionerSettings,
}

impl Provisioner {
    pub fn new(
        host: Arc<dyn RepositoryHost>,
        reporter: Arc<dyn StatusReporter>,
        settings: ProvisionerSettings,
    ) -> Self {
        Self {
            host,
            reporter,
            settings,
        }
    }

    /// Runs the full sequence for `request` and publishes its single
    /// terminal outcome.
    pub async fn run(
        &self,
        request: &ProvisioningRequest,
        run_id: RunId,
    ) -> Result<ReadyMetadata, ProvisioningError> {
        let span = tracing::info_span!(
            "provision",
            instance_id = %request.instance_id,
            run_id = %run_id,
        );

        async {
            let started = Instant::now();
            tracing::info!(org = %request.org.name, "Starting provisioning");

            let result = self.execute(request).await;

            let outcome = match &result {
                Ok(metadata) => ProvisioningOutcome::Ready(metadata.clone()),
                Err(err) => {
                    tracing::error!(step = %err.step, error = %err.details(), "Provisioning failed");
                    ProvisioningOutcome::Error {
                        message: err.message(),
                        details: err.details(),
                    }
                }
            };
            self.publish_outcome(&request.instance_id, &outcome).await;

            if let Ok(metadata) = &result {
                tracing::info!(
                    repo_url = %metadata.repo_url,
                    duration_secs = started.elapsed().as_secs_f64(),
                    "Provisioning complete"
                );
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Archives a previously provisioned repository and reports `deleted`.
    pub async fn decommission(
        &self,
        instance: &InstanceId,
        owner: &OwnerLogin,
        name: &RepositoryName,
    ) -> Result<(), provisioning::GitHubError> {
        tracing::info!(instance_id = %instance, repo = %format!("{owner}/{name}"), "Archiving repository");
        self.host.archive_repository(owner, name).await?;

        if let Err(err) = self.reporter.publish_deleted(instance, ARCHIVED_MESSAGE).await {
            tracing::warn!(instance_id = %instance, error = %err, "Failed to report deleted state");
        }
        tracing::info!(instance_id = %instance, repo = %format!("{owner}/{name}"), "Repository archived");
        Ok(())
    }

    async fn execute(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<ReadyMetadata, ProvisioningError> {
        let instance = &request.instance_id;

        let name = self
            .critical(instance, StepId::Initialize, async {
                repository_name_for(&request.org.name).ok_or_else(|| {
                    StepFailure::UnusableOrgName {
                        name: request.org.name.clone(),
                    }
                })
            })
            .await?;

        let repository = self
            .critical(
                instance,
                StepId::CreateRepository,
                self.create_repository(request, name),
            )
            .await?;

        self.critical(
            instance,
            StepId::AwaitMaterialization,
            self.await_materialization(&repository),
        )
        .await?;

        self.critical(
            instance,
            StepId::CreateEnvironments,
            self.create_environments(&repository),
        )
        .await?;
        let tenant_environment = EnvironmentName::from_static(DEPLOYMENT_ENVIRONMENTS[0]);

        self.critical(
            instance,
            StepId::RepositorySecrets,
            self.store_secrets(&repository, self.repository_secrets()),
        )
        .await?;

        self.critical(
            instance,
            StepId::EnvironmentSecrets,
            self.store_secrets(
                &repository,
                environment_secrets(request, &tenant_environment),
            ),
        )
        .await?;

        self.best_effort(
            instance,
            StepId::CustomizeReadme,
            self.customize_readme(&repository, &request.org.name),
        )
        .await;

        self.best_effort(
            instance,
            StepId::SetupIssue,
            self.create_setup_issue(&repository, request, &tenant_environment),
        )
        .await;

        if self.settings.features.enable_auto_import && request.configuration.auto_import_allowed()
        {
            self.best_effort(
                instance,
                StepId::ImportWorkflow,
                self.dispatch_import(&repository, &tenant_environment),
            )
            .await;
        }

        if self.settings.features.enable_collaborator_invite {
            if let Some(username) = request.collaborator_username() {
                self.best_effort(
                    instance,
                    StepId::InviteCollaborator,
                    self.invite_collaborator(&repository, username),
                )
                .await;
            }
        }

        Ok(ReadyMetadata {
            repo_url: repository.html_url.clone(),
            repo_name: repository.name.clone(),
            repo_id: repository.id,
            owner: repository.owner.clone(),
            created_at: Timestamp::now(),
        })
    }

    // -----------------------------------------------------------------------
    // Step policy
    // -----------------------------------------------------------------------

    async fn critical<T, F>(
        &self,
        instance: &InstanceId,
        step: StepId,
        action: F,
    ) -> Result<T, ProvisioningError>
    where
        F: Future<Output = Result<T, StepFailure>>,
    {
        debug_assert_eq!(step.spec().criticality, Criticality::Critical);
        self.enter(instance, step).await;
        action.await.map_err(|failure| ProvisioningError::new(step, failure))
    }

    async fn best_effort<T, F>(&self, instance: &InstanceId, step: StepId, action: F) -> Option<T>
    where
        F: Future<Output = Result<T, StepFailure>>,
    {
        debug_assert_eq!(step.spec().criticality, Criticality::BestEffort);
        self.enter(instance, step).await;
        match action.await {
            Ok(value) => Some(value),
            Err(failure) => {
                tracing::warn!(step = %step, error = %failure, "Best-effort step failed; continuing");
                None
            }
        }
    }

    async fn enter(&self, instance: &InstanceId, step: StepId) {
        let spec = step.spec();
        tracing::debug!(step = %step, "Entering step");
        if let Some(weight) = spec.weight {
            if let Err(err) = self
                .reporter
                .publish_progress(instance, weight, spec.label)
                .await
            {
                tracing::warn!(step = %step, error = %err, "Failed to report progress");
            }
        }
    }

    async fn publish_outcome(&self, instance: &InstanceId, outcome: &ProvisioningOutcome) {
        let result = match outcome {
            ProvisioningOutcome::Ready(metadata) => {
                self.reporter.publish_ready(instance, metadata).await
            }
            ProvisioningOutcome::Error { message, details } => {
                self.reporter.publish_error(instance, message, details).await
            }
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "Failed to report outcome");
        }
    }

    // -----------------------------------------------------------------------
    // Step actions
    // -----------------------------------------------------------------------

    async fn create_repository(
        &self,
        request: &ProvisioningRequest,
        name: RepositoryName,
    ) -> Result<RepositoryRecord, StepFailure> {
        let visibility = request
            .configuration
            .repo_visibility
            .unwrap_or(self.settings.features.default_repo_visibility);

        let repository = self
            .host
            .create_from_template(&NewRepository {
                owner: self.settings.owner.clone(),
                name,
                description: format!(
                    "Okta Terraform GitOps for {} (Demo {})",
                    request.org.name,
                    request.demo_label()
                ),
                visibility,
            })
            .await?;

        tracing::info!(repo = %repository.full_name(), url = %repository.html_url, "Repository created");
        Ok(repository)
    }

    async fn await_materialization(&self, repository: &RepositoryRecord) -> Result<(), StepFailure> {
        let SettlePolicy {
            poll_interval,
            timeout,
        } = self.settings.settle;

        let poll = async {
            loop {
                if self.host.is_materialized(repository).await? {
                    return Ok::<(), StepFailure>(());
                }
                tracing::debug!(repo = %repository.full_name(), "Repository not materialized yet");
                tokio::time::sleep(poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| StepFailure::SettleTimeout { waited: timeout })?
    }

    /// Creates every deployment environment in order, stopping at the first
    /// failure. Environments already created are left in place.
    async fn create_environments(&self, repository: &RepositoryRecord) -> Result<(), StepFailure> {
        for name in DEPLOYMENT_ENVIRONMENTS {
            let environment = EnvironmentName::from_static(name);
            self.host.create_environment(repository, &environment).await?;
            tracing::debug!(environment = %environment, "Environment created");
        }
        Ok(())
    }

    fn repository_secrets(&self) -> Vec<SecretDescriptor> {
        vec![SecretDescriptor {
            name: SecretName::from_static("AWS_ROLE_ARN"),
            value: self.settings.defaults.aws_role_arn.clone(),
            scope: SecretScope::Repository,
        }]
    }

    /// Fetches the scope's key, seals, and stores each secret in turn.
    ///
    /// The key is fetched per secret, never reused across scopes or runs.
    async fn store_secrets(
        &self,
        repository: &RepositoryRecord,
        secrets: Vec<SecretDescriptor>,
    ) -> Result<(), StepFailure> {
        for secret in secrets {
            let key = self
                .host
                .fetch_public_key(repository, &secret.scope)
                .await?;
            let sealed = seal_secret(&secret.value, &key).map_err(|source| StepFailure::Seal {
                secret: secret.name.clone(),
                source,
            })?;
            self.host
                .put_secret(repository, &secret.scope, &secret.name, &sealed)
                .await?;
            tracing::debug!(secret = %secret.name, scope = %secret.scope, "Secret stored");
        }
        Ok(())
    }

    async fn customize_readme(
        &self,
        repository: &RepositoryRecord,
        org_name: &str,
    ) -> Result<(), StepFailure> {
        let file = self.host.get_file(repository, readme::README_PATH).await?;
        let content = readme::customize(&file.content, org_name, repository.name.as_str());

        self.host
            .update_file(
                repository,
                &FileUpdate {
                    path: readme::README_PATH.to_string(),
                    content,
                    revision: file.revision,
                    commit_message: readme::commit_message(org_name),
                },
            )
            .await?;
        tracing::debug!("README customized");
        Ok(())
    }

    async fn create_setup_issue(
        &self,
        repository: &RepositoryRecord,
        request: &ProvisioningRequest,
        tenant_environment: &EnvironmentName,
    ) -> Result<(), StepFailure> {
        let issue = setup_issue::render(&SetupIssueContext {
            org_name: &request.org.name,
            demo_id: request.demo_label(),
            repo_url: &repository.html_url,
            environments: &DEPLOYMENT_ENVIRONMENTS,
            tenant_environment: tenant_environment.as_str(),
        });

        let created = self.host.create_issue(repository, &issue).await?;
        tracing::info!(issue_url = %created.html_url, "Setup issue created");
        Ok(())
    }

    async fn dispatch_import(
        &self,
        repository: &RepositoryRecord,
        tenant_environment: &EnvironmentName,
    ) -> Result<(), StepFailure> {
        let mut inputs = serde_json::Map::new();
        inputs.insert(
            "tenant_environment".into(),
            tenant_environment.as_str().into(),
        );
        inputs.insert("update_terraform".into(), "true".into());
        inputs.insert("commit_changes".into(), "true".into());

        let workflow = WorkflowId::from_static(IMPORT_WORKFLOW);
        self.host
            .dispatch_workflow(
                repository,
                &workflow,
                &GitRef::from_static(DEFAULT_BRANCH),
                &inputs,
            )
            .await?;
        tracing::info!(workflow = %workflow, "Workflow triggered");
        Ok(())
    }

    async fn invite_collaborator(
        &self,
        repository: &RepositoryRecord,
        username: &str,
    ) -> Result<(), StepFailure> {
        self.host
            .add_collaborator(repository, username, COLLABORATOR_PERMISSION)
            .await?;
        tracing::info!(username, "Collaborator added");
        Ok(())
    }
}

/// Okta secrets for the tenant environment.
fn environment_secrets(
    request: &ProvisioningRequest,
    environment: &EnvironmentName,
) -> Vec<SecretDescriptor> {
    let scope = SecretScope::Environment(environment.clone());
    [
        ("OKTA_API_TOKEN", request.org.api_token.clone()),
        ("OKTA_ORG_NAME", SecretString::new(request.org.name.clone())),
        ("OKTA_BASE_URL", SecretString::new(request.org.base_url.clone())),
    ]
    .into_iter()
    .map(|(name, value)| SecretDescriptor {
        name: SecretName::from_static(name),
        value,
        scope: scope.clone(),
    })
    .collect()
}

#[cfg(test)]
#[path = "provisioner_tests.rs"]
mod tests;
