//! In-memory implementations of the port traits for tests.
//!
//! Enabled for this crate's own tests and, via the `test-support` feature,
//! for downstream crates' tests. Both fakes record every call in order so
//! tests can assert on the exact sequence the orchestrator produced.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crypto_box::aead::OsRng;
use crypto_box::SecretKey;

use crate::github::{GitHubError, RepositoryHost};
use crate::platform::{ReportError, StatusReporter};
use crate::{
    EnvironmentName, FileContent, FileRevision, FileUpdate, GitRef, InstanceId, IssueNumber,
    IssueRecord, KeyId, NewIssue, NewRepository, OwnerLogin, ReadyMetadata, RecipientKey,
    RepositoryId, RepositoryName, RepositoryRecord, SealedSecret, SecretName, SecretScope,
    WorkflowId,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Repository host
// ---------------------------------------------------------------------------

/// One call received by [`FakeRepositoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    CreateRepository(NewRepository),
    IsMaterialized,
    CreateEnvironment(EnvironmentName),
    FetchPublicKey(SecretScope),
    PutSecret {
        scope: SecretScope,
        name: SecretName,
        secret: SealedSecret,
    },
    GetFile(String),
    UpdateFile(FileUpdate),
    CreateIssue(NewIssue),
    DispatchWorkflow {
        workflow: WorkflowId,
        git_ref: GitRef,
        inputs: serde_json::Map<String, serde_json::Value>,
    },
    AddCollaborator {
        username: String,
        permission: String,
    },
    Archive {
        owner: OwnerLogin,
        name: RepositoryName,
    },
}

type FailureRule = Box<dyn Fn(&HostCall) -> Option<GitHubError> + Send + Sync>;

/// A [`RepositoryHost`] that keeps everything in memory.
///
/// Secrets are sealed under a real key pair held by the fake, so tests can
/// open what the orchestrator stored with [`FakeRepositoryHost::open`].
pub struct FakeRepositoryHost {
    calls: Mutex<Vec<HostCall>>,
    rules: Vec<FailureRule>,
    files: Mutex<HashMap<String, FileContent>>,
    polls_until_materialized: Mutex<u32>,
    secret_key: SecretKey,
}

impl Default for FakeRepositoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRepositoryHost {
    /// Repository id assigned to every created repository.
    pub const REPOSITORY_ID: u64 = 424_242;

    /// A host with a template `README.md` and an immediately materialized
    /// repository.
    pub fn new() -> Self {
        let mut files = HashMap::new();
        files.insert(
            "README.md".to_string(),
            FileContent {
                content: "# okta-terraform-demo-template\n\nDemo for MyOrg in demo-myorg.\n"
                    .to_string(),
                revision: FileRevision::from_static("readme-sha-1"),
            },
        );

        Self {
            calls: Mutex::new(Vec::new()),
            rules: Vec::new(),
            files: Mutex::new(files),
            polls_until_materialized: Mutex::new(0),
            secret_key: SecretKey::generate(&mut OsRng),
        }
    }

    /// Fails every call for which `rule` returns an error.
    pub fn fail_when<F>(mut self, rule: F) -> Self
    where
        F: Fn(&HostCall) -> Option<GitHubError> + Send + Sync + 'static,
    {
        self.rules.push(Box::new(rule));
        self
    }

    /// Fails creation of the named environment.
    pub fn fail_environment(self, name: &str) -> Self {
        let name = name.to_string();
        self.fail_when(move |call| match call {
            HostCall::CreateEnvironment(env) if env.as_str() == name => Some(GitHubError::Api {
                operation: "create environment".into(),
                status: 422,
                message: format!("environment {name} rejected"),
            }),
            _ => None,
        })
    }

    /// Answers `false` to the first `polls` materialization checks.
    pub fn materialize_after(self, polls: u32) -> Self {
        *lock(&self.polls_until_materialized) = polls;
        self
    }

    /// Removes a file so `get_file` answers not-found.
    pub fn without_file(self, path: &str) -> Self {
        lock(&self.files).remove(path);
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<HostCall> {
        lock(&self.calls).clone()
    }

    /// Current content of a file, if present.
    pub fn file(&self, path: &str) -> Option<String> {
        lock(&self.files).get(path).map(|f| f.content.clone())
    }

    /// Decrypts a sealed secret stored through this host.
    pub fn open(&self, secret: &SealedSecret) -> Option<String> {
        let ciphertext = STANDARD.decode(&secret.encrypted_value).ok()?;
        let plaintext = self.secret_key.unseal(&ciphertext).ok()?;
        String::from_utf8(plaintext).ok()
    }

    fn record(&self, call: HostCall) -> Result<(), GitHubError> {
        let failure = self.rules.iter().find_map(|rule| rule(&call));
        lock(&self.calls).push(call);
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn public_key(&self) -> RecipientKey {
        RecipientKey {
            key_id: KeyId::from_static("fake-key-1"),
            key: STANDARD.encode(self.secret_key.public_key().as_bytes()),
        }
    }
}

#[async_trait]
impl RepositoryHost for FakeRepositoryHost {
    async fn create_from_template(
        &self,
        repository: &NewRepository,
    ) -> Result<RepositoryRecord, GitHubError> {
        self.record(HostCall::CreateRepository(repository.clone()))?;
        Ok(RepositoryRecord {
            id: RepositoryId::new(Self::REPOSITORY_ID),
            html_url: format!(
                "https://github.com/{}/{}",
                repository.owner, repository.name
            ),
            owner: repository.owner.clone(),
            name: repository.name.clone(),
        })
    }

    async fn is_materialized(&self, _repository: &RepositoryRecord) -> Result<bool, GitHubError> {
        self.record(HostCall::IsMaterialized)?;
        let mut remaining = lock(&self.polls_until_materialized);
        if *remaining == 0 {
            Ok(true)
        } else {
            *remaining -= 1;
            Ok(false)
        }
    }

    async fn create_environment(
        &self,
        _repository: &RepositoryRecord,
        environment: &EnvironmentName,
    ) -> Result<(), GitHubError> {
        self.record(HostCall::CreateEnvironment(environment.clone()))
    }

    async fn fetch_public_key(
        &self,
        _repository: &RepositoryRecord,
        scope: &SecretScope,
    ) -> Result<RecipientKey, GitHubError> {
        self.record(HostCall::FetchPublicKey(scope.clone()))?;
        Ok(self.public_key())
    }

    async fn put_secret(
        &self,
        _repository: &RepositoryRecord,
        scope: &SecretScope,
        name: &SecretName,
        secret: &SealedSecret,
    ) -> Result<(), GitHubError> {
        self.record(HostCall::PutSecret {
            scope: scope.clone(),
            name: name.clone(),
            secret: secret.clone(),
        })
    }

    async fn get_file(
        &self,
        _repository: &RepositoryRecord,
        path: &str,
    ) -> Result<FileContent, GitHubError> {
        self.record(HostCall::GetFile(path.to_string()))?;
        lock(&self.files)
            .get(path)
            .cloned()
            .ok_or_else(|| GitHubError::NotFound {
                resource: path.to_string(),
            })
    }

    async fn update_file(
        &self,
        _repository: &RepositoryRecord,
        update: &FileUpdate,
    ) -> Result<(), GitHubError> {
        self.record(HostCall::UpdateFile(update.clone()))?;
        let mut files = lock(&self.files);
        let current = files
            .get(&update.path)
            .ok_or_else(|| GitHubError::NotFound {
                resource: update.path.clone(),
            })?;
        if current.revision != update.revision {
            return Err(GitHubError::Api {
                operation: "update file".into(),
                status: 409,
                message: "revision does not match".into(),
            });
        }
        files.insert(
            update.path.clone(),
            FileContent {
                content: update.content.clone(),
                revision: FileRevision::from_static("readme-sha-2"),
            },
        );
        Ok(())
    }

    async fn create_issue(
        &self,
        repository: &RepositoryRecord,
        issue: &NewIssue,
    ) -> Result<IssueRecord, GitHubError> {
        self.record(HostCall::CreateIssue(issue.clone()))?;
        Ok(IssueRecord {
            number: IssueNumber::new(1),
            html_url: format!("{}/issues/1", repository.html_url),
        })
    }

    async fn dispatch_workflow(
        &self,
        _repository: &RepositoryRecord,
        workflow: &WorkflowId,
        git_ref: &GitRef,
        inputs: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), GitHubError> {
        self.record(HostCall::DispatchWorkflow {
            workflow: workflow.clone(),
            git_ref: git_ref.clone(),
            inputs: inputs.clone(),
        })
    }

    async fn add_collaborator(
        &self,
        _repository: &RepositoryRecord,
        username: &str,
        permission: &str,
    ) -> Result<(), GitHubError> {
        self.record(HostCall::AddCollaborator {
            username: username.to_string(),
            permission: permission.to_string(),
        })
    }

    async fn archive_repository(
        &self,
        owner: &OwnerLogin,
        name: &RepositoryName,
    ) -> Result<(), GitHubError> {
        self.record(HostCall::Archive {
            owner: owner.clone(),
            name: name.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Status reporter
// ---------------------------------------------------------------------------

/// One report received by [`RecordingStatusReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Progress {
        instance: InstanceId,
        percent: u8,
        message: String,
    },
    Ready {
        instance: InstanceId,
        metadata: ReadyMetadata,
    },
    Error {
        instance: InstanceId,
        message: String,
        details: String,
    },
    Deleted {
        instance: InstanceId,
        message: String,
    },
}

impl Report {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::Error { .. })
    }
}

/// A [`StatusReporter`] that records reports and can be told to fail them.
#[derive(Default)]
pub struct RecordingStatusReporter {
    reports: Mutex<Vec<Report>>,
    fail_all: bool,
}

impl RecordingStatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every report but answers each with an error.
    pub fn failing() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            fail_all: true,
        }
    }

    pub fn reports(&self) -> Vec<Report> {
        lock(&self.reports).clone()
    }

    /// Percentages of the `provisioning` reports, in order.
    pub fn progress_percents(&self) -> Vec<u8> {
        lock(&self.reports)
            .iter()
            .filter_map(|r| match r {
                Report::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect()
    }

    fn record(&self, report: Report) -> Result<(), ReportError> {
        lock(&self.reports).push(report);
        if self.fail_all {
            Err(ReportError::Api {
                status: 503,
                body: "platform unavailable".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StatusReporter for RecordingStatusReporter {
    async fn publish_progress(
        &self,
        instance: &InstanceId,
        percent: u8,
        message: &str,
    ) -> Result<(), ReportError> {
        self.record(Report::Progress {
            instance: instance.clone(),
            percent,
            message: message.to_string(),
        })
    }

    async fn publish_ready(
        &self,
        instance: &InstanceId,
        metadata: &ReadyMetadata,
    ) -> Result<(), ReportError> {
        self.record(Report::Ready {
            instance: instance.clone(),
            metadata: metadata.clone(),
        })
    }

    async fn publish_error(
        &self,
        instance: &InstanceId,
        message: &str,
        details: &str,
    ) -> Result<(), ReportError> {
        self.record(Report::Error {
            instance: instance.clone(),
            message: message.to_string(),
            details: details.to_string(),
        })
    }

    async fn publish_deleted(
        &self,
        instance: &InstanceId,
        message: &str,
    ) -> Result<(), ReportError> {
        self.record(Report::Deleted {
            instance: instance.clone(),
            message: message.to_string(),
        })
    }
}
