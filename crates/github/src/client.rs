use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use provisioning::{
    EnvironmentName, FileContent, FileRevision, FileUpdate, GitHubError, GitHubSettings, GitRef,
    IssueNumber, IssueRecord, KeyId, NewIssue, NewRepository, OwnerLogin, RecipientKey,
    RepositoryHost, RepositoryId, RepositoryName, RepositoryRecord, SealedSecret, SecretName,
    SecretScope, WorkflowId,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::models::{
    ApiErrorBody, ArchiveBody, CollaboratorBody, Contents, CreateIssueBody, DispatchBody,
    EnvironmentBody, GenerateRepositoryBody, Issue, PublicKey, Repository, SecretBody,
    UpdateFileBody,
};

const API_VERSION: &str = "2022-11-28";
const MEDIA_TYPE: &str = "application/vnd.github+json";

/// GitHub REST client authenticated with a personal access token.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: Url,
    template_owner: OwnerLogin,
    template_repo: String,
}

impl GitHubClient {
    /// Builds a client whose every request carries the token and API
    /// version headers.
    pub fn new(settings: &GitHubSettings) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.token.expose()))
            .map_err(|e| transport("build client", e))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("repo-provisioner/", env!("CARGO_PKG_VERSION"))),
        );

        let api_url = Url::parse(&settings.api_url).map_err(|e| transport("build client", e))?;
        if api_url.cannot_be_a_base() {
            return Err(invalid("build client", format!("{api_url} cannot carry a path")));
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| transport("build client", e))?;

        Ok(Self {
            http,
            api_url,
            template_owner: settings.template_owner.clone(),
            template_repo: settings.template_repo.clone(),
        })
    }

    /// Appends `segments` to the API base URL, percent-encoding each one.
    ///
    /// Segments come from request data, so `/`, `?` and `#` are escaped
    /// rather than interpreted, and dot segments are refused outright.
    fn endpoint<I, S>(&self, segments: I) -> Result<Url, GitHubError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments: Vec<S> = segments.into_iter().collect();
        if let Some(bad) = segments
            .iter()
            .map(|s| s.as_ref())
            .find(|s| matches!(*s, "" | "." | ".."))
        {
            return Err(GitHubError::UnsafePathSegment {
                segment: bad.to_string(),
            });
        }

        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| invalid("build url", "API URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `repos/{owner}/{name}/...`
    fn repo_endpoint(&self, repository: &RepositoryRecord, tail: &[&str]) -> Result<Url, GitHubError> {
        let head = ["repos", repository.owner.as_str(), repository.name.as_str()];
        self.endpoint(head.iter().chain(tail))
    }

    /// The secrets collection for `scope`, followed by `tail`. Environment
    /// secrets are addressed by numeric repository id.
    fn secrets_endpoint(
        &self,
        repository: &RepositoryRecord,
        scope: &SecretScope,
        tail: &str,
    ) -> Result<Url, GitHubError> {
        match scope {
            SecretScope::Repository => {
                self.repo_endpoint(repository, &["actions", "secrets", tail])
            }
            SecretScope::Environment(env) => {
                let id = repository.id.to_string();
                self.endpoint([
                    "repositories",
                    id.as_str(),
                    "environments",
                    env.as_str(),
                    "secrets",
                    tail,
                ])
            }
        }
    }

    // ---- private helpers ----

    /// Sends the request and maps non-success statuses onto [`GitHubError`].
    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, GitHubError> {
        tracing::debug!(operation, "GitHub request");
        let response = request
            .send()
            .await
            .map_err(|e| transport(operation, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        if status == StatusCode::NOT_FOUND {
            return Err(GitHubError::NotFound {
                resource: operation.to_string(),
            });
        }

        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);
        Err(GitHubError::Api {
            operation: operation.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T, GitHubError> {
        let response = self.send(operation, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| invalid(operation, e.to_string()))
    }
}

fn transport<E>(operation: &str, err: E) -> GitHubError
where
    E: std::error::Error + Send + Sync + 'static,
{
    GitHubError::Transport {
        operation: operation.to_string(),
        source: Box::new(err),
    }
}

fn invalid(operation: &str, message: impl Into<String>) -> GitHubError {
    GitHubError::InvalidResponse {
        operation: operation.to_string(),
        message: message.into(),
    }
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn create_from_template(
        &self,
        repository: &NewRepository,
    ) -> Result<RepositoryRecord, GitHubError> {
        const OP: &str = "create repository from template";
        let url = self.endpoint([
            "repos",
            self.template_owner.as_str(),
            self.template_repo.as_str(),
            "generate",
        ])?;
        let body = GenerateRepositoryBody {
            owner: repository.owner.as_str(),
            name: repository.name.as_str(),
            description: &repository.description,
            private: repository.visibility.is_private(),
            include_all_branches: false,
        };

        let created: Repository = self.send_json(OP, self.http.post(url).json(&body)).await?;
        Ok(RepositoryRecord {
            id: RepositoryId::new(created.id),
            html_url: created.html_url,
            owner: OwnerLogin::new(created.owner.login)
                .ok_or_else(|| invalid(OP, "empty owner login"))?,
            name: RepositoryName::new(created.name)
                .ok_or_else(|| invalid(OP, "empty repository name"))?,
        })
    }

    async fn is_materialized(&self, repository: &RepositoryRecord) -> Result<bool, GitHubError> {
        const OP: &str = "list commits";
        let url = self.repo_endpoint(repository, &["commits"])?;
        let request = self.http.get(url).query(&[("per_page", "1")]);

        // A freshly generated repository answers 404 until it exists and 409
        // while its default branch is still empty.
        match self.send_json::<Vec<serde_json::Value>>(OP, request).await {
            Ok(commits) => Ok(!commits.is_empty()),
            Err(GitHubError::NotFound { .. }) => Ok(false),
            Err(GitHubError::Api { status: 409, .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn create_environment(
        &self,
        repository: &RepositoryRecord,
        environment: &EnvironmentName,
    ) -> Result<(), GitHubError> {
        let url = self.repo_endpoint(repository, &["environments", environment.as_str()])?;
        let body = EnvironmentBody {
            wait_timer: 0,
            reviewers: Vec::new(),
        };
        self.send("create environment", self.http.put(url).json(&body))
            .await?;
        Ok(())
    }

    async fn fetch_public_key(
        &self,
        repository: &RepositoryRecord,
        scope: &SecretScope,
    ) -> Result<RecipientKey, GitHubError> {
        const OP: &str = "fetch secrets public key";
        let url = self.secrets_endpoint(repository, scope, "public-key")?;
        let key: PublicKey = self.send_json(OP, self.http.get(url)).await?;
        Ok(RecipientKey {
            key_id: KeyId::new(key.key_id).ok_or_else(|| invalid(OP, "empty key id"))?,
            key: key.key,
        })
    }

    async fn put_secret(
        &self,
        repository: &RepositoryRecord,
        scope: &SecretScope,
        name: &SecretName,
        secret: &SealedSecret,
    ) -> Result<(), GitHubError> {
        let url = self.secrets_endpoint(repository, scope, name.as_str())?;
        let body = SecretBody {
            encrypted_value: &secret.encrypted_value,
            key_id: secret.key_id.as_str(),
        };
        self.send("store secret", self.http.put(url).json(&body))
            .await?;
        Ok(())
    }

    async fn get_file(
        &self,
        repository: &RepositoryRecord,
        path: &str,
    ) -> Result<FileContent, GitHubError> {
        const OP: &str = "get file contents";
        let url = self.repo_endpoint(repository, &["contents", path])?;
        let contents: Contents = self.send_json(OP, self.http.get(url)).await?;

        let encoded: String = contents
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| invalid(OP, format!("content is not base64: {e}")))?;
        let content =
            String::from_utf8(bytes).map_err(|e| invalid(OP, format!("content is not UTF-8: {e}")))?;

        Ok(FileContent {
            content,
            revision: FileRevision::new(contents.sha).ok_or_else(|| invalid(OP, "empty sha"))?,
        })
    }

    async fn update_file(
        &self,
        repository: &RepositoryRecord,
        update: &FileUpdate,
    ) -> Result<(), GitHubError> {
        let url = self.repo_endpoint(repository, &["contents", update.path.as_str()])?;
        let body = UpdateFileBody {
            message: &update.commit_message,
            content: STANDARD.encode(update.content.as_bytes()),
            sha: update.revision.as_str(),
        };
        self.send("update file", self.http.put(url).json(&body))
            .await?;
        Ok(())
    }

    async fn create_issue(
        &self,
        repository: &RepositoryRecord,
        issue: &NewIssue,
    ) -> Result<IssueRecord, GitHubError> {
        let url = self.repo_endpoint(repository, &["issues"])?;
        let body = CreateIssueBody {
            title: &issue.title,
            body: &issue.body,
            labels: &issue.labels,
        };
        let created: Issue = self
            .send_json("create issue", self.http.post(url).json(&body))
            .await?;
        Ok(IssueRecord {
            number: IssueNumber::new(created.number),
            html_url: created.html_url,
        })
    }

    async fn dispatch_workflow(
        &self,
        repository: &RepositoryRecord,
        workflow: &WorkflowId,
        git_ref: &GitRef,
        inputs: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), GitHubError> {
        let url = self.repo_endpoint(
            repository,
            &["actions", "workflows", workflow.as_str(), "dispatches"],
        )?;
        let body = DispatchBody {
            git_ref: git_ref.as_str(),
            inputs,
        };
        self.send("dispatch workflow", self.http.post(url).json(&body))
            .await?;
        Ok(())
    }

    async fn add_collaborator(
        &self,
        repository: &RepositoryRecord,
        username: &str,
        permission: &str,
    ) -> Result<(), GitHubError> {
        let url = self.repo_endpoint(repository, &["collaborators", username])?;
        self.send(
            "add collaborator",
            self.http.put(url).json(&CollaboratorBody { permission }),
        )
        .await?;
        Ok(())
    }

    async fn archive_repository(
        &self,
        owner: &OwnerLogin,
        name: &RepositoryName,
    ) -> Result<(), GitHubError> {
        let url = self.endpoint(["repos", owner.as_str(), name.as_str()])?;
        self.send(
            "archive repository",
            self.http.patch(url).json(&ArchiveBody { archived: true }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
