//! GitLab REST v4 client.
//!
//! [`GitLabClient`] owns one pooled HTTP client and the credential map.
//! Operations are performed through a [`ProjectClient`], which is bound to a
//! single project and authenticates with that project's access token.

mod branch;
mod discussion;
mod merge_request;
mod pipeline;
mod user;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::auth::{AccessToken, CredentialMap};
use crate::error::ApiError;
use crate::ids::ProjectId;

pub use branch::{Branch, BranchCommit};
pub use discussion::{CreateDiscussionRequest, Discussion, DiscussionNote};
pub use merge_request::MergeRequest;
pub use pipeline::{CreatePipelineRequest, Pipeline, PipelineVariableInput, VariableType};
pub use user::User;

/// Header GitLab reads personal, project, and group access tokens from.
const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Configuration for GitLab API client behavior.
///
/// # Examples
///
/// ```
/// use gitlab_bot_sdk::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_api_url("https://gitlab.example.com/api/v4")
///     .with_timeout(Duration::from_secs(10));
/// assert_eq!(config.timeout, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API, including the `/api/v4` suffix
    pub api_url: String,
    /// User agent string for API requests
    pub user_agent: String,
    /// Request timeout duration, applied to every call
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://gitlab.com/api/v4".to_string(),
            user_agent: format!("gitlab-bot-sdk/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Set the API base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// GitLab API client shared across projects.
///
/// Cloning is cheap; clones share the connection pool and credentials.
#[derive(Clone)]
pub struct GitLabClient {
    http_client: reqwest::Client,
    config: ClientConfig,
    credentials: Arc<CredentialMap>,
}

impl fmt::Debug for GitLabClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitLabClient")
            .field("api_url", &self.config.api_url)
            .field("timeout", &self.config.timeout)
            .field("projects", &self.credentials.len())
            .finish()
    }
}

impl GitLabClient {
    /// Build a client from configuration and credentials.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, credentials: CredentialMap) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Configuration {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            config,
            credentials: Arc::new(credentials),
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a client bound to one project.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if no token is configured for the
    /// project and there is no fallback token.
    pub fn for_project(&self, project_id: ProjectId) -> Result<ProjectClient, ApiError> {
        let token = self
            .credentials
            .token_for(project_id)
            .cloned()
            .ok_or_else(|| ApiError::Configuration {
                message: format!("No access token configured for project {}", project_id),
            })?;

        Ok(ProjectClient {
            http_client: self.http_client.clone(),
            api_url: self.config.api_url.trim_end_matches('/').to_string(),
            project_id,
            token,
        })
    }
}

/// Project-scoped GitLab API client.
#[derive(Clone)]
pub struct ProjectClient {
    http_client: reqwest::Client,
    api_url: String,
    project_id: ProjectId,
    token: AccessToken,
}

impl fmt::Debug for ProjectClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectClient")
            .field("api_url", &self.api_url)
            .field("project_id", &self.project_id)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

impl ProjectClient {
    /// Get the project this client is bound to.
    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Path prefix for project-scoped endpoints.
    fn project_path(&self) -> String {
        format!("/projects/{}", self.project_id)
    }

    /// Make an authenticated GET request.
    pub(crate) async fn get(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.api_url, path);
        debug!(url = %url, "GitLab GET");

        self.http_client
            .get(&url)
            .header(TOKEN_HEADER, self.token.expose())
            .send()
            .await
            .map_err(ApiError::from_transport)
    }

    /// Make an authenticated POST request with a JSON body.
    pub(crate) async fn post<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.api_url, path);
        debug!(url = %url, "GitLab POST");

        self.http_client
            .post(&url)
            .header(TOKEN_HEADER, self.token.expose())
            .json(body)
            .send()
            .await
            .map_err(ApiError::from_transport)
    }
}

/// Decode a successful response, or map a failed one onto [`ApiError`].
pub(crate) async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        return Err(ApiError::from_status(status.as_u16(), message));
    }

    let bytes = response.bytes().await.map_err(ApiError::from_transport)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
