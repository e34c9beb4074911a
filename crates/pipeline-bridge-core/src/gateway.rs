//! Capability interface to GitLab used by the trigger rules.
//!
//! The policy and trigger code only ever see [`GitLabGateway`]. The REST
//! implementation, [`GitLabApiGateway`], wraps a project-bound SDK client and
//! [`GitLabGatewayProvider`] hands one out per project.

use async_trait::async_trait;
use gitlab_bot_sdk::client::{CreateDiscussionRequest, CreatePipelineRequest, GitLabClient, ProjectClient};
use gitlab_bot_sdk::{ApiError, MergeRequestIid, ProjectId, UserId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::variables::PipelineVariableSet;

/// Failures talking to GitLab.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("GitLab API request failed: {0}")]
    Api(#[from] ApiError),

    #[error("No GitLab access token configured for project {project_id}")]
    MissingCredentials { project_id: ProjectId },

    #[error("Gateway bound to project {bound} cannot act on project {requested}")]
    ProjectMismatch {
        bound: ProjectId,
        requested: ProjectId,
    },
}

impl GatewayError {
    /// Check if error is transient and a later delivery may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api(e) => e.is_transient(),
            Self::MissingCredentials { .. } => false,
            Self::ProjectMismatch { .. } => false,
        }
    }
}

/// The identity the gateway authenticates as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
}

/// A pipeline created by [`GitLabGateway::create_pipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPipeline {
    pub id: u64,
    pub web_url: Option<String>,
}

/// GitLab operations the bridge depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitLabGateway: Send + Sync {
    /// Identity of the token the gateway uses.
    async fn current_user(&self) -> Result<CurrentUser, GatewayError>;

    /// Whether `branch` exists in the project repository.
    async fn branch_exists(&self, project_id: ProjectId, branch: &str) -> Result<bool, GatewayError>;

    /// Whether GitLab currently reports the merge request as mergeable.
    async fn is_mergeable(
        &self,
        project_id: ProjectId,
        merge_request_iid: MergeRequestIid,
    ) -> Result<bool, GatewayError>;

    /// Start a discussion thread on a merge request.
    async fn create_discussion(
        &self,
        project_id: ProjectId,
        merge_request_iid: MergeRequestIid,
        body: &str,
    ) -> Result<(), GatewayError>;

    /// Run a pipeline on `branch` with the given variables.
    async fn create_pipeline(
        &self,
        project_id: ProjectId,
        branch: &str,
        variables: &PipelineVariableSet,
    ) -> Result<CreatedPipeline, GatewayError>;
}

/// Source of project-bound gateways.
#[cfg_attr(test, mockall::automock)]
pub trait GatewayProvider: Send + Sync {
    /// Get a gateway authenticated for `project_id`.
    fn gateway_for(&self, project_id: ProjectId) -> Result<Arc<dyn GitLabGateway>, GatewayError>;
}

// ============================================================================
// REST implementation
// ============================================================================

/// [`GitLabGateway`] over the GitLab REST API.
#[derive(Debug, Clone)]
pub struct GitLabApiGateway {
    client: ProjectClient,
}

impl GitLabApiGateway {
    pub fn new(client: ProjectClient) -> Self {
        Self { client }
    }

    fn ensure_project(&self, requested: ProjectId) -> Result<(), GatewayError> {
        let bound = self.client.project_id();
        if bound != requested {
            return Err(GatewayError::ProjectMismatch { bound, requested });
        }
        Ok(())
    }
}

#[async_trait]
impl GitLabGateway for GitLabApiGateway {
    async fn current_user(&self) -> Result<CurrentUser, GatewayError> {
        let user = self.client.current_user().await?;
        debug!(user_id = %user.id, username = %user.username, "Resolved current GitLab user");

        Ok(CurrentUser {
            id: user.id,
            username: user.username,
        })
    }

    async fn branch_exists(&self, project_id: ProjectId, branch: &str) -> Result<bool, GatewayError> {
        self.ensure_project(project_id)?;
        Ok(self.client.get_branch(branch).await?.is_some())
    }

    async fn is_mergeable(
        &self,
        project_id: ProjectId,
        merge_request_iid: MergeRequestIid,
    ) -> Result<bool, GatewayError> {
        self.ensure_project(project_id)?;
        let merge_request = self.client.get_merge_request(merge_request_iid).await?;
        debug!(
            merge_request_iid = %merge_request_iid,
            detailed_merge_status = ?merge_request.detailed_merge_status,
            "Fetched merge request status"
        );

        Ok(merge_request.is_mergeable())
    }

    #[instrument(skip(self, body), fields(project_id = %project_id, merge_request_iid = %merge_request_iid))]
    async fn create_discussion(
        &self,
        project_id: ProjectId,
        merge_request_iid: MergeRequestIid,
        body: &str,
    ) -> Result<(), GatewayError> {
        self.ensure_project(project_id)?;
        let discussion = self
            .client
            .create_merge_request_discussion(
                merge_request_iid,
                CreateDiscussionRequest {
                    body: body.to_string(),
                },
            )
            .await?;
        debug!(discussion_id = %discussion.id, "Created discussion");

        Ok(())
    }

    #[instrument(skip(self, variables), fields(project_id = %project_id, branch = %branch))]
    async fn create_pipeline(
        &self,
        project_id: ProjectId,
        branch: &str,
        variables: &PipelineVariableSet,
    ) -> Result<CreatedPipeline, GatewayError> {
        self.ensure_project(project_id)?;
        let pipeline = self
            .client
            .create_pipeline(CreatePipelineRequest {
                git_ref: branch.to_string(),
                variables: variables.to_inputs(),
            })
            .await?;

        Ok(CreatedPipeline {
            id: pipeline.id,
            web_url: pipeline.web_url,
        })
    }
}

/// [`GatewayProvider`] backed by a shared [`GitLabClient`].
#[derive(Debug, Clone)]
pub struct GitLabGatewayProvider {
    client: GitLabClient,
}

impl GitLabGatewayProvider {
    pub fn new(client: GitLabClient) -> Self {
        Self { client }
    }
}

impl GatewayProvider for GitLabGatewayProvider {
    fn gateway_for(&self, project_id: ProjectId) -> Result<Arc<dyn GitLabGateway>, GatewayError> {
        let client = self.client.for_project(project_id).map_err(|e| match e {
            ApiError::Configuration { .. } => GatewayError::MissingCredentials { project_id },
            other => GatewayError::Api(other),
        })?;

        Ok(Arc::new(GitLabApiGateway::new(client)))
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
