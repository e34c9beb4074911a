// Pipeline operations for GitLab API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::{parse_response, ProjectClient};
use crate::error::ApiError;
use crate::ids::ProjectId;

/// How GitLab exposes a pipeline variable to jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    /// Plain environment variable
    #[default]
    EnvVar,
    /// Value written to a temporary file whose path is the variable
    File,
}

/// Variable injected into a new pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineVariableInput {
    /// Variable name
    pub key: String,

    /// Variable value
    pub value: String,

    /// Variable kind
    pub variable_type: VariableType,
}

impl PipelineVariableInput {
    /// Create an `env_var` variable.
    pub fn env_var(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            variable_type: VariableType::EnvVar,
        }
    }
}

/// Request to run a new pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePipelineRequest {
    /// Branch or tag to run on
    #[serde(rename = "ref")]
    pub git_ref: String,

    /// Variables available to every job
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<PipelineVariableInput>,
}

/// GitLab CI pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// Unique pipeline identifier
    pub id: u64,

    /// Project-scoped pipeline number
    #[serde(default)]
    pub iid: Option<u64>,

    /// Owning project
    #[serde(default)]
    pub project_id: Option<ProjectId>,

    /// Status (`created`, `pending`, `running`, ...)
    pub status: String,

    /// Branch or tag the pipeline runs on
    #[serde(rename = "ref")]
    pub git_ref: String,

    /// Commit SHA
    #[serde(default)]
    pub sha: Option<String>,

    /// Pipeline URL
    #[serde(default)]
    pub web_url: Option<String>,

    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProjectClient {
    /// Run a new pipeline.
    pub async fn create_pipeline(
        &self,
        request: CreatePipelineRequest,
    ) -> Result<Pipeline, ApiError> {
        let path = format!("{}/pipeline", self.project_path());
        let response = self.post(&path, &request).await?;
        parse_response(response).await
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
