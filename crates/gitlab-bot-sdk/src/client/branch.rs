// Repository branch operations for GitLab API

use serde::{Deserialize, Serialize};

use crate::client::{parse_response, ProjectClient};
use crate::error::ApiError;

/// Git branch in a project repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    /// Branch name
    pub name: String,

    /// Whether the branch is merged into the default branch
    #[serde(default)]
    pub merged: bool,

    /// Whether the branch is protected
    #[serde(default)]
    pub protected: bool,

    /// Whether this is the default branch
    #[serde(default)]
    pub default: bool,

    /// Commit at the branch head
    #[serde(default)]
    pub commit: Option<BranchCommit>,

    /// Branch URL
    #[serde(default)]
    pub web_url: Option<String>,
}

/// Head commit of a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchCommit {
    /// Full commit SHA
    pub id: String,

    /// Abbreviated SHA
    #[serde(default)]
    pub short_id: Option<String>,

    /// First line of the commit message
    #[serde(default)]
    pub title: Option<String>,
}

impl ProjectClient {
    /// Get a branch by name.
    ///
    /// Returns `Ok(None)` when the branch does not exist. The name is
    /// URL-encoded, so branches such as `feature/login` are addressed
    /// correctly.
    pub async fn get_branch(&self, name: &str) -> Result<Option<Branch>, ApiError> {
        let path = format!(
            "{}/repository/branches/{}",
            self.project_path(),
            urlencoding::encode(name)
        );
        let response = self.get(&path).await?;

        match parse_response(response).await {
            Ok(branch) => Ok(Some(branch)),
            Err(ApiError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "branch_tests.rs"]
mod tests;
