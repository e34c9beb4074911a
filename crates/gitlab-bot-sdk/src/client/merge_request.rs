// Merge request operations for GitLab API

use serde::{Deserialize, Serialize};

use crate::client::{parse_response, ProjectClient};
use crate::error::ApiError;
use crate::ids::{MergeRequestId, MergeRequestIid, ProjectId};

/// Value of `detailed_merge_status` for a merge request that can be merged now.
const MERGEABLE_STATUS: &str = "mergeable";

/// GitLab merge request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    /// Instance-wide identifier
    pub id: MergeRequestId,

    /// Project-scoped number
    pub iid: MergeRequestIid,

    /// Project the merge request belongs to
    pub project_id: ProjectId,

    /// Title
    #[serde(default)]
    pub title: String,

    /// State (`opened`, `closed`, `merged`, `locked`)
    #[serde(default)]
    pub state: String,

    /// Branch being merged
    pub source_branch: String,

    /// Branch being merged into
    pub target_branch: String,

    /// Legacy merge status (`can_be_merged`, `cannot_be_merged`, ...)
    #[serde(default)]
    pub merge_status: Option<String>,

    /// Detailed merge status (`mergeable`, `conflict`, `ci_must_pass`, ...)
    #[serde(default)]
    pub detailed_merge_status: Option<String>,

    /// Merge request URL
    #[serde(default)]
    pub web_url: Option<String>,
}

impl MergeRequest {
    /// `true` only when GitLab reports the merge request as mergeable right now.
    pub fn is_mergeable(&self) -> bool {
        self.detailed_merge_status.as_deref() == Some(MERGEABLE_STATUS)
    }
}

impl ProjectClient {
    /// Get a merge request by its project-scoped IID.
    pub async fn get_merge_request(&self, iid: MergeRequestIid) -> Result<MergeRequest, ApiError> {
        let path = format!("{}/merge_requests/{}", self.project_path(), iid);
        let response = self.get(&path).await?;
        parse_response(response).await
    }
}

#[cfg(test)]
#[path = "merge_request_tests.rs"]
mod tests;
