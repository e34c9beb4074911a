// Merge request discussion operations for GitLab API

use serde::{Deserialize, Serialize};

use crate::client::{parse_response, ProjectClient};
use crate::error::ApiError;
use crate::ids::MergeRequestIid;

/// Request to start a new discussion thread.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDiscussionRequest {
    /// Comment content (Markdown)
    pub body: String,
}

/// Discussion thread on a merge request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discussion {
    /// Discussion identifier (a hex string, not a number)
    pub id: String,

    /// Whether the thread is a single standalone note
    #[serde(default)]
    pub individual_note: bool,

    /// Notes in the thread, oldest first
    #[serde(default)]
    pub notes: Vec<DiscussionNote>,
}

/// One note within a discussion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionNote {
    /// Note identifier
    pub id: u64,

    /// Note content
    pub body: String,

    /// Whether GitLab generated the note
    #[serde(default)]
    pub system: bool,
}

impl ProjectClient {
    /// Start a discussion on a merge request.
    pub async fn create_merge_request_discussion(
        &self,
        iid: MergeRequestIid,
        request: CreateDiscussionRequest,
    ) -> Result<Discussion, ApiError> {
        let path = format!("{}/merge_requests/{}/discussions", self.project_path(), iid);
        let response = self.post(&path, &request).await?;
        parse_response(response).await
    }
}

#[cfg(test)]
#[path = "discussion_tests.rs"]
mod tests;
