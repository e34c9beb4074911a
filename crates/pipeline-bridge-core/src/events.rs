//! Classified webhook events and the GitLab payload schemas they come from.

use gitlab_bot_sdk::{MergeRequestId, MergeRequestIid, ProjectId, UserId};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::classifier::ClassificationError;

// ============================================================================
// Classified events
// ============================================================================

/// Merge request action reported in `object_attributes.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeRequestAction {
    Open,
    Close,
    Reopen,
    Update,
    Approved,
    Unapproved,
    Approval,
    Unapproval,
    Merge,
}

impl MergeRequestAction {
    /// Action name as GitLab spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Reopen => "reopen",
            Self::Update => "update",
            Self::Approved => "approved",
            Self::Unapproved => "unapproved",
            Self::Approval => "approval",
            Self::Unapproval => "unapproval",
            Self::Merge => "merge",
        }
    }

    /// Event name handed to the pipeline in `MERGE_REQUEST_EVENT_NAME`.
    pub fn canonical_event_name(&self) -> &'static str {
        match self {
            Self::Open => "merge_request_opened",
            Self::Close => "merge_request_closed",
            Self::Reopen => "merge_request_reopened",
            Self::Update => "merge_request_updated",
            Self::Approved => "merge_request_approved",
            Self::Unapproved => "merge_request_unapproved",
            Self::Approval => "merge_request_approval",
            Self::Unapproval => "merge_request_unapproval",
            Self::Merge => "merge_request_merge",
        }
    }
}

impl fmt::Display for MergeRequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeRequestAction {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "close" => Ok(Self::Close),
            "reopen" => Ok(Self::Reopen),
            "update" => Ok(Self::Update),
            "approved" => Ok(Self::Approved),
            "unapproved" => Ok(Self::Unapproved),
            "approval" => Ok(Self::Approval),
            "unapproval" => Ok(Self::Unapproval),
            "merge" => Ok(Self::Merge),
            other => Err(ClassificationError::UnknownAction {
                action: other.to_string(),
            }),
        }
    }
}

/// A merge request lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequestEvent {
    pub project_id: ProjectId,
    pub merge_request_iid: MergeRequestIid,
    pub merge_request_id: MergeRequestId,
    pub source_branch: String,
    pub target_branch: String,
    pub action: MergeRequestAction,
}

/// A comment posted on a merge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEvent {
    pub project_id: ProjectId,
    pub merge_request_iid: MergeRequestIid,
    pub merge_request_id: MergeRequestId,
    pub source_branch: String,
    pub author_id: UserId,
    pub comment: String,
    pub discussion_id: Option<String>,
}

/// Result of classifying a webhook request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedEvent {
    MergeRequest(MergeRequestEvent),
    Comment(CommentEvent),
    /// Any event the bridge does not act on. Not an error.
    Unsupported { event_type: String },
}

impl ClassifiedEvent {
    /// Project the event belongs to, when it is a handled kind.
    pub fn project_id(&self) -> Option<ProjectId> {
        match self {
            Self::MergeRequest(event) => Some(event.project_id),
            Self::Comment(event) => Some(event.project_id),
            Self::Unsupported { .. } => None,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MergeRequest(_) => "merge_request",
            Self::Comment(_) => "comment",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}

// ============================================================================
// Payload schemas
// ============================================================================

/// Body of a `Merge Request Hook` delivery.
#[derive(Debug, Deserialize)]
pub(crate) struct MergeRequestHookPayload {
    pub project: HookProject,
    pub object_attributes: MergeRequestAttributes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HookProject {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MergeRequestAttributes {
    pub id: u64,
    pub iid: u64,
    pub source_branch: String,
    pub target_branch: String,
    #[serde(default)]
    pub action: Option<String>,
}

/// Body of a `Note Hook` delivery.
#[derive(Debug, Deserialize)]
pub(crate) struct NoteHookPayload {
    pub project_id: u64,
    pub user: HookUser,
    pub object_attributes: NoteAttributes,
    /// Present only for comments on merge requests.
    #[serde(default)]
    pub merge_request: Option<NoteMergeRequest>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HookUser {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteAttributes {
    pub note: String,
    #[serde(default)]
    pub noteable_type: Option<String>,
    #[serde(default)]
    pub discussion_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteMergeRequest {
    pub id: u64,
    pub iid: u64,
    pub source_branch: String,
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
