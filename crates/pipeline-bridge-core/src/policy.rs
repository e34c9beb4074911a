//! Trigger rules: decides whether a classified event runs a pipeline.

use gitlab_bot_sdk::{MergeRequestId, MergeRequestIid, ProjectId};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::events::{ClassifiedEvent, CommentEvent, MergeRequestAction, MergeRequestEvent};
use crate::gateway::{GatewayError, GitLabGateway};

/// Comments must start with this to be treated as commands.
pub const COMMAND_PREFIX: &str = "digger";

/// Canonical event name for merge request comments.
pub const COMMENTED_EVENT_NAME: &str = "merge_request_commented";

/// Why a decision does not trigger a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuppressReason {
    /// `update` events are already handled by GitLab's own merge request pipelines.
    HandledUpstream,
    /// The comment was written by the bridge's own user.
    SelfAuthored,
    /// The comment does not start with the command prefix.
    NotACommand,
    UnsupportedEventKind,
    /// The branch to run on does not exist; the author is told in a comment.
    BranchNotFound,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HandledUpstream => "handled upstream",
            Self::SelfAuthored => "self-authored",
            Self::NotACommand => "not-a-command",
            Self::UnsupportedEventKind => "unsupported-event-kind",
            Self::BranchNotFound => "branch-not-found",
        }
    }
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the trigger rules for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDecision {
    /// `None` only for unsupported events.
    pub project_id: Option<ProjectId>,
    pub should_trigger: bool,
    pub canonical_event_name: String,
    pub branch: String,
    pub command: Option<String>,
    pub discussion_id: Option<String>,
    pub merge_request_iid: MergeRequestIid,
    pub merge_request_id: MergeRequestId,
    pub is_mergeable: Option<bool>,
    pub suppress_reason: Option<SuppressReason>,
}

impl TriggerDecision {
    fn unsupported() -> Self {
        Self {
            project_id: None,
            should_trigger: false,
            canonical_event_name: String::new(),
            branch: String::new(),
            command: None,
            discussion_id: None,
            merge_request_iid: MergeRequestIid::new(0),
            merge_request_id: MergeRequestId::new(0),
            is_mergeable: None,
            suppress_reason: Some(SuppressReason::UnsupportedEventKind),
        }
    }

    fn suppress(mut self, reason: SuppressReason) -> Self {
        self.should_trigger = false;
        self.suppress_reason = Some(reason);
        self
    }

    /// Text of the comment posted when the branch does not exist.
    pub fn missing_branch_message(&self) -> String {
        format!(
            "Failed to trigger pipeline. Specified branch: {} doesn't exist.",
            self.branch
        )
    }
}

/// A GitLab query made while deciding failed.
#[derive(Debug, Error)]
#[error("Failed {operation} for project {project_id}: {source}")]
pub struct PolicyError {
    pub operation: &'static str,
    pub project_id: ProjectId,
    #[source]
    pub source: GatewayError,
}

impl PolicyError {
    fn new(operation: &'static str, project_id: ProjectId, source: GatewayError) -> Self {
        Self {
            operation,
            project_id,
            source,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.source.is_transient()
    }
}

/// Apply the trigger rules to a classified event.
///
/// # Errors
///
/// Returns [`PolicyError`] if a GitLab lookup needed for the decision fails.
#[instrument(skip(event, gateway), fields(kind = event.kind()))]
pub async fn decide(
    event: &ClassifiedEvent,
    gateway: &dyn GitLabGateway,
) -> Result<TriggerDecision, PolicyError> {
    match event {
        ClassifiedEvent::MergeRequest(event) => decide_merge_request(event, gateway).await,
        ClassifiedEvent::Comment(event) => decide_comment(event, gateway).await,
        ClassifiedEvent::Unsupported { event_type } => {
            debug!(event_type = %event_type, "Unsupported event kind");
            Ok(TriggerDecision::unsupported())
        }
    }
}

async fn decide_merge_request(
    event: &MergeRequestEvent,
    gateway: &dyn GitLabGateway,
) -> Result<TriggerDecision, PolicyError> {
    let project_id = event.project_id;

    // A merged source branch may already be deleted, so merges run on the target.
    let branch = match event.action {
        MergeRequestAction::Merge => event.target_branch.clone(),
        _ => event.source_branch.clone(),
    };

    let decision = TriggerDecision {
        project_id: Some(project_id),
        should_trigger: true,
        canonical_event_name: event.action.canonical_event_name().to_string(),
        branch,
        command: None,
        discussion_id: None,
        merge_request_iid: event.merge_request_iid,
        merge_request_id: event.merge_request_id,
        is_mergeable: None,
        suppress_reason: None,
    };

    if event.action == MergeRequestAction::Update {
        info!(
            merge_request_iid = %event.merge_request_iid,
            "Ignoring merge request update, handled upstream"
        );
        return Ok(decision.suppress(SuppressReason::HandledUpstream));
    }

    let branch_exists = gateway
        .branch_exists(project_id, &decision.branch)
        .await
        .map_err(|e| PolicyError::new("branch lookup", project_id, e))?;

    let is_mergeable = gateway
        .is_mergeable(project_id, event.merge_request_iid)
        .await
        .map_err(|e| PolicyError::new("mergeability lookup", project_id, e))?;

    let decision = TriggerDecision {
        is_mergeable: Some(is_mergeable),
        ..decision
    };

    if !branch_exists {
        if event.action != MergeRequestAction::Merge {
            info!(branch = %decision.branch, "Specified branch doesn't exist");
            return Ok(decision.suppress(SuppressReason::BranchNotFound));
        }
        warn!(branch = %decision.branch, "Merge target branch not found, triggering anyway");
    }

    Ok(decision)
}

async fn decide_comment(
    event: &CommentEvent,
    gateway: &dyn GitLabGateway,
) -> Result<TriggerDecision, PolicyError> {
    let project_id = event.project_id;

    let decision = TriggerDecision {
        project_id: Some(project_id),
        should_trigger: true,
        canonical_event_name: COMMENTED_EVENT_NAME.to_string(),
        branch: event.source_branch.clone(),
        command: Some(event.comment.clone()),
        discussion_id: event.discussion_id.clone(),
        merge_request_iid: event.merge_request_iid,
        merge_request_id: event.merge_request_id,
        is_mergeable: None,
        suppress_reason: None,
    };

    let current_user = gateway
        .current_user()
        .await
        .map_err(|e| PolicyError::new("current user lookup", project_id, e))?;

    if event.author_id == current_user.id {
        info!(user_id = %current_user.id, "Comment written by the bridge itself, ignoring");
        return Ok(decision.suppress(SuppressReason::SelfAuthored));
    }

    if !event.comment.starts_with(COMMAND_PREFIX) {
        info!("Comment is not a command, ignoring");
        return Ok(decision.suppress(SuppressReason::NotACommand));
    }

    let is_mergeable = gateway
        .is_mergeable(project_id, event.merge_request_iid)
        .await
        .map_err(|e| PolicyError::new("mergeability lookup", project_id, e))?;

    Ok(TriggerDecision {
        is_mergeable: Some(is_mergeable),
        ..decision
    })
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
