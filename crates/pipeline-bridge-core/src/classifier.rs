//! Authenticates webhook requests and turns them into [`ClassifiedEvent`]s.

use gitlab_bot_sdk::{MergeRequestId, MergeRequestIid, ProjectId, UserId};
use serde::de::DeserializeOwned;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, warn};

use crate::events::{
    ClassifiedEvent, CommentEvent, MergeRequestAction, MergeRequestEvent, MergeRequestHookPayload,
    NoteHookPayload,
};
use crate::webhook::WebhookRequest;

/// `X-Gitlab-Event` value for merge request events.
pub const MERGE_REQUEST_HOOK: &str = "Merge Request Hook";

/// `X-Gitlab-Event` value for comment events.
pub const NOTE_HOOK: &str = "Note Hook";

/// `noteable_type` of a comment on a merge request.
const MERGE_REQUEST_NOTEABLE: &str = "MergeRequest";

/// Reasons a webhook request cannot be classified.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Token validation failed")]
    Authentication,

    #[error("Missing X-Gitlab-Event header")]
    MissingEventHeader,

    #[error("Request body is empty")]
    EmptyPayload,

    #[error("Failed to parse '{event_type}' payload: {message}")]
    MalformedPayload { event_type: String, message: String },

    #[error("Unknown merge request action '{action}'")]
    UnknownAction { action: String },
}

/// Authenticate and classify a webhook request.
///
/// When `secret` is non-empty the request's `X-Gitlab-Token` must equal it.
/// Event kinds other than merge requests and merge request comments yield
/// [`ClassifiedEvent::Unsupported`].
///
/// # Errors
///
/// Returns [`ClassificationError`] if the token does not match, the event
/// header is missing or blank, the body is empty or does not match the
/// event's schema, or a merge request action is not recognised.
///
/// # Examples
///
/// ```
/// use pipeline_bridge_core::classifier::classify;
/// use pipeline_bridge_core::webhook::WebhookRequest;
/// use pipeline_bridge_core::ClassifiedEvent;
///
/// let request = WebhookRequest::new([("X-Gitlab-Event", "Push Hook")], "{}");
/// let event = classify("", &request).unwrap();
/// assert!(matches!(event, ClassifiedEvent::Unsupported { .. }));
/// ```
pub fn classify(
    secret: &str,
    request: &WebhookRequest,
) -> Result<ClassifiedEvent, ClassificationError> {
    if !secret.is_empty() {
        let token = request.token().unwrap_or_default();
        let matches: bool = token.as_bytes().ct_eq(secret.as_bytes()).into();
        if !matches {
            warn!("Webhook token does not match the configured secret");
            return Err(ClassificationError::Authentication);
        }
    }

    let event_type = request
        .event_type()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ClassificationError::MissingEventHeader)?;

    if request.body().is_empty() {
        return Err(ClassificationError::EmptyPayload);
    }

    debug!(event_type = %event_type, "Classifying webhook");

    match event_type {
        MERGE_REQUEST_HOOK => classify_merge_request(event_type, request.body()),
        NOTE_HOOK => classify_note(event_type, request.body()),
        other => Ok(ClassifiedEvent::Unsupported {
            event_type: other.to_string(),
        }),
    }
}

fn classify_merge_request(
    event_type: &str,
    body: &[u8],
) -> Result<ClassifiedEvent, ClassificationError> {
    let payload: MergeRequestHookPayload = parse_payload(event_type, body)?;
    let project_id = non_zero_project(event_type, payload.project.id)?;
    let attributes = payload.object_attributes;

    let action: MergeRequestAction = attributes.action.as_deref().unwrap_or_default().parse()?;

    Ok(ClassifiedEvent::MergeRequest(MergeRequestEvent {
        project_id,
        merge_request_iid: MergeRequestIid::new(attributes.iid),
        merge_request_id: MergeRequestId::new(attributes.id),
        source_branch: attributes.source_branch,
        target_branch: attributes.target_branch,
        action,
    }))
}

fn classify_note(event_type: &str, body: &[u8]) -> Result<ClassifiedEvent, ClassificationError> {
    let payload: NoteHookPayload = parse_payload(event_type, body)?;
    let project_id = non_zero_project(event_type, payload.project_id)?;

    let noteable_type = payload
        .object_attributes
        .noteable_type
        .as_deref()
        .unwrap_or(MERGE_REQUEST_NOTEABLE);

    // Comments on issues, commits, and snippets have nothing to run a pipeline for.
    let merge_request = match payload.merge_request {
        Some(merge_request) if noteable_type == MERGE_REQUEST_NOTEABLE => merge_request,
        _ => {
            return Ok(ClassifiedEvent::Unsupported {
                event_type: format!("{} ({})", event_type, noteable_type),
            })
        }
    };

    Ok(ClassifiedEvent::Comment(CommentEvent {
        project_id,
        merge_request_iid: MergeRequestIid::new(merge_request.iid),
        merge_request_id: MergeRequestId::new(merge_request.id),
        source_branch: merge_request.source_branch,
        author_id: UserId::new(payload.user.id),
        comment: payload.object_attributes.note,
        discussion_id: payload
            .object_attributes
            .discussion_id
            .filter(|id| !id.is_empty()),
    }))
}

fn parse_payload<T: DeserializeOwned>(
    event_type: &str,
    body: &[u8],
) -> Result<T, ClassificationError> {
    serde_json::from_slice(body).map_err(|e| ClassificationError::MalformedPayload {
        event_type: event_type.to_string(),
        message: e.to_string(),
    })
}

fn non_zero_project(event_type: &str, id: u64) -> Result<ProjectId, ClassificationError> {
    if id == 0 {
        return Err(ClassificationError::MalformedPayload {
            event_type: event_type.to_string(),
            message: "project id is zero".to_string(),
        });
    }
    Ok(ProjectId::new(id))
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
