//! Carries out a [`TriggerDecision`] against GitLab.

use gitlab_bot_sdk::{MergeRequestIid, ProjectId};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::gateway::{CreatedPipeline, GatewayError, GitLabGateway};
use crate::policy::{SuppressReason, TriggerDecision};
use crate::variables::PipelineVariableSet;

/// A GitLab write made while executing a decision failed.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Failed to create pipeline for project {project_id} on branch '{branch}': {source}")]
    PipelineCreation {
        project_id: ProjectId,
        branch: String,
        #[source]
        source: GatewayError,
    },

    #[error("Failed to post comment on merge request !{merge_request_iid} in project {project_id}: {source}")]
    DiscussionCreation {
        project_id: ProjectId,
        merge_request_iid: MergeRequestIid,
        #[source]
        source: GatewayError,
    },
}

impl TriggerError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::PipelineCreation { source, .. } => source.is_transient(),
            Self::DiscussionCreation { source, .. } => source.is_transient(),
        }
    }
}

/// What [`execute`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    PipelineCreated(CreatedPipeline),
    /// The missing-branch comment was posted.
    FailureReported,
    /// Nothing to do.
    Skipped,
}

/// Execute a decision: create the pipeline, or report a missing branch.
///
/// Suppressed decisions other than a missing branch do nothing and succeed.
/// Nothing is retried.
///
/// # Errors
///
/// Returns [`TriggerError`] if posting the comment or creating the pipeline
/// fails.
#[instrument(skip(decision, gateway), fields(
    project_id = ?decision.project_id,
    branch = %decision.branch,
    should_trigger = decision.should_trigger,
))]
pub async fn execute(
    decision: &TriggerDecision,
    gateway: &dyn GitLabGateway,
) -> Result<TriggerOutcome, TriggerError> {
    let project_id = match decision.project_id {
        Some(project_id) => project_id,
        None => return Ok(TriggerOutcome::Skipped),
    };

    if !decision.should_trigger {
        if decision.suppress_reason != Some(SuppressReason::BranchNotFound) {
            return Ok(TriggerOutcome::Skipped);
        }

        let message = decision.missing_branch_message();
        gateway
            .create_discussion(project_id, decision.merge_request_iid, &message)
            .await
            .map_err(|source| {
                error!(error = %source, "Failed to publish missing branch comment");
                TriggerError::DiscussionCreation {
                    project_id,
                    merge_request_iid: decision.merge_request_iid,
                    source,
                }
            })?;

        info!("Reported missing branch on merge request");
        return Ok(TriggerOutcome::FailureReported);
    }

    let variables = PipelineVariableSet::from_decision(decision);
    for (key, value) in variables.iter() {
        debug!(key = %key, value = %value, "Pipeline variable");
    }

    let pipeline = gateway
        .create_pipeline(project_id, &decision.branch, &variables)
        .await
        .map_err(|source| {
            error!(error = %source, "Failed to create pipeline");
            TriggerError::PipelineCreation {
                project_id,
                branch: decision.branch.clone(),
                source,
            }
        })?;

    info!(
        pipeline_id = pipeline.id,
        event_name = %decision.canonical_event_name,
        "Triggered pipeline"
    );

    Ok(TriggerOutcome::PipelineCreated(pipeline))
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
