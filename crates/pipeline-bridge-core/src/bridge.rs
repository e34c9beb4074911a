//! End-to-end handling of one webhook delivery.

use gitlab_bot_sdk::ProjectId;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::classifier::{classify, ClassificationError};
use crate::events::ClassifiedEvent;
use crate::gateway::{GatewayError, GatewayProvider};
use crate::policy::{decide, PolicyError, SuppressReason};
use crate::trigger::{execute, TriggerError, TriggerOutcome};
use crate::webhook::WebhookRequest;

/// Any failure while handling a delivery.
///
/// The `Display` text is what the HTTP adapter returns to GitLab.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error("Failed to create GitLab client for project {project_id}: {source}")]
    GatewayUnavailable {
        project_id: ProjectId,
        #[source]
        source: GatewayError,
    },

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

impl BridgeError {
    /// Check if a redelivery of the same webhook may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Classification(_) => false,
            Self::GatewayUnavailable { source, .. } => source.is_transient(),
            Self::Policy(e) => e.is_transient(),
            Self::Trigger(e) => e.is_transient(),
        }
    }
}

/// Successful result of handling a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeOutcome {
    PipelineCreated {
        project_id: ProjectId,
        branch: String,
        pipeline_id: u64,
    },
    Suppressed {
        reason: SuppressReason,
    },
    /// The event kind is not one the bridge acts on.
    Ignored {
        event_type: String,
    },
}

/// Classifies deliveries and runs the trigger rules against GitLab.
pub struct WebhookBridge {
    secret: Option<String>,
    gateways: Arc<dyn GatewayProvider>,
}

impl fmt::Debug for WebhookBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookBridge")
            .field("secret", &self.secret.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl WebhookBridge {
    /// Create a bridge. An empty or absent secret disables token checking.
    pub fn new(secret: Option<String>, gateways: Arc<dyn GatewayProvider>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            gateways,
        }
    }

    /// Whether deliveries must carry the shared secret.
    pub fn requires_token(&self) -> bool {
        self.secret.is_some()
    }

    /// Handle one delivery: classify, decide, execute.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] for authentication or payload problems and for
    /// failed GitLab calls. Suppressed and unsupported events are not errors.
    #[instrument(skip(self, request), fields(event_type = request.event_type().unwrap_or_default()))]
    pub async fn process(&self, request: &WebhookRequest) -> Result<BridgeOutcome, BridgeError> {
        let secret = self.secret.as_deref().unwrap_or_default();
        let event = classify(secret, request).map_err(|e| {
            warn!(error = %e, "Rejected webhook");
            e
        })?;

        let project_id = match &event {
            ClassifiedEvent::MergeRequest(event) => event.project_id,
            ClassifiedEvent::Comment(event) => event.project_id,
            ClassifiedEvent::Unsupported { event_type } => {
                info!(event_type = %event_type, "Skipping unsupported GitLab event");
                return Ok(BridgeOutcome::Ignored {
                    event_type: event_type.clone(),
                });
            }
        };

        let gateway = self.gateways.gateway_for(project_id).map_err(|source| {
            error!(project_id = %project_id, error = %source, "No GitLab gateway for project");
            BridgeError::GatewayUnavailable { project_id, source }
        })?;

        let decision = decide(&event, gateway.as_ref()).await.map_err(|e| {
            error!(error = %e, "Trigger decision failed");
            e
        })?;

        let outcome = execute(&decision, gateway.as_ref()).await?;

        match outcome {
            TriggerOutcome::PipelineCreated(pipeline) => Ok(BridgeOutcome::PipelineCreated {
                project_id,
                branch: decision.branch,
                pipeline_id: pipeline.id,
            }),
            TriggerOutcome::FailureReported | TriggerOutcome::Skipped => {
                let reason = decision
                    .suppress_reason
                    .unwrap_or(SuppressReason::UnsupportedEventKind);
                info!(reason = %reason, "No pipeline triggered");
                Ok(BridgeOutcome::Suppressed { reason })
            }
        }
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
