//! Tests for the trigger rules.

use super::*;
use crate::gateway::{CurrentUser, MockGitLabGateway};
use gitlab_bot_sdk::{ApiError, UserId};
use mockall::predicate::eq;

const PROJECT: u64 = 44723537;
const BOT_USER: u64 = 777;

// ============================================================================
// Test helpers
// ============================================================================

fn merge_request_event(action: MergeRequestAction) -> ClassifiedEvent {
    ClassifiedEvent::MergeRequest(MergeRequestEvent {
        project_id: ProjectId::new(PROJECT),
        merge_request_iid: MergeRequestIid::new(8),
        merge_request_id: MergeRequestId::new(215484580),
        source_branch: "feature-x".to_string(),
        target_branch: "main".to_string(),
        action,
    })
}

fn comment_event(author: u64, comment: &str) -> ClassifiedEvent {
    ClassifiedEvent::Comment(CommentEvent {
        project_id: ProjectId::new(PROJECT),
        merge_request_iid: MergeRequestIid::new(8),
        merge_request_id: MergeRequestId::new(215484580),
        source_branch: "feature-x".to_string(),
        author_id: UserId::new(author),
        comment: comment.to_string(),
        discussion_id: Some("6a9c1750b37d".to_string()),
    })
}

fn gateway_as_bot() -> MockGitLabGateway {
    let mut gateway = MockGitLabGateway::new();
    gateway.expect_current_user().returning(|| {
        Ok(CurrentUser {
            id: UserId::new(BOT_USER),
            username: "project_44723537_bot".to_string(),
        })
    });
    gateway
}

// ============================================================================
// Merge request events
// ============================================================================

mod merge_requests {
    use super::*;

    #[tokio::test]
    async fn test_open_on_existing_branch_triggers() {
        let mut gateway = MockGitLabGateway::new();
        gateway
            .expect_branch_exists()
            .withf(|project, branch| *project == ProjectId::new(PROJECT) && branch == "feature-x")
            .times(1)
            .returning(|_, _| Ok(true));
        gateway
            .expect_is_mergeable()
            .with(eq(ProjectId::new(PROJECT)), eq(MergeRequestIid::new(8)))
            .times(1)
            .returning(|_, _| Ok(true));

        let decision = decide(&merge_request_event(MergeRequestAction::Open), &gateway)
            .await
            .unwrap();

        assert!(decision.should_trigger);
        assert_eq!(decision.canonical_event_name, "merge_request_opened");
        assert_eq!(decision.branch, "feature-x");
        assert_eq!(decision.project_id, Some(ProjectId::new(PROJECT)));
        assert_eq!(decision.is_mergeable, Some(true));
        assert!(decision.command.is_none());
        assert!(decision.suppress_reason.is_none());
    }

    #[tokio::test]
    async fn test_update_is_suppressed_without_gateway_calls() {
        // No expectations: any gateway call panics.
        let gateway = MockGitLabGateway::new();

        let decision = decide(&merge_request_event(MergeRequestAction::Update), &gateway)
            .await
            .unwrap();

        assert!(!decision.should_trigger);
        assert_eq!(
            decision.suppress_reason,
            Some(SuppressReason::HandledUpstream)
        );
        assert_eq!(decision.suppress_reason.unwrap().as_str(), "handled upstream");
    }

    #[tokio::test]
    async fn test_merge_runs_on_target_branch() {
        let mut gateway = MockGitLabGateway::new();
        gateway
            .expect_branch_exists()
            .withf(|_, branch| branch == "main")
            .returning(|_, _| Ok(true));
        gateway.expect_is_mergeable().returning(|_, _| Ok(false));

        let decision = decide(&merge_request_event(MergeRequestAction::Merge), &gateway)
            .await
            .unwrap();

        assert!(decision.should_trigger);
        assert_eq!(decision.branch, "main");
        assert_eq!(decision.canonical_event_name, "merge_request_merge");
        assert_eq!(decision.is_mergeable, Some(false));
    }

    #[tokio::test]
    async fn test_merge_with_missing_target_still_triggers() {
        let mut gateway = MockGitLabGateway::new();
        gateway.expect_branch_exists().returning(|_, _| Ok(false));
        gateway.expect_is_mergeable().returning(|_, _| Ok(false));

        let decision = decide(&merge_request_event(MergeRequestAction::Merge), &gateway)
            .await
            .unwrap();

        assert!(decision.should_trigger);
        assert!(decision.suppress_reason.is_none());
    }

    #[tokio::test]
    async fn test_missing_branch_suppresses_and_records_mergeability() {
        let mut gateway = MockGitLabGateway::new();
        gateway.expect_branch_exists().returning(|_, _| Ok(false));
        gateway.expect_is_mergeable().times(1).returning(|_, _| Ok(true));

        let decision = decide(&merge_request_event(MergeRequestAction::Open), &gateway)
            .await
            .unwrap();

        assert!(!decision.should_trigger);
        assert_eq!(decision.suppress_reason, Some(SuppressReason::BranchNotFound));
        assert_eq!(decision.is_mergeable, Some(true));
        assert_eq!(
            decision.missing_branch_message(),
            "Failed to trigger pipeline. Specified branch: feature-x doesn't exist."
        );
    }

    #[tokio::test]
    async fn test_unmergeable_request_still_triggers() {
        let mut gateway = MockGitLabGateway::new();
        gateway.expect_branch_exists().returning(|_, _| Ok(true));
        gateway.expect_is_mergeable().returning(|_, _| Ok(false));

        let decision = decide(&merge_request_event(MergeRequestAction::Approved), &gateway)
            .await
            .unwrap();

        assert!(decision.should_trigger);
        assert_eq!(decision.canonical_event_name, "merge_request_approved");
        assert_eq!(decision.is_mergeable, Some(false));
    }

    #[tokio::test]
    async fn test_branch_lookup_failure_is_policy_error() {
        let mut gateway = MockGitLabGateway::new();
        gateway
            .expect_branch_exists()
            .returning(|_, _| Err(GatewayError::Api(ApiError::Timeout)));

        let err = decide(&merge_request_event(MergeRequestAction::Open), &gateway)
            .await
            .unwrap_err();

        assert_eq!(err.operation, "branch lookup");
        assert_eq!(err.project_id, ProjectId::new(PROJECT));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_mergeability_failure_is_policy_error() {
        let mut gateway = MockGitLabGateway::new();
        gateway.expect_branch_exists().returning(|_, _| Ok(true));
        gateway
            .expect_is_mergeable()
            .returning(|_, _| Err(GatewayError::Api(ApiError::NotFound)));

        let err = decide(&merge_request_event(MergeRequestAction::Close), &gateway)
            .await
            .unwrap_err();

        assert_eq!(err.operation, "mergeability lookup");
        assert!(!err.is_transient());
    }
}

// ============================================================================
// Comment events
// ============================================================================

mod comments {
    use super::*;

    #[tokio::test]
    async fn test_command_comment_triggers() {
        let mut gateway = gateway_as_bot();
        gateway.expect_is_mergeable().times(1).returning(|_, _| Ok(true));

        let decision = decide(&comment_event(13159253, "digger plan"), &gateway)
            .await
            .unwrap();

        assert!(decision.should_trigger);
        assert_eq!(decision.canonical_event_name, "merge_request_commented");
        assert_eq!(decision.command.as_deref(), Some("digger plan"));
        assert_eq!(decision.discussion_id.as_deref(), Some("6a9c1750b37d"));
        assert_eq!(decision.branch, "feature-x");
        assert_eq!(decision.is_mergeable, Some(true));
    }

    #[tokio::test]
    async fn test_own_comment_is_suppressed() {
        let gateway = gateway_as_bot();

        let decision = decide(&comment_event(BOT_USER, "digger plan"), &gateway)
            .await
            .unwrap();

        assert!(!decision.should_trigger);
        assert_eq!(decision.suppress_reason, Some(SuppressReason::SelfAuthored));
        assert!(decision.is_mergeable.is_none());
    }

    #[tokio::test]
    async fn test_non_command_comment_is_suppressed() {
        let gateway = gateway_as_bot();

        let decision = decide(&comment_event(13159253, "please plan"), &gateway)
            .await
            .unwrap();

        assert!(!decision.should_trigger);
        assert_eq!(decision.suppress_reason, Some(SuppressReason::NotACommand));
        assert_eq!(decision.suppress_reason.unwrap().as_str(), "not-a-command");
    }

    #[tokio::test]
    async fn test_command_prefix_is_case_sensitive() {
        let gateway = gateway_as_bot();

        let decision = decide(&comment_event(13159253, "Digger plan"), &gateway)
            .await
            .unwrap();

        assert_eq!(decision.suppress_reason, Some(SuppressReason::NotACommand));
    }

    #[tokio::test]
    async fn test_current_user_failure_is_policy_error() {
        let mut gateway = MockGitLabGateway::new();
        gateway
            .expect_current_user()
            .returning(|| Err(GatewayError::Api(ApiError::AuthenticationFailed)));

        let err = decide(&comment_event(1, "digger plan"), &gateway)
            .await
            .unwrap_err();

        assert_eq!(err.operation, "current user lookup");
    }
}

#[tokio::test]
async fn test_unsupported_event_is_suppressed() {
    let gateway = MockGitLabGateway::new();
    let event = ClassifiedEvent::Unsupported {
        event_type: "Push Hook".to_string(),
    };

    let decision = decide(&event, &gateway).await.unwrap();

    assert!(!decision.should_trigger);
    assert!(decision.project_id.is_none());
    assert_eq!(
        decision.suppress_reason,
        Some(SuppressReason::UnsupportedEventKind)
    );
}
