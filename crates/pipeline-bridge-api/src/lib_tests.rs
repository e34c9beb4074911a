//! Tests for webhook routing and HTTP status mapping.

use super::*;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use gitlab_bot_sdk::{MergeRequestIid, ProjectId, UserId};
use pipeline_bridge_core::gateway::{CreatedPipeline, CurrentUser};
use pipeline_bridge_core::{GatewayError, GatewayProvider, GitLabGateway, PipelineVariableSet};
use std::sync::Mutex;
use tower::ServiceExt;

const SECRET: &str = "s3cret";

// ============================================================================
// Stub gateway
// ============================================================================

/// Gateway double that reports every branch as present and records the
/// pipelines it was asked to create.
#[derive(Default)]
struct StubGateway {
    pipelines: Mutex<Vec<(String, PipelineVariableSet)>>,
}

#[async_trait]
impl GitLabGateway for StubGateway {
    async fn current_user(&self) -> Result<CurrentUser, GatewayError> {
        Ok(CurrentUser {
            id: UserId::new(1),
            username: "bridge-bot".to_string(),
        })
    }

    async fn branch_exists(&self, _project_id: ProjectId, _branch: &str) -> Result<bool, GatewayError> {
        Ok(true)
    }

    async fn is_mergeable(
        &self,
        _project_id: ProjectId,
        _merge_request_iid: MergeRequestIid,
    ) -> Result<bool, GatewayError> {
        Ok(true)
    }

    async fn create_discussion(
        &self,
        _project_id: ProjectId,
        _merge_request_iid: MergeRequestIid,
        _body: &str,
    ) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn create_pipeline(
        &self,
        _project_id: ProjectId,
        branch: &str,
        variables: &PipelineVariableSet,
    ) -> Result<CreatedPipeline, GatewayError> {
        self.pipelines
            .lock()
            .unwrap()
            .push((branch.to_string(), variables.clone()));
        Ok(CreatedPipeline {
            id: 1001,
            web_url: None,
        })
    }
}

struct StubProvider {
    gateway: Arc<StubGateway>,
}

impl GatewayProvider for StubProvider {
    fn gateway_for(&self, _project_id: ProjectId) -> Result<Arc<dyn GitLabGateway>, GatewayError> {
        Ok(self.gateway.clone())
    }
}

fn router_with(gateway: Arc<StubGateway>, config: ServiceConfig) -> Router {
    let bridge = WebhookBridge::new(
        Some(SECRET.to_string()),
        Arc::new(StubProvider { gateway }),
    );
    create_router(AppState::new(config, Arc::new(bridge)))
}

fn merge_request_body(action: &str) -> String {
    serde_json::json!({
        "object_kind": "merge_request",
        "project": { "id": 44723537 },
        "object_attributes": {
            "id": 215484580,
            "iid": 8,
            "source_branch": "feature-x",
            "target_branch": "main",
            "action": action
        }
    })
    .to_string()
}

fn webhook_request(path: &str, token: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("X-Gitlab-Event", "Merge Request Hook")
        .header("X-Gitlab-Token", token)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ============================================================================
// Webhook endpoint
// ============================================================================

mod webhook_tests {
    use super::*;

    #[tokio::test]
    async fn test_opened_merge_request_returns_empty_ok() {
        let gateway = Arc::new(StubGateway::default());
        let app = router_with(gateway.clone(), ServiceConfig::default());

        let response = app
            .oneshot(webhook_request("/webhook", SECRET, merge_request_body("open")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.is_empty());

        let pipelines = gateway.pipelines.lock().unwrap();
        assert_eq!(pipelines.len(), 1);
        assert_eq!(pipelines[0].0, "feature-x");
        assert_eq!(
            pipelines[0].1.get("MERGE_REQUEST_EVENT_NAME"),
            Some("merge_request_opened")
        );
    }

    #[tokio::test]
    async fn test_suppressed_event_returns_ok() {
        let gateway = Arc::new(StubGateway::default());
        let app = router_with(gateway.clone(), ServiceConfig::default());

        let response = app
            .oneshot(webhook_request("/webhook", SECRET, merge_request_body("update")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(gateway.pipelines.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_token_returns_500_with_message() {
        let gateway = Arc::new(StubGateway::default());
        let app = router_with(gateway.clone(), ServiceConfig::default());

        let response = app
            .oneshot(webhook_request("/webhook", "guess", merge_request_body("open")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Token validation failed");
        assert!(gateway.pipelines.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_returns_500() {
        let app = router_with(Arc::new(StubGateway::default()), ServiceConfig::default());

        let response = app
            .oneshot(webhook_request("/webhook", SECRET, "{not json".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response)
            .await
            .starts_with("Failed to parse 'Merge Request Hook' payload"));
    }

    #[tokio::test]
    async fn test_custom_endpoint_path() {
        let mut config = ServiceConfig::default();
        config.webhook.endpoint_path = "/hooks/gitlab".to_string();
        let app = router_with(Arc::new(StubGateway::default()), config);

        let response = app
            .clone()
            .oneshot(webhook_request("/hooks/gitlab", SECRET, merge_request_body("open")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(webhook_request("/webhook", SECRET, merge_request_body("open")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let mut config = ServiceConfig::default();
        config.server.max_body_size = 16;
        let gateway = Arc::new(StubGateway::default());
        let app = router_with(gateway.clone(), config);

        let response = app
            .oneshot(webhook_request("/webhook", SECRET, merge_request_body("open")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(gateway.pipelines.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_on_webhook_is_not_allowed() {
        let app = router_with(Arc::new(StubGateway::default()), ServiceConfig::default());

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/webhook")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

// ============================================================================
// Health endpoint
// ============================================================================

#[tokio::test]
async fn test_health_reports_version() {
    let app = router_with(Arc::new(StubGateway::default()), ServiceConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}
