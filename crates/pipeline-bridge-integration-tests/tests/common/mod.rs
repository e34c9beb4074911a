//! Common test utilities for pipeline bridge integration tests
//!
//! This module provides:
//! - A wiremock-backed GitLab with helpers to mount the REST endpoints
//! - A router wired to the real GitLab client and bridge
//! - GitLab webhook payload builders

use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use gitlab_bot_sdk::auth::{AccessToken, CredentialMap};
use gitlab_bot_sdk::client::{ClientConfig, GitLabClient};
use pipeline_bridge_api::{create_router, AppState, ServiceConfig};
use pipeline_bridge_core::gateway::GitLabGatewayProvider;
use pipeline_bridge_core::WebhookBridge;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROJECT_ID: u64 = 44723537;
pub const MERGE_REQUEST_IID: u64 = 8;
pub const WEBHOOK_SECRET: &str = "integration-secret";
pub const ACCESS_TOKEN: &str = "glpat-integration";
pub const BOT_USER_ID: u64 = 777;

// ============================================================================
// Application wiring
// ============================================================================

/// Build the router against a mock GitLab, authenticating with one token.
pub fn create_app(gitlab: &MockServer) -> Router {
    let mut config = ServiceConfig::default();
    config.gitlab.api_url = gitlab.uri();
    config.gitlab.token = Some(ACCESS_TOKEN.to_string());
    config.webhook.secret_token = Some(WEBHOOK_SECRET.to_string());

    create_app_with_credentials(
        config,
        CredentialMap::single(AccessToken::new(ACCESS_TOKEN)),
    )
}

/// Build the router from explicit configuration and credentials.
pub fn create_app_with_credentials(config: ServiceConfig, credentials: CredentialMap) -> Router {
    let client_config = ClientConfig::default().with_api_url(config.gitlab.api_url.clone());
    let client = GitLabClient::new(client_config, credentials).unwrap();
    let bridge = WebhookBridge::new(
        config.webhook.secret_token.clone(),
        Arc::new(GitLabGatewayProvider::new(client)),
    );

    create_router(AppState::new(config, Arc::new(bridge)))
}

// ============================================================================
// Mock GitLab endpoints
// ============================================================================

pub fn project_path(suffix: &str) -> String {
    format!("/projects/{}{}", PROJECT_ID, suffix)
}

pub async fn mount_branch(gitlab: &MockServer, branch: &str, exists: bool) {
    let response = if exists {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": branch,
            "merged": false,
            "protected": false,
            "default": false,
            "commit": { "id": "6104942438c14ec7bd21c6cd5bd995272b3faff6" }
        }))
    } else {
        ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "404 Branch Not Found"
        }))
    };

    Mock::given(method("GET"))
        .and(path(project_path(&format!("/repository/branches/{}", branch))))
        .and(header("PRIVATE-TOKEN", ACCESS_TOKEN))
        .respond_with(response)
        .mount(gitlab)
        .await;
}

pub async fn mount_merge_request(gitlab: &MockServer, detailed_merge_status: &str) {
    Mock::given(method("GET"))
        .and(path(project_path(&format!(
            "/merge_requests/{}",
            MERGE_REQUEST_IID
        ))))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 215484580,
            "iid": MERGE_REQUEST_IID,
            "project_id": PROJECT_ID,
            "title": "Add login",
            "state": "opened",
            "source_branch": "feature-x",
            "target_branch": "main",
            "merge_status": "can_be_merged",
            "detailed_merge_status": detailed_merge_status
        })))
        .mount(gitlab)
        .await;
}

pub async fn mount_current_user(gitlab: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": BOT_USER_ID,
            "username": "project_44723537_bot",
            "name": "Pipeline Bridge",
            "state": "active",
            "bot": true
        })))
        .mount(gitlab)
        .await;
}

// ============================================================================
// Webhook payloads
// ============================================================================

pub fn merge_request_hook(action: &str, source_branch: &str) -> String {
    serde_json::json!({
        "object_kind": "merge_request",
        "event_type": "merge_request",
        "user": { "id": 13159253, "username": "alice" },
        "project": { "id": PROJECT_ID, "name": "digger-demo" },
        "object_attributes": {
            "id": 215484580,
            "iid": MERGE_REQUEST_IID,
            "source_branch": source_branch,
            "target_branch": "main",
            "state": "opened",
            "action": action
        }
    })
    .to_string()
}

pub fn note_hook(author_id: u64, note: &str) -> String {
    serde_json::json!({
        "object_kind": "note",
        "event_type": "note",
        "project_id": PROJECT_ID,
        "user": { "id": author_id, "username": "alice" },
        "object_attributes": {
            "id": 1244,
            "note": note,
            "noteable_type": "MergeRequest",
            "discussion_id": "6a9c1750b37d"
        },
        "merge_request": {
            "id": 215484580,
            "iid": MERGE_REQUEST_IID,
            "source_branch": "feature-x",
            "target_branch": "main"
        }
    })
    .to_string()
}

pub fn webhook(event: &str, token: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("X-Gitlab-Event", event)
        .header("X-Gitlab-Token", token)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
