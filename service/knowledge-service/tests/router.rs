//! Router-level integration tests (spec.md §6 route table), driven through
//! `tower::ServiceExt::oneshot` the way `axum`'s own router tests are
//! written — no real socket, no embedder/workflow backend needed.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use knowledge_connectors::ConnectorRegistry;
use knowledge_service::config::{Config, NodeEnv, WorkflowConfig};
use knowledge_service::{build_router, AppState};
use serde_json::Value;
use tower::ServiceExt;

fn test_config(api_key: Option<&str>) -> Config {
    Config {
        node_env: NodeEnv::Test,
        port: 0,
        api_prefix: "api/v1".to_string(),
        api_key: api_key.map(str::to_string),
        kv_url: None,
        workflow: WorkflowConfig {
            address: "localhost:7233".to_string(),
            namespace: "default".to_string(),
            task_queue: "knowledge-indexing".to_string(),
        },
        index_backend_url: None,
        index_name: "knowledge-items".to_string(),
        embedder: None,
        reranker: None,
    }
}

fn test_state(api_key: Option<&str>) -> AppState {
    AppState::new(test_config(api_key), ConnectorRegistry::new())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

#[tokio::test]
async fn health_reports_ok_without_authentication() {
    let router = build_router(test_state(None));
    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn guarded_route_rejects_missing_api_key() {
    let router = build_router(test_state(Some("secret")));
    let response = router
        .oneshot(Request::builder().uri("/api/v1/index/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn guarded_route_accepts_matching_api_key() {
    let router = build_router(test_state(Some("secret")));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/index/status")
                .header("x-api-key", "secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unconfigured_service_has_no_api_key_requirement() {
    let router = build_router(test_state(None));
    let response = router
        .oneshot(Request::builder().uri("/api/v1/index/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn index_rejects_unknown_source() {
    let router = build_router(test_state(None));
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/index/not-a-real-source")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_requires_query_param() {
    let router = build_router(test_state(None));
    let response = router
        .oneshot(Request::builder().uri("/api/v1/search").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_against_empty_index_returns_no_hits() {
    let router = build_router(test_state(None));
    let response = router
        .oneshot(Request::builder().uri("/api/v1/search?q=hello").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn navigate_rejects_unknown_direction() {
    let router = build_router(test_state(None));
    let payload = serde_json::json!({ "id": "wiki:doc-1", "direction": "sideways" });
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/navigate")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn workflows_list_reports_idle_sources() {
    let router = build_router(test_state(None));
    let response = router
        .oneshot(Request::builder().uri("/api/v1/workflows").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
