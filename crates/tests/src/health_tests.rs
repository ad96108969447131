use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use pretty_assertions::assert_eq;

use crate::common;

#[tokio::test]
async fn test_health_reports_memory_store() {
    let app = common::test_app();

    let (status, response) = common::get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "ok");
    assert_eq!(response["store"], "memory");
    assert_eq!(response["store_status"], "connected");
    assert!(response["version"].is_string());
}

#[tokio::test]
async fn test_docs_page_is_served() {
    let app = common::test_app();
    let req = Request::builder()
        .method("GET")
        .uri("/docs")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = common::send_raw(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("<html"));
}

#[tokio::test]
async fn test_responses_carry_a_request_id() {
    let app = common::test_app();
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (_, headers, _) = common::send_raw(&app, req).await;

    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_client_request_id_is_echoed() {
    let app = common::test_app();
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .header("x-request-id", "trace-me-123")
        .body(Body::empty())
        .unwrap();

    let (_, headers, _) = common::send_raw(&app, req).await;

    assert_eq!(headers["x-request-id"], "trace-me-123");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = common::test_app();

    let (status, _) = common::get(&app, "/api/v1/nothing-here").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
