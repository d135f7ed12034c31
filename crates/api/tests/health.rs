//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, FakeInference, FakeStore};

fn app_with(store: FakeStore) -> axum::Router {
    build_test_app(Arc::new(store), Arc::new(FakeInference::replying("{}")))
}

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 with expected JSON fields
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let response = get(app_with(FakeStore::default()), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["store_healthy"], true);
}

#[tokio::test]
async fn health_check_reports_degraded_store() {
    let response = get(app_with(FakeStore::failing()), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["store_healthy"], false);
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let response = get(app_with(FakeStore::default()), "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let response = get(app_with(FakeStore::default()), "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");

    // MakeRequestUuid produces a hyphenated UUID.
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

// ---------------------------------------------------------------------------
// Test: configured origins are allowed by CORS, others are not
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_allows_configured_origin_only() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    for (origin, allowed) in [("http://localhost:3000", true), ("http://evil.test", false)] {
        let request = Request::builder()
            .uri("/health")
            .header("origin", origin)
            .body(Body::empty())
            .unwrap();

        let response = app_with(FakeStore::default()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").is_some(),
            allowed,
            "origin: {origin}"
        );
    }
}
