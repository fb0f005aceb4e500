//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, get, send};

// ---------------------------------------------------------------------------
// Test: GET /health reports the store backend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let test = common::build_test_app().await;
    let response = get(test.app(), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["store_healthy"], true);
    assert_eq!(json["store_backend"], "memory");
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let test = common::build_test_app().await;
    let response = get(test.app(), "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let test = common::build_test_app().await;
    let response = get(test.app(), "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

// ---------------------------------------------------------------------------
// Test: CORS preflight allows the protocol headers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_preflight_allows_protocol_headers() {
    let test = common::build_test_app().await;
    let response = send(
        test.app(),
        Method::OPTIONS,
        "/api/auth/user/check-user-permission/",
        &[
            ("origin", "http://localhost:5173"),
            ("access-control-request-method", "POST"),
            ("access-control-request-headers", "x-resource,x-sub-resource"),
        ],
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let allowed = response
        .headers()
        .get("access-control-allow-headers")
        .unwrap()
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("x-sub-resource"));
    assert!(allowed.contains("x-api-key"));
}
