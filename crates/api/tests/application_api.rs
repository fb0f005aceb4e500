//! HTTP-level tests for application registration and the application
//! permission check.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    admin_token, body_json, create_application, get, get_auth, post_json_auth, put_json_auth,
    send, user_token,
};
use serde_json::json;

const CHECK: &str = "/api/auth/application/check_application_permission/";

async fn check(app: axum::Router, key: &str, resource: &str, method: Option<&str>) -> axum::http::Response<axum::body::Body> {
    let mut headers = vec![("x-api-key", key), ("x-resource", resource)];
    if let Some(m) = method {
        headers.push(("x-method", m));
    }
    send(app, Method::POST, CHECK, &headers, None).await
}

async fn grant(test: &common::TestApp, admin: &str, id: i64, resource: &str, levels: &[&str]) {
    let response = put_json_auth(
        test.app(),
        &format!("/api/auth/application/{id}/permissions"),
        json!({ "resource": resource, "permissions": levels }),
        admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Registration and key management
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_returns_plaintext_key_once() {
    let test = common::build_test_app().await;
    let admin = admin_token(test.app()).await;
    let (_, key) = create_application(test.app(), &admin, "citizen-portal").await;
    assert!(key.len() >= 32);

    let response = get_auth(test.app(), "/api/auth/application/", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let listed = &json["data"][0];
    assert_eq!(listed["name"], "citizen-portal");
    assert_ne!(listed["api_key"], key.as_str());
    assert!(listed.get("api_key_hash").is_none());
}

#[tokio::test]
async fn duplicate_name_is_a_conflict() {
    let test = common::build_test_app().await;
    let admin = admin_token(test.app()).await;
    create_application(test.app(), &admin, "portal").await;

    let response =
        post_json_auth(test.app(), "/api/auth/application/", json!({ "name": "portal" }), &admin)
            .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[tokio::test]
async fn application_admin_requires_admin_user() {
    let test = common::build_test_app().await;

    let response = get(test.app(), "/api/auth/application/").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let resident = user_token(test.app(), "res@example.org", &["resident"]).await;
    let response = get_auth(test.app(), "/api/auth/application/", &resident).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Admin privileges required");
}

#[tokio::test]
async fn rotation_invalidates_the_old_key() {
    let test = common::build_test_app().await;
    let admin = admin_token(test.app()).await;
    let (id, old_key) = create_application(test.app(), &admin, "portal").await;
    grant(&test, &admin, id, "waste-services", &["read"]).await;

    let response = post_json_auth(
        test.app(),
        &format!("/api/auth/application/{id}/rotate"),
        json!({}),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let new_key = body_json(response).await["data"]["api_key"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(new_key, old_key);

    let response = check(test.app(), &old_key, "waste-services", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = check(test.app(), &new_key, "waste-services", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_levels_are_rejected() {
    let test = common::build_test_app().await;
    let admin = admin_token(test.app()).await;
    let (id, _) = create_application(test.app(), &admin, "portal").await;

    let response = put_json_auth(
        test.app(),
        &format!("/api/auth/application/{id}/permissions"),
        json!({ "resource": "waste-services", "permissions": ["read", "superuser"] }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deactivated_application_is_refused() {
    let test = common::build_test_app().await;
    let admin = admin_token(test.app()).await;
    let (id, key) = create_application(test.app(), &admin, "portal").await;
    grant(&test, &admin, id, "waste-services", &["read"]).await;

    let auth = format!("Token {admin}");
    let response = send(
        test.app(),
        Method::PATCH,
        &format!("/api/auth/application/{id}"),
        &[("authorization", auth.as_str())],
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_active"], false);

    let response = check(test.app(), &key, "waste-services", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Invalid API Key");
}

// ---------------------------------------------------------------------------
// Permission check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn check_maps_method_to_level() {
    let test = common::build_test_app().await;
    let admin = admin_token(test.app()).await;
    let (id, key) = create_application(test.app(), &admin, "portal").await;
    grant(&test, &admin, id, "waste-services", &["read", "write"]).await;

    let response = check(test.app(), &key, "waste-services", Some("post")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "authorised");
    assert_eq!(json["application"], "portal");
    assert_eq!(json["resource"], "waste-services");
    assert_eq!(json["permission"], "write");

    let response = check(test.app(), &key, "waste-services", Some("DELETE")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["error"],
        "Permission denied, insufficient permissions"
    );
}

#[tokio::test]
async fn check_without_grant_or_key() {
    let test = common::build_test_app().await;
    let admin = admin_token(test.app()).await;
    let (_, key) = create_application(test.app(), &admin, "portal").await;

    let response = check(test.app(), &key, "waste-services", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["error"],
        "Permission denied, resource permission not found"
    );

    let response = send(
        test.app(),
        Method::POST,
        CHECK,
        &[("x-resource", "waste-services")],
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Missing API key");

    let response = check(test.app(), "not-a-key", "waste-services", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn validate_reports_application_identity() {
    let test = common::build_test_app().await;
    let admin = admin_token(test.app()).await;
    let (id, key) = create_application(test.app(), &admin, "portal").await;

    let response = send(
        test.app(),
        Method::POST,
        "/api/auth/application/validate",
        &[("x-api-key", key.as_str())],
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "valid");
    assert_eq!(json["application"]["id"], id);
    assert_eq!(json["application"]["name"], "portal");

    let response = send(
        test.app(),
        Method::POST,
        "/api/auth/application/validate",
        &[("x-api-key", "")],
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid API key");
}
