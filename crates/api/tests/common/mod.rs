#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use civic_auth_api::bootstrap;
use civic_auth_api::config::{BootstrapAdmin, ServerConfig};
use civic_auth_api::router::build_app_router;
use civic_auth_api::state::AppState;
use civic_db::store::MemoryAuthStore;
use civic_db::AuthStore;

pub const ADMIN_EMAIL: &str = "admin@civic.test";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const PASSWORD: &str = "resident-password";

/// Build a test `ServerConfig` with safe defaults and a bootstrap admin.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        bootstrap_admin: Some(BootstrapAdmin {
            email: ADMIN_EMAIL.into(),
            password: ADMIN_PASSWORD.into(),
        }),
        ..ServerConfig::default()
    }
}

/// A router over a seeded in-memory store, plus the store for direct setup.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn AuthStore>,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application with the production middleware stack over a
/// seeded [`MemoryAuthStore`].
pub async fn build_test_app() -> TestApp {
    let config = test_config();
    let store: Arc<dyn AuthStore> = Arc::new(MemoryAuthStore::new());
    bootstrap::prepare_store(store.as_ref(), &config)
        .await
        .expect("store preparation should succeed");

    let router = build_app_router(AppState::new(Arc::clone(&store), config.clone()), &config);
    TestApp { router, store }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a request with the given method, headers and optional JSON body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, &[], None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let auth = format!("Token {token}");
    send(app, Method::GET, uri, &[("authorization", auth.as_str())], None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, &[], Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    let auth = format!("Token {token}");
    send(app, Method::POST, uri, &[("authorization", auth.as_str())], Some(body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    let auth = format!("Token {token}");
    send(app, Method::PUT, uri, &[("authorization", auth.as_str())], Some(body)).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Flow helpers
// ---------------------------------------------------------------------------

/// Log in through the API and return the plaintext token.
pub async fn login(app: Router, email: &str, password: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": password });
    let response = post_json(app, "/api/auth/user/login/", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"]
        .as_str()
        .expect("login response must contain a token")
        .to_string()
}

pub async fn admin_token(app: Router) -> String {
    login(app, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

/// Sign up a user with the given types and log them in.
pub async fn user_token(app: Router, email: &str, user_types: &[&str]) -> String {
    let body = serde_json::json!({
        "email": email,
        "password": PASSWORD,
        "first_name": "Test",
        "last_name": "User",
        "user_type_names": user_types,
    });
    let response = post_json(app.clone(), "/api/auth/user/sign-up/", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    login(app, email, PASSWORD).await
}

/// Register an application as admin and return `(id, plaintext key)`.
pub async fn create_application(app: Router, admin: &str, name: &str) -> (i64, String) {
    let body = serde_json::json!({ "name": name });
    let response = post_json_auth(app, "/api/auth/application/", body, admin).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    (
        json["data"]["id"].as_i64().unwrap(),
        json["data"]["api_key"].as_str().unwrap().to_string(),
    )
}
