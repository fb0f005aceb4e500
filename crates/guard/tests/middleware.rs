//! The guard middleware over a stub checker, driven with `oneshot`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Extension;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};
use civic_core::permission::PermissionLevel;
use civic_core::protocol::{
    ApplicationAuthorization, AuthenticatedUser, UserAuthorization, STATUS_AUTHORISED,
};
use civic_guard::middleware::guard;
use civic_guard::{
    AuthContext, GuardError, GuardState, PermissionChecker, RequireUser, UserPermissionRequest,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Accepts API key `good-key` and token `good-token`; records methods seen.
#[derive(Default)]
struct StubChecker {
    methods: Mutex<Vec<String>>,
}

#[async_trait]
impl PermissionChecker for StubChecker {
    async fn check_application(
        &self,
        api_key: &str,
        resource: &str,
        method: &str,
    ) -> Result<ApplicationAuthorization, GuardError> {
        self.methods.lock().unwrap().push(method.to_string());
        if api_key != "good-key" {
            return Err(GuardError::Forbidden("Invalid API Key".into()));
        }
        Ok(ApplicationAuthorization {
            status: STATUS_AUTHORISED.into(),
            application: "portal".into(),
            resource: resource.into(),
            permission: PermissionLevel::Read,
        })
    }

    async fn check_user(
        &self,
        request: UserPermissionRequest<'_>,
    ) -> Result<UserAuthorization, GuardError> {
        self.methods.lock().unwrap().push(request.method.to_string());
        if request.token != "good-token" {
            return Err(GuardError::Unauthorized("Invalid authentication token".into()));
        }
        Ok(UserAuthorization::authenticated(
            AuthenticatedUser {
                id: 42,
                email: "res@example.org".into(),
            },
            PermissionLevel::Write,
            vec!["resident".into()],
        ))
    }
}

async fn whoami(RequireUser(user): RequireUser) -> Json<Value> {
    Json(json!({ "id": user.id }))
}

async fn context(Extension(ctx): Extension<AuthContext>) -> Json<Value> {
    Json(json!({
        "app": ctx.app.map(|a| a.application),
        "user": ctx.user.and_then(|u| u.user().map(|u| u.id)),
    }))
}

fn app(checker: Arc<StubChecker>) -> Router {
    Router::new()
        .route("/bins", get(context).post(context))
        .route("/me", get(whoami))
        .layer(from_fn_with_state(
            GuardState::new(checker, "waste-services", "bin"),
            guard,
        ))
}

async fn call(router: Router, method: &str, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_credentials_is_401_json() {
    let (status, body) = call(app(Arc::default()), "GET", "/bins", &[]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication failed");
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn application_only_reaches_handler() {
    let (status, body) = call(app(Arc::default()), "GET", "/bins", &[("x-api-key", "good-key")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["app"], "portal");
    assert_eq!(body["user"], Value::Null);
}

#[tokio::test]
async fn bad_key_without_token_keeps_the_403() {
    let (status, body) = call(app(Arc::default()), "GET", "/bins", &[("x-api-key", "bad")]).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid API Key");
}

#[tokio::test]
async fn user_route_needs_a_user() {
    let (status, body) = call(app(Arc::default()), "GET", "/me", &[("x-api-key", "good-key")]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User authentication required");

    let (status, body) = call(
        app(Arc::default()),
        "GET",
        "/me",
        &[("x-api-key", "bad"), ("authorization", "Token good-token")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 42);
}

#[tokio::test]
async fn request_method_is_forwarded() {
    let checker = Arc::new(StubChecker::default());
    let (status, _) = call(
        app(Arc::clone(&checker)),
        "POST",
        "/bins",
        &[("authorization", "Token good-token")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(*checker.methods.lock().unwrap(), vec!["POST".to_string()]);
}
