//! The HTTP client against a real auth service on a local port, compared
//! with the in-process checker over the same store.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Utc;
use civic_auth_api::bootstrap;
use civic_auth_api::config::ServerConfig;
use civic_auth_api::router::build_app_router;
use civic_auth_api::state::AppState;
use civic_core::api_keys::{generate_api_key, key_expiry, DEFAULT_KEY_TTL_DAYS};
use civic_core::permission::PermissionLevel;
use civic_core::tokens::{generate_token, token_expiry};
use civic_db::models::application::NewApplication;
use civic_db::models::token::NewUserToken;
use civic_db::models::user::NewUser;
use civic_db::store::MemoryAuthStore;
use civic_db::{AuthStore, PermissionResolver};
use civic_guard::{
    AuthServiceClient, GuardConfig, GuardError, LocalChecker, PermissionChecker,
    UserPermissionRequest,
};

struct Service {
    store: Arc<dyn AuthStore>,
    url: String,
}

/// Start the auth service on `127.0.0.1:0` over a seeded memory store.
async fn spawn_service() -> Service {
    let config = ServerConfig::default();
    let store: Arc<dyn AuthStore> = Arc::new(MemoryAuthStore::new());
    bootstrap::prepare_store(store.as_ref(), &config).await.unwrap();

    let app = build_app_router(AppState::new(Arc::clone(&store), config.clone()), &config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Service {
        store,
        url: format!("http://{addr}"),
    }
}

/// An application with read on `waste-services`; returns its key.
async fn application(store: &dyn AuthStore) -> String {
    let key = generate_api_key();
    let app = store
        .create_application(NewApplication {
            name: "portal".into(),
            api_key_hash: key.hash,
            api_key_prefix: key.prefix,
            api_key_expires_at: key_expiry(Utc::now(), DEFAULT_KEY_TTL_DAYS),
        })
        .await
        .unwrap();
    let resource = store.find_resource("waste-services").await.unwrap().unwrap();
    store
        .upsert_application_grant(app.id, resource.id, &[PermissionLevel::Read])
        .await
        .unwrap();
    key.plaintext
}

/// A resident with a live token; returns the token.
async fn resident_token(store: &dyn AuthStore) -> String {
    let resident = store.find_user_type("resident").await.unwrap().unwrap();
    let user = store
        .create_user(
            NewUser {
                email: "res@example.org".into(),
                password_hash: "unused".into(),
                first_name: String::new(),
                last_name: String::new(),
                is_admin: false,
            },
            &[resident.id],
        )
        .await
        .unwrap();
    let token = generate_token();
    store
        .create_token(NewUserToken {
            user_id: user.id,
            token_key: token.prefix,
            token_hash: token.hash,
            expires_at: token_expiry(Utc::now(), 10),
        })
        .await
        .unwrap();
    token.plaintext
}

fn client(url: &str) -> AuthServiceClient {
    AuthServiceClient::new(&GuardConfig::new(url)).unwrap()
}

fn user_request<'a>(token: &'a str, sub: &'a str, method: &'a str) -> UserPermissionRequest<'a> {
    UserPermissionRequest {
        token,
        api_key: None,
        resource: "waste-services",
        sub_resource: sub,
        method,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remote_and_local_checkers_agree() {
    let service = spawn_service().await;
    let key = application(service.store.as_ref()).await;
    let token = resident_token(service.store.as_ref()).await;

    let remote = client(&service.url);
    let local = LocalChecker::new(PermissionResolver::new(Arc::clone(&service.store)));
    let checkers: [&dyn PermissionChecker; 2] = [&remote, &local];

    for checker in checkers {
        let app = checker
            .check_application(&key, "waste-services", "GET")
            .await
            .unwrap();
        assert_eq!(app.application, "portal");
        assert_eq!(app.permission, PermissionLevel::Read);

        assert_eq!(
            checker.check_application(&key, "waste-services", "POST").await,
            Err(GuardError::Forbidden(
                "Permission denied, insufficient permissions".into()
            ))
        );

        let user = checker
            .check_user(user_request(&token, "bin", "PUT"))
            .await
            .unwrap();
        assert_eq!(user.permission(), PermissionLevel::Write);
        assert_eq!(user.user().map(|u| u.email.as_str()), Some("res@example.org"));

        assert_eq!(
            checker
                .check_user(user_request("bogus", "modify-schedule", "GET"))
                .await,
            Err(GuardError::Unauthorized("Invalid authentication token".into()))
        );
    }
}

#[tokio::test]
async fn missing_key_becomes_unauthorized() {
    let service = spawn_service().await;
    let remote = client(&service.url);
    assert_eq!(
        remote.check_application("", "waste-services", "GET").await,
        Err(GuardError::Unauthorized("Missing API key".into()))
    );
}

#[tokio::test]
async fn silent_service_times_out() {
    // Bound but never accepting: the connection queues and no response comes.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = GuardConfig {
        timeout: Duration::from_millis(200),
        ..GuardConfig::new(format!("http://{}", listener.local_addr().unwrap()))
    };
    let remote = AuthServiceClient::new(&config).unwrap();

    assert_eq!(
        remote.check_application("key", "waste-services", "GET").await,
        Err(GuardError::Unauthorized("Auth service timeout".into()))
    );
    drop(listener);
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let remote = client(&format!("http://{addr}"));

    assert_matches!(
        remote.check_application("key", "waste-services", "GET").await,
        Err(GuardError::Unauthorized(m)) if m.starts_with("Auth service error:")
    );
}
