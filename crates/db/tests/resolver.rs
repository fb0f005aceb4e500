//! Permission resolution against the in-memory store with the seeded catalogue.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use civic_core::api_keys::{generate_api_key, key_expiry, DEFAULT_KEY_TTL_DAYS};
use civic_core::error::CoreError;
use civic_core::permission::PermissionLevel;
use civic_core::tokens::{generate_token, token_expiry};
use civic_db::models::application::{NewApplication, UpdateApplication};
use civic_db::models::token::NewUserToken;
use civic_db::models::user::NewUser;
use civic_db::store::MemoryAuthStore;
use civic_db::{seed, AuthStore, PermissionResolver, ResolveError, UserCheck};

struct Fixture {
    store: Arc<dyn AuthStore>,
    resolver: PermissionResolver,
}

async fn fixture() -> Fixture {
    let store: Arc<dyn AuthStore> = Arc::new(MemoryAuthStore::new());
    seed::apply_catalog(store.as_ref()).await.unwrap();
    Fixture {
        resolver: PermissionResolver::new(store.clone()),
        store,
    }
}

/// Register an application with the given grant on `resource`; returns its key.
async fn application(fx: &Fixture, resource: &str, levels: &[PermissionLevel]) -> (i64, String) {
    let key = generate_api_key();
    let app = fx
        .store
        .create_application(NewApplication {
            name: "citizen-app".into(),
            api_key_hash: key.hash,
            api_key_prefix: key.prefix,
            api_key_expires_at: key_expiry(Utc::now(), DEFAULT_KEY_TTL_DAYS),
        })
        .await
        .unwrap();
    let resource = fx.store.find_resource(resource).await.unwrap().unwrap();
    fx.store
        .upsert_application_grant(app.id, resource.id, levels)
        .await
        .unwrap();
    (app.id, key.plaintext)
}

/// Create a user with the named types and log them in; returns the token.
async fn user_token(fx: &Fixture, email: &str, types: &[&str]) -> String {
    let names: Vec<String> = types.iter().map(|s| s.to_string()).collect();
    let ids: Vec<i64> = fx
        .store
        .find_user_types(&names)
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    let user = fx
        .store
        .create_user(
            NewUser {
                email: email.into(),
                password_hash: "unused".into(),
                first_name: "Test".into(),
                last_name: "User".into(),
                is_admin: false,
            },
            &ids,
        )
        .await
        .unwrap();
    let token = generate_token();
    fx.store
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

fn denied(result: Result<impl std::fmt::Debug, ResolveError>) -> CoreError {
    match result {
        Err(ResolveError::Denied(e)) => e,
        other => panic!("expected a denial, got {other:?}"),
    }
}

fn check<'a>(sub: &'a str, method: &'a str, auth: Option<&'a str>) -> UserCheck<'a> {
    UserCheck {
        resource: Some("waste-services"),
        sub_resource: Some(sub),
        method,
        authorization: auth,
    }
}

// ---------------------------------------------------------------------------
// Application check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn application_with_read_write_grant() {
    let fx = fixture().await;
    let (_, key) = application(&fx, "waste-services", &[PermissionLevel::Read, PermissionLevel::Write]).await;

    let ok = fx
        .resolver
        .check_application(Some(&key), "waste-services", "POST")
        .await
        .unwrap();
    assert_eq!(ok.permission, PermissionLevel::Write);
    assert_eq!(ok.application, "citizen-app");

    let err = denied(fx.resolver.check_application(Some(&key), "waste-services", "DELETE").await);
    assert_eq!(err, CoreError::Forbidden("Permission denied, insufficient permissions".into()));

    let err = denied(fx.resolver.check_application(Some(&key), "weather-services", "GET").await);
    assert_eq!(err, CoreError::Forbidden("Permission denied, resource permission not found".into()));
}

#[tokio::test]
async fn application_key_failures() {
    let fx = fixture().await;
    let (id, key) = application(&fx, "waste-services", &[PermissionLevel::Read]).await;

    assert_matches!(
        denied(fx.resolver.check_application(None, "waste-services", "GET").await),
        CoreError::Validation(m) if m == "Missing API key"
    );
    assert_matches!(
        denied(fx.resolver.check_application(Some("nope"), "waste-services", "GET").await),
        CoreError::Forbidden(m) if m == "Invalid API Key"
    );

    fx.store
        .rotate_application_key(id, &civic_core::api_keys::hash_api_key(&key), "x", Utc::now() - Duration::days(1))
        .await
        .unwrap();
    assert_matches!(
        denied(fx.resolver.check_application(Some(&key), "waste-services", "GET").await),
        CoreError::Forbidden(m) if m == "API Key has expired"
    );

    fx.store
        .update_application(id, &UpdateApplication { name: None, is_active: Some(false) })
        .await
        .unwrap();
    assert_matches!(
        denied(fx.resolver.check_application(Some(&key), "waste-services", "GET").await),
        CoreError::Forbidden(m) if m == "Invalid API Key"
    );
}

#[tokio::test]
async fn validate_api_key_reports_application() {
    let fx = fixture().await;
    let (id, key) = application(&fx, "waste-services", &[PermissionLevel::Read]).await;

    let ok = fx.resolver.validate_api_key(Some(&key)).await.unwrap();
    assert_eq!(ok.status, "valid");
    assert_eq!(ok.application.id, id);

    assert_matches!(
        denied(fx.resolver.validate_api_key(Some("")).await),
        CoreError::Validation(m) if m == "Invalid API key"
    );
}

// ---------------------------------------------------------------------------
// User check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anonymous_get_needs_no_token() {
    let fx = fixture().await;
    let ok = fx.resolver.check_user(check("bin", "GET", None)).await.unwrap();
    assert!(ok.is_anonymous());
    assert_eq!(ok.permission(), PermissionLevel::Read);
}

#[tokio::test]
async fn anonymous_write_without_token_is_refused() {
    let fx = fixture().await;
    assert_matches!(
        denied(fx.resolver.check_user(check("bin", "POST", None)).await),
        CoreError::Forbidden(m) if m == "Anonymous access only allows GET requests"
    );
}

#[tokio::test]
async fn anonymous_write_with_token_uses_grants() {
    let fx = fixture().await;
    let token = user_token(&fx, "res@example.org", &["resident"]).await;
    let header = format!("Token {token}");

    let ok = fx
        .resolver
        .check_user(check("bin", "POST", Some(&header)))
        .await
        .unwrap();
    assert_eq!(ok.permission(), PermissionLevel::Write);
    assert_eq!(ok.user().map(|u| u.email.as_str()), Some("res@example.org"));
}

#[tokio::test]
async fn protected_sub_resource_requires_token() {
    let fx = fixture().await;
    assert_matches!(
        denied(fx.resolver.check_user(check("modify-schedule", "GET", None)).await),
        CoreError::Unauthorized(m) if m == "Authentication required for this resource"
    );
    assert_matches!(
        denied(fx.resolver.check_user(check("modify-schedule", "GET", Some("Token bogus"))).await),
        CoreError::Unauthorized(m) if m == "Invalid authentication token"
    );
}

#[tokio::test]
async fn missing_target_is_a_validation_error() {
    let fx = fixture().await;
    let req = UserCheck {
        resource: Some("waste-services"),
        sub_resource: None,
        method: "GET",
        authorization: None,
    };
    assert_matches!(denied(fx.resolver.check_user(req).await), CoreError::Validation(_));
}

#[tokio::test]
async fn grants_merge_across_types() {
    let fx = fixture().await;
    let token = user_token(&fx, "multi@example.org", &["resident", "waste-management"]).await;

    // The bare token (no scheme) is accepted by the permission check.
    let ok = fx
        .resolver
        .check_user(check("modify-schedule", "DELETE", Some(&token)))
        .await
        .unwrap();
    assert_eq!(ok.permission(), PermissionLevel::Admin);
    if let civic_core::protocol::UserAuthorization::Authenticated { user_types, .. } = ok {
        assert_eq!(user_types, vec!["resident", "waste-management"]);
    } else {
        panic!("expected an authenticated decision");
    }
}

#[tokio::test]
async fn insufficient_level_names_both_sides() {
    let fx = fixture().await;
    let token = user_token(&fx, "res@example.org", &["resident"]).await;
    let header = format!("Token {token}");
    assert_eq!(
        denied(fx.resolver.check_user(check("fetch-schedule", "PUT", Some(&header))).await),
        CoreError::Forbidden("Requires write permission but only has read".into())
    );
}

#[tokio::test]
async fn user_without_types_or_grants() {
    let fx = fixture().await;
    let untyped = user_token(&fx, "none@example.org", &[]).await;
    let header = format!("Token {untyped}");
    assert_matches!(
        denied(fx.resolver.check_user(check("modify-schedule", "GET", Some(&header))).await),
        CoreError::Forbidden(m) if m == "User has no assigned types"
    );

    let tourist = user_token(&fx, "tourist@example.org", &["tourist"]).await;
    let header = format!("Token {tourist}");
    assert_matches!(
        denied(fx.resolver.check_user(check("modify-schedule", "GET", Some(&header))).await),
        CoreError::Forbidden(m) if m == "No permissions found for user types"
    );
}

#[tokio::test]
async fn municipal_staff_read_everything_protected() {
    let fx = fixture().await;
    let token = user_token(&fx, "fire@example.org", &["fire-department"]).await;
    let header = format!("Token {token}");
    let ok = fx
        .resolver
        .check_user(check("modify-schedule", "GET", Some(&header)))
        .await
        .unwrap();
    assert_eq!(ok.permission(), PermissionLevel::Read);
}

#[tokio::test]
async fn expired_token_is_an_invalid_token() {
    let fx = fixture().await;
    user_token(&fx, "late@example.org", &["resident"]).await;
    let user = fx.store.find_user_by_email("late@example.org").await.unwrap().unwrap();

    let stale = generate_token();
    fx.store
        .create_token(NewUserToken {
            user_id: user.id,
            token_key: stale.prefix,
            token_hash: stale.hash,
            expires_at: Utc::now() - Duration::minutes(1),
        })
        .await
        .unwrap();
    let header = format!("Token {}", stale.plaintext);

    assert_matches!(
        denied(fx.resolver.check_user(check("modify-schedule", "GET", Some(&header))).await),
        CoreError::Unauthorized(m) if m == "Invalid authentication token"
    );
    assert_matches!(
        denied(fx.resolver.check_user(check("bin", "POST", Some(&header))).await),
        CoreError::Unauthorized(m) if m == "Invalid authentication token"
    );
    assert_matches!(
        denied(fx.resolver.validate_token(Some(&header)).await),
        CoreError::Unauthorized(m) if m == "Invalid token"
    );
}

#[tokio::test]
async fn inactive_user_token_is_rejected() {
    let fx = fixture().await;
    let token = user_token(&fx, "gone@example.org", &["waste-management"]).await;
    let header = format!("Token {token}");
    let user = fx.store.find_user_by_email("gone@example.org").await.unwrap().unwrap();

    fx.resolver
        .check_user(check("modify-schedule", "GET", Some(&header)))
        .await
        .unwrap();

    fx.store.set_user_active(user.id, false).await.unwrap().unwrap();
    assert_matches!(
        denied(fx.resolver.check_user(check("modify-schedule", "GET", Some(&header))).await),
        CoreError::Unauthorized(m) if m == "Invalid authentication token"
    );
    assert_matches!(
        denied(fx.resolver.validate_token(Some(&header)).await),
        CoreError::Unauthorized(m) if m == "Invalid token"
    );

    fx.store.set_user_active(user.id, true).await.unwrap().unwrap();
    let ok = fx
        .resolver
        .check_user(check("modify-schedule", "GET", Some(&header)))
        .await
        .unwrap();
    assert_eq!(ok.permission(), PermissionLevel::Admin);
}

// ---------------------------------------------------------------------------
// Token validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validate_token_is_strict() {
    let fx = fixture().await;
    let token = user_token(&fx, "res@example.org", &["resident"]).await;

    let ok = fx
        .resolver
        .validate_token(Some(&format!("Token {token}")))
        .await
        .unwrap();
    assert_eq!(ok.status, "authorised");
    assert_eq!(ok.user.user_types, vec!["resident"]);
    assert!(ok.token_expiry.is_some());

    assert_matches!(
        denied(fx.resolver.validate_token(None).await),
        CoreError::Unauthorized(m) if m == "Authorization header is required"
    );
    assert_matches!(
        denied(fx.resolver.validate_token(Some(&format!("Bearer {token}"))).await),
        CoreError::Unauthorized(m) if m == "Invalid authorization type"
    );
    assert_matches!(
        denied(fx.resolver.validate_token(Some(&token)).await),
        CoreError::Unauthorized(m) if m == "Invalid authorization header format"
    );
    assert_matches!(
        denied(fx.resolver.validate_token(Some("Token nope")).await),
        CoreError::Unauthorized(m) if m == "Invalid token"
    );
}
