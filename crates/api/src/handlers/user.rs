//! Handlers for `/api/auth/user`: sign-up, token login/logout, the user
//! permission check and strict token validation.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use civic_core::error::CoreError;
use civic_core::permission::normalize_method;
use civic_core::protocol::{
    UserAuthorization, ValidatedToken, HEADER_AUTHORIZATION, HEADER_METHOD, HEADER_RESOURCE,
    HEADER_SUB_RESOURCE,
};
use civic_core::tokens::{generate_token, token_expiry};
use civic_core::types::{DbId, Timestamp};
use civic_db::models::token::NewUserToken;
use civic_db::models::user::{NewUser, User, UserResponse};
use civic_db::{StoreError, UserCheck};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{header, validate_body};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::middleware::auth::TokenUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

pub const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials.";
pub const MSG_EMAIL_TAKEN: &str = "A user with this email already exists";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    /// Names of user types to assign. Unknown names are ignored.
    #[serde(default)]
    pub user_type_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expiry: Timestamp,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct SetUserTypesRequest {
    pub user_type_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetUserActiveRequest {
    pub is_active: bool,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Build the response view of `user` with its type names.
async fn user_response(state: &AppState, user: &User) -> AppResult<UserResponse> {
    let types = state
        .store
        .user_types_of(user.id)
        .await?
        .into_iter()
        .map(|t| t.name)
        .collect();
    Ok(UserResponse::new(user, types))
}

/// Resolve type names to ids, dropping names that do not exist.
async fn user_type_ids(state: &AppState, names: &[String]) -> AppResult<Vec<DbId>> {
    let found = state.store.find_user_types(names).await?;
    if found.len() < names.len() {
        tracing::debug!(requested = ?names, found = found.len(), "Ignoring unknown user types");
    }
    Ok(found.into_iter().map(|t| t.id).collect())
}

// ---------------------------------------------------------------------------
// Accounts and tokens
// ---------------------------------------------------------------------------

/// POST /api/auth/user/sign-up/
pub async fn sign_up(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<SignUpRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    validate_body(&input)?;
    validate_password_strength(&input.password, state.config.min_password_length)?;

    let type_ids = user_type_ids(&state, &input.user_type_names).await?;
    let user = state
        .store
        .create_user(
            NewUser {
                email: normalize_email(&input.email),
                password_hash: hash_password(&input.password)?,
                first_name: input.first_name.trim().to_string(),
                last_name: input.last_name.trim().to_string(),
                is_admin: false,
            },
            &type_ids,
        )
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AppError::Core(CoreError::Conflict(MSG_EMAIL_TAKEN.into())),
            other => other.into(),
        })?;

    let data = user_response(&state, &user).await?;
    tracing::info!(
        user_id = user.id,
        user_types = ?data.user_types,
        is_municipal_staff = user.is_municipal_staff,
        "User signed up"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// POST /api/auth/user/login/
///
/// Every failure answers with the same message so callers cannot discover
/// which emails exist.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let invalid = || AppError::Core(CoreError::Validation(MSG_INVALID_CREDENTIALS.into()));

    let user = state
        .store
        .find_user_by_email(&normalize_email(&input.email))
        .await?
        .ok_or_else(invalid)?;
    if !user.is_active || !verify_password(&input.password, &user.password_hash) {
        tracing::debug!(user_id = user.id, "Login refused");
        return Err(invalid());
    }

    let now = Utc::now();
    let purged = state.store.purge_expired_tokens(now).await?;
    if purged > 0 {
        tracing::debug!(purged, "Expired tokens removed");
    }

    let token = generate_token();
    let expiry = token_expiry(now, state.config.user_token_ttl_hours);
    state
        .store
        .create_token(NewUserToken {
            user_id: user.id,
            token_key: token.prefix.clone(),
            token_hash: token.hash,
            expires_at: expiry,
        })
        .await?;
    state.store.record_login(user.id).await?;

    tracing::info!(user_id = user.id, token_key = %token.prefix, "User logged in");
    Ok(Json(LoginResponse {
        token: token.plaintext,
        expiry,
        user: user_response(&state, &user).await?,
    }))
}

/// POST /api/auth/user/logout/
pub async fn logout(State(state): State<AppState>, auth: TokenUser) -> AppResult<StatusCode> {
    state.store.delete_token(&auth.token_hash).await?;
    tracing::info!(user_id = auth.user.id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/user/logoutall/
pub async fn logout_all(State(state): State<AppState>, auth: TokenUser) -> AppResult<StatusCode> {
    let removed = state.store.delete_user_tokens(auth.user.id).await?;
    tracing::info!(user_id = auth.user.id, removed, "User logged out everywhere");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/auth/user/{id}/user-types
pub async fn set_user_types(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    JsonBody(input): JsonBody<SetUserTypesRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let type_ids = user_type_ids(&state, &input.user_type_names).await?;
    let user = state
        .store
        .set_user_types(id, &type_ids)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;

    let data = user_response(&state, &user).await?;
    tracing::info!(
        user_id = id,
        user_types = ?data.user_types,
        admin_id = admin.user.id,
        "User types replaced"
    );
    Ok(Json(DataResponse { data }))
}

/// PATCH /api/auth/user/{id}
///
/// Tokens of a deactivated user stop resolving but are kept, so reactivation
/// restores existing sessions that have not expired.
pub async fn set_active(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    JsonBody(input): JsonBody<SetUserActiveRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = state
        .store
        .set_user_active(id, input.is_active)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;

    tracing::info!(
        user_id = id,
        is_active = user.is_active,
        admin_id = admin.user.id,
        "User activation changed"
    );
    let data = user_response(&state, &user).await?;
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// Protocol handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/user/check-user-permission/
///
/// Headers: `X-RESOURCE`, `X-SUB-RESOURCE`, optional `Authorization`
/// (`Token <t>`, `Bearer <t>` or the bare token) and `X-METHOD`.
pub async fn check_user_permission(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<UserAuthorization>> {
    let method = normalize_method(header(&headers, HEADER_METHOD));
    let decision = state
        .resolver
        .check_user(UserCheck {
            resource: header(&headers, HEADER_RESOURCE),
            sub_resource: header(&headers, HEADER_SUB_RESOURCE),
            method: &method,
            authorization: header(&headers, HEADER_AUTHORIZATION),
        })
        .await?;
    Ok(Json(decision))
}

/// POST /api/auth/user/validate
pub async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<ValidatedToken>> {
    let validated = state
        .resolver
        .validate_token(header(&headers, HEADER_AUTHORIZATION))
        .await?;
    Ok(Json(validated))
}
