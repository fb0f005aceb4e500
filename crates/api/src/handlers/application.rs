//! Handlers for `/api/auth/application`: registration and key management
//! (admin only), plus the application permission check and key validation
//! used by resource services.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use civic_core::api_keys::{generate_api_key, key_expiry, mask_key};
use civic_core::error::CoreError;
use civic_core::permission::{normalize_method, parse_levels};
use civic_core::protocol::{
    ApplicationAuthorization, ValidatedApplication, HEADER_API_KEY, HEADER_METHOD,
    HEADER_RESOURCE,
};
use civic_core::types::{DbId, Timestamp};
use civic_db::models::application::{Application, NewApplication, UpdateApplication};
use civic_db::models::permission::ApplicationGrant;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{header, validate_body};
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateApplicationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// Returned by create and rotate. The only place the plaintext key appears.
#[derive(Debug, Serialize)]
pub struct ApplicationWithKey {
    pub id: DbId,
    pub name: String,
    pub api_key: String,
    pub api_key_prefix: String,
    pub api_key_expires_at: Timestamp,
    pub is_active: bool,
}

impl ApplicationWithKey {
    fn new(app: Application, plaintext: String) -> Self {
        Self {
            id: app.id,
            name: app.name,
            api_key: plaintext,
            api_key_prefix: app.api_key_prefix,
            api_key_expires_at: app.api_key_expires_at,
            is_active: app.is_active,
        }
    }
}

/// Listing entry: the stored row plus a masked key.
#[derive(Debug, Serialize)]
pub struct ApplicationListItem {
    #[serde(flatten)]
    pub application: Application,
    pub api_key: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub resource: String,
    pub permissions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// GET /api/auth/application/
pub async fn list(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ApplicationListItem>>>> {
    let data = state
        .store
        .list_applications()
        .await?
        .into_iter()
        .map(|application| ApplicationListItem {
            application,
            api_key: mask_key(),
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/auth/application/
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateApplicationRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ApplicationWithKey>>)> {
    validate_body(&input)?;

    let key = generate_api_key();
    let app = state
        .store
        .create_application(NewApplication {
            name: input.name.trim().to_string(),
            api_key_hash: key.hash,
            api_key_prefix: key.prefix,
            api_key_expires_at: key_expiry(Utc::now(), state.config.api_key_ttl_days),
        })
        .await?;

    tracing::info!(
        application_id = app.id,
        name = %app.name,
        key_prefix = %app.api_key_prefix,
        admin_id = admin.user.id,
        "Application registered"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ApplicationWithKey::new(app, key.plaintext),
        }),
    ))
}

/// PATCH /api/auth/application/{id}
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    JsonBody(input): JsonBody<UpdateApplication>,
) -> AppResult<Json<DataResponse<Application>>> {
    if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(CoreError::Validation("Application name must not be empty".into()).into());
    }
    let app = state
        .store
        .update_application(id, &input)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Application",
            id,
        })?;

    tracing::info!(
        application_id = app.id,
        is_active = app.is_active,
        admin_id = admin.user.id,
        "Application updated"
    );
    Ok(Json(DataResponse { data: app }))
}

/// POST /api/auth/application/{id}/rotate
///
/// Issues a new key and resets the expiry. The old key stops working at once.
pub async fn rotate(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ApplicationWithKey>>> {
    let key = generate_api_key();
    let expires_at = key_expiry(Utc::now(), state.config.api_key_ttl_days);
    let app = state
        .store
        .rotate_application_key(id, &key.hash, &key.prefix, expires_at)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Application",
            id,
        })?;

    tracing::info!(
        application_id = app.id,
        key_prefix = %app.api_key_prefix,
        admin_id = admin.user.id,
        "API key rotated"
    );
    Ok(Json(DataResponse {
        data: ApplicationWithKey::new(app, key.plaintext),
    }))
}

/// GET /api/auth/application/{id}/permissions
pub async fn list_permissions(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ApplicationGrant>>>> {
    state.store.find_application(id).await?.ok_or(CoreError::NotFound {
        entity: "Application",
        id,
    })?;
    let data = state.store.list_application_grants(id).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/auth/application/{id}/permissions
///
/// Creates or replaces the application's grant on one resource.
pub async fn put_permissions(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    JsonBody(input): JsonBody<GrantRequest>,
) -> AppResult<Json<DataResponse<ApplicationGrant>>> {
    let levels = parse_levels(&input.permissions)?;
    state.store.find_application(id).await?.ok_or(CoreError::NotFound {
        entity: "Application",
        id,
    })?;
    let resource = state
        .store
        .find_resource(&input.resource)
        .await?
        .ok_or_else(|| CoreError::Validation(format!("Unknown resource '{}'", input.resource)))?;

    let grant = state
        .store
        .upsert_application_grant(id, resource.id, &levels)
        .await?;

    tracing::info!(
        application_id = id,
        resource = %resource.name,
        permissions = ?grant.permissions,
        admin_id = admin.user.id,
        "Application grant updated"
    );
    Ok(Json(DataResponse { data: grant }))
}

// ---------------------------------------------------------------------------
// Protocol handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/application/check_application_permission/
///
/// Headers: `X-API-KEY`, `X-RESOURCE`, optional `X-METHOD` (default `GET`).
pub async fn check_application_permission(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<ApplicationAuthorization>> {
    let method = normalize_method(header(&headers, HEADER_METHOD));
    let resource = header(&headers, HEADER_RESOURCE).unwrap_or_default();

    let decision = state
        .resolver
        .check_application(header(&headers, HEADER_API_KEY), resource, &method)
        .await?;
    Ok(Json(decision))
}

/// POST /api/auth/application/validate
pub async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<ValidatedApplication>> {
    let validated = state
        .resolver
        .validate_api_key(header(&headers, HEADER_API_KEY))
        .await?;
    Ok(Json(validated))
}
