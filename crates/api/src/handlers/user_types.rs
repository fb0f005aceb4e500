//! Handlers for `/api/auth/user-types`.

use axum::extract::{Path, State};
use axum::Json;
use civic_core::error::CoreError;
use civic_core::permission::parse_levels;
use civic_db::models::permission::UserTypeGrant;
use civic_db::models::user_type::UserType;
use serde::Deserialize;

use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserTypeGrantRequest {
    pub resource: String,
    pub sub_resource: String,
    pub permissions: Vec<String>,
}

/// GET /api/auth/user-types/
///
/// Public: sign-up forms use it to offer the available types.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<UserType>>>> {
    let data = state.store.list_user_types().await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/auth/user-types/{name}/permissions
pub async fn put_permission(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(name): Path<String>,
    JsonBody(input): JsonBody<UserTypeGrantRequest>,
) -> AppResult<Json<DataResponse<UserTypeGrant>>> {
    let levels = parse_levels(&input.permissions)?;
    let user_type = state
        .store
        .find_user_type(&name)
        .await?
        .ok_or_else(|| CoreError::Validation(format!("Unknown user type '{name}'")))?;
    let sub = state
        .store
        .find_sub_resource(&input.resource, &input.sub_resource)
        .await?
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Unknown sub-resource '{}/{}'",
                input.resource, input.sub_resource
            ))
        })?;

    let grant = state
        .store
        .upsert_user_type_grant(user_type.id, sub.id, &levels)
        .await?;
    tracing::info!(
        user_type = %user_type.name,
        resource = %input.resource,
        sub_resource = %input.sub_resource,
        permissions = ?grant.permissions,
        admin_id = admin.user.id,
        "User type grant updated"
    );
    Ok(Json(DataResponse { data: grant }))
}
