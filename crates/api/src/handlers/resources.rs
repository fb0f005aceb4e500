//! Handlers for `/api/auth/resources` (admin only).

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use civic_core::error::CoreError;
use civic_core::types::DbId;
use civic_db::models::resource::{NewSubResource, Resource, ResourceTree, SubResource};
use serde::Deserialize;
use validator::Validate;

use super::validate_body;
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateResourceRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubResourceRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub allow_anonymous: bool,
}

/// GET /api/auth/resources/
pub async fn list(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ResourceTree>>>> {
    let resources = state.store.list_resources().await?;
    let mut by_resource: HashMap<DbId, Vec<SubResource>> = HashMap::new();
    for sub in state.store.list_sub_resources().await? {
        by_resource.entry(sub.resource_id).or_default().push(sub);
    }

    let data = resources
        .into_iter()
        .map(|resource| ResourceTree {
            sub_resources: by_resource.remove(&resource.id).unwrap_or_default(),
            resource,
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/auth/resources/
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateResourceRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Resource>>)> {
    validate_body(&input)?;
    let resource = state
        .store
        .create_resource(input.name.trim(), &input.description)
        .await?;
    tracing::info!(resource = %resource.name, admin_id = admin.user.id, "Resource created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: resource })))
}

/// POST /api/auth/resources/{name}/sub-resources
pub async fn create_sub_resource(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(resource_name): Path<String>,
    JsonBody(input): JsonBody<CreateSubResourceRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SubResource>>)> {
    validate_body(&input)?;
    let resource = state
        .store
        .find_resource(&resource_name)
        .await?
        .ok_or_else(|| CoreError::Validation(format!("Unknown resource '{resource_name}'")))?;

    let sub = state
        .store
        .create_sub_resource(&NewSubResource {
            resource_id: resource.id,
            name: input.name.trim().to_string(),
            description: input.description,
            allow_anonymous: input.allow_anonymous,
        })
        .await?;
    tracing::info!(
        resource = %resource.name,
        sub_resource = %sub.name,
        allow_anonymous = sub.allow_anonymous,
        admin_id = admin.user.id,
        "Sub-resource created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: sub })))
}
