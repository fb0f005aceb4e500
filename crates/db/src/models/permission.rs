//! Grant rows: application-level and user-type-level.
//!
//! Levels are stored as a `TEXT[]` of `read` / `write` / `admin`.

use civic_core::permission::PermissionLevel;
use civic_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `application_resource_permissions`, joined with the resource name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApplicationGrant {
    pub id: DbId,
    pub application_id: DbId,
    pub resource_id: DbId,
    pub resource_name: String,
    pub permissions: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ApplicationGrant {
    pub fn levels(&self) -> Vec<PermissionLevel> {
        known_levels(&self.permissions)
    }
}

/// A row from `user_resource_permissions`, joined with the names it refers to.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserTypeGrant {
    pub id: DbId,
    pub user_type_id: DbId,
    pub user_type_name: String,
    pub resource_id: DbId,
    pub resource_name: String,
    pub sub_resource_id: DbId,
    pub sub_resource_name: String,
    pub permissions: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserTypeGrant {
    pub fn levels(&self) -> Vec<PermissionLevel> {
        known_levels(&self.permissions)
    }
}

/// Parse stored levels, dropping anything outside the hierarchy.
fn known_levels(raw: &[String]) -> Vec<PermissionLevel> {
    raw.iter().filter_map(|s| s.parse().ok()).collect()
}
