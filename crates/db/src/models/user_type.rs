//! User types (roles) such as `resident` or `waste-management`.

use civic_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_types` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserType {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub is_municipal_staff: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewUserType {
    pub name: String,
    pub description: String,
    pub is_municipal_staff: bool,
}
