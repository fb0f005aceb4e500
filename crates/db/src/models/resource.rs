//! Protected resources and their sub-resources.

use civic_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `resources` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Resource {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
}

/// A row from the `sub_resources` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubResource {
    pub id: DbId,
    pub resource_id: DbId,
    pub name: String,
    pub description: String,
    /// `GET` requests on this sub-resource need no credentials.
    pub allow_anonymous: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewSubResource {
    pub resource_id: DbId,
    pub name: String,
    pub description: String,
    pub allow_anonymous: bool,
}

/// A resource together with its sub-resources, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceTree {
    #[serde(flatten)]
    pub resource: Resource,
    pub sub_resources: Vec<SubResource>,
}
