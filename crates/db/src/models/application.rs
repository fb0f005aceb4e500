//! Registered applications and their API keys.

use civic_core::policy::ApplicationStanding;
use civic_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `applications` table.
///
/// `api_key_hash` is never serialized; `api_key_prefix` identifies the key
/// in listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Application {
    pub id: DbId,
    pub name: String,
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub api_key_prefix: String,
    pub is_active: bool,
    pub api_key_expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Application {
    pub fn standing(&self) -> ApplicationStanding<'_> {
        ApplicationStanding {
            name: &self.name,
            is_active: self.is_active,
            api_key_expires_at: self.api_key_expires_at,
        }
    }
}

/// Insert payload. The caller generates the key and passes only its hash.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub name: String,
    pub api_key_hash: String,
    pub api_key_prefix: String,
    pub api_key_expires_at: Timestamp,
}

/// DTO for updating an application. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateApplication {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}
