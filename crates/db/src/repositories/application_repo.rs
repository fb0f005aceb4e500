//! Repository for the `applications` table.

use civic_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::application::{Application, NewApplication, UpdateApplication};

const COLUMNS: &str = "\
    id, name, api_key_hash, api_key_prefix, is_active, \
    api_key_expires_at, created_at, updated_at";

pub struct ApplicationRepo;

impl ApplicationRepo {
    /// Insert a new application. Returns the full row (with hash).
    pub async fn create(pool: &PgPool, input: &NewApplication) -> Result<Application, sqlx::Error> {
        let query = format!(
            "INSERT INTO applications (name, api_key_hash, api_key_prefix, api_key_expires_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(&input.name)
            .bind(&input.api_key_hash)
            .bind(&input.api_key_prefix)
            .bind(input.api_key_expires_at)
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications ORDER BY id");
        sqlx::query_as::<_, Application>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE id = $1");
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an application by the SHA-256 hash of its key.
    ///
    /// Active and expiry checks are left to the policy so that it can tell
    /// an expired key apart from an unknown one.
    pub async fn find_by_key_hash(
        pool: &PgPool,
        key_hash: &str,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE api_key_hash = $1");
        sqlx::query_as::<_, Application>(&query)
            .bind(key_hash)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateApplication,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET \
                 name = COALESCE($2, name), \
                 is_active = COALESCE($3, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(input.name.as_deref())
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Replace the key hash and prefix and reset the expiry.
    pub async fn rotate(
        pool: &PgPool,
        id: DbId,
        new_hash: &str,
        new_prefix: &str,
        expires_at: Timestamp,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET \
                 api_key_hash = $2, api_key_prefix = $3, \
                 api_key_expires_at = $4, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(new_hash)
            .bind(new_prefix)
            .bind(expires_at)
            .fetch_optional(pool)
            .await
    }
}
