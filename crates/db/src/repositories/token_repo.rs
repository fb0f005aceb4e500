//! Repository for the `user_tokens` table.

use civic_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::token::{NewUserToken, UserToken};

const COLUMNS: &str = "id, user_id, token_key, token_hash, expires_at, created_at";

pub struct TokenRepo;

impl TokenRepo {
    pub async fn create(pool: &PgPool, input: &NewUserToken) -> Result<UserToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_tokens (user_id, token_key, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserToken>(&query)
            .bind(input.user_id)
            .bind(&input.token_key)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a token by hash, ignoring tokens that expired before `now`.
    pub async fn find_live_by_hash(
        pool: &PgPool,
        token_hash: &str,
        now: Timestamp,
    ) -> Result<Option<UserToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_tokens WHERE token_hash = $1 AND expires_at > $2"
        );
        sqlx::query_as::<_, UserToken>(&query)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Delete one token. Returns `true` if a row was removed.
    pub async fn delete_by_hash(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every token of a user. Returns the number removed.
    pub async fn delete_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn purge_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
