//! Login tokens.

use civic_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `user_tokens` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserToken {
    pub id: DbId,
    pub user_id: DbId,
    /// First characters of the plaintext, for log correlation.
    pub token_key: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewUserToken {
    pub user_id: DbId,
    pub token_key: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
}
