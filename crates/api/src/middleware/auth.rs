//! Token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use civic_core::error::CoreError;
use civic_core::protocol::HEADER_AUTHORIZATION;
use civic_core::tokens::{extract_user_token, hash_token};
use civic_db::models::user::User;
use civic_db::ResolveError;

use crate::error::AppError;
use crate::state::AppState;

pub const MSG_CREDENTIALS_MISSING: &str = "Authentication credentials were not provided.";
pub const MSG_TOKEN_INVALID: &str = "Invalid token.";

/// The user owning the token in the `Authorization` header.
///
/// ```ignore
/// async fn me(user: TokenUser) -> AppResult<Json<UserResponse>> { ... }
/// ```
#[derive(Debug, Clone)]
pub struct TokenUser {
    pub user: User,
    /// Hash of the presented token, used by logout.
    pub token_hash: String,
}

impl FromRequestParts<AppState> for TokenUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(HEADER_AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_user_token)
            .ok_or_else(|| CoreError::Unauthorized(MSG_CREDENTIALS_MISSING.into()))?;

        let (user, _) = state
            .resolver
            .authenticate_token(token)
            .await
            .map_err(|e| match e {
                ResolveError::Denied(_) => {
                    AppError::Core(CoreError::Unauthorized(MSG_TOKEN_INVALID.into()))
                }
                other => other.into(),
            })?;

        Ok(TokenUser {
            user,
            token_hash: hash_token(token),
        })
    }
}
