//! Admin-only access.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use civic_core::error::CoreError;

use super::auth::TokenUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires a token user with `is_admin`. Rejects with 403 otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(admin): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub TokenUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = TokenUser::from_request_parts(parts, state).await?;
        if !user.user.is_admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin privileges required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}
