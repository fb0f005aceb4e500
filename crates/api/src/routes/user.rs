//! Route definitions for the `/user` resource.

use axum::routing::{patch, post, put};
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/user`.
///
/// ```text
/// POST  /sign-up/                -> sign_up
/// POST  /login/                  -> login
/// POST  /logout/                 -> logout (requires token)
/// POST  /logoutall/              -> logout_all (requires token)
/// POST  /check-user-permission/  -> check_user_permission
/// POST  /validate                -> validate
/// PATCH /{id}                    -> set_active (admin)
/// PUT   /{id}/user-types         -> set_user_types (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sign-up/", post(user::sign_up))
        .route("/login/", post(user::login))
        .route("/logout/", post(user::logout))
        .route("/logoutall/", post(user::logout_all))
        .route("/check-user-permission/", post(user::check_user_permission))
        .route("/validate", post(user::validate))
        .route("/{id}", patch(user::set_active))
        .route("/{id}/user-types", put(user::set_user_types))
}
