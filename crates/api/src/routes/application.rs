//! Route definitions for the `/application` resource.

use axum::routing::{get, patch, post, MethodRouter};
use axum::Router;

use crate::handlers::application;
use crate::state::AppState;

/// Handlers for the `/application/` collection path.
///
/// Registered at the full trailing-slash path: a nested `/` route would only
/// answer `/application`.
pub fn collection() -> MethodRouter<AppState> {
    get(application::list).post(application::create)
}

/// Routes mounted at `/application`.
///
/// ```text
/// PATCH /{id}                          -> update (admin)
/// POST  /{id}/rotate                   -> rotate (admin)
/// GET   /{id}/permissions              -> list_permissions (admin)
/// PUT   /{id}/permissions              -> put_permissions (admin)
/// POST  /check_application_permission/ -> check_application_permission
/// POST  /validate                      -> validate
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", patch(application::update))
        .route("/{id}/rotate", post(application::rotate))
        .route(
            "/{id}/permissions",
            get(application::list_permissions).put(application::put_permissions),
        )
        .route(
            "/check_application_permission/",
            post(application::check_application_permission),
        )
        .route("/validate", post(application::validate))
}
