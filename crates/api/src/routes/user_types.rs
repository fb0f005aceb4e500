//! Route definitions for the `/user-types` resource.

use axum::routing::{get, put, MethodRouter};
use axum::Router;

use crate::handlers::user_types;
use crate::state::AppState;

pub fn collection() -> MethodRouter<AppState> {
    get(user_types::list)
}

/// Routes mounted at `/user-types`.
///
/// ```text
/// PUT /{name}/permissions -> put_permission (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{name}/permissions", put(user_types::put_permission))
}
