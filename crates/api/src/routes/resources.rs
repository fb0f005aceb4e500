//! Route definitions for the `/resources` resource.

use axum::routing::{get, post, MethodRouter};
use axum::Router;

use crate::handlers::resources;
use crate::state::AppState;

/// `GET` and `POST` on `/resources/`.
pub fn collection() -> MethodRouter<AppState> {
    get(resources::list).post(resources::create)
}

/// Routes mounted at `/resources`. All require an admin token.
///
/// ```text
/// POST /{name}/sub-resources   -> create_sub_resource
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{name}/sub-resources", post(resources::create_sub_resource))
}
