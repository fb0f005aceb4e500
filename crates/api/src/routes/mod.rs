pub mod application;
pub mod health;
pub mod resources;
pub mod user;
pub mod user_types;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/auth` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /application/                                   list, create (admin)
/// /application/{id}                               update (admin)
/// /application/{id}/rotate                        rotate key (admin)
/// /application/{id}/permissions                   list, upsert grants (admin)
/// /application/check_application_permission/      application check
/// /application/validate                           API key validation
///
/// /user/sign-up/                                  sign-up (public)
/// /user/login/                                    login (public)
/// /user/logout/                                   logout (token)
/// /user/logoutall/                                logout everywhere (token)
/// /user/check-user-permission/                    user check
/// /user/validate                                  strict token validation
/// /user/{id}                                      activate, deactivate (admin)
/// /user/{id}/user-types                           replace types (admin)
///
/// /resources/                                     list, create (admin)
/// /resources/{name}/sub-resources                 create sub-resource (admin)
///
/// /user-types/                                    list (public)
/// /user-types/{name}/permissions                  upsert grant (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/application/", application::collection())
        .route("/resources/", resources::collection())
        .route("/user-types/", user_types::collection())
        .nest("/application", application::router())
        .nest("/user", user::router())
        .nest("/resources", resources::router())
        .nest("/user-types", user_types::router())
}
