pub mod application;
pub mod resources;
pub mod user;
pub mod user_types;

use axum::http::HeaderMap;
use civic_core::error::CoreError;
use validator::Validate;

/// A header value as UTF-8, or `None` when absent or not valid text.
pub(crate) fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Run `validator` rules and turn failures into a 400.
pub(crate) fn validate_body<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))
}
