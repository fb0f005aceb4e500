use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejection renders as the usual `{"error", "code"}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
