use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use civic_core::error::CoreError;
use civic_db::{ResolveError, StoreError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`StoreError`] for persistence
/// failures. Implements [`IntoResponse`] to produce `{"error", "code"}` JSON.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error, including every policy denial.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A malformed request body.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Denied(e) => AppError::Core(e),
            ResolveError::Store(e) => AppError::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", core.message())
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            AppError::Store(err) => match err {
                StoreError::NotFound(what) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", format!("Not found: {what}"))
                }
                StoreError::Conflict(msg) => {
                    let mut msg = msg.clone();
                    if let Some(first) = msg.get_mut(..1) {
                        first.make_ascii_uppercase();
                    }
                    (StatusCode::CONFLICT, "CONFLICT", msg)
                }
                other => {
                    tracing::error!(error = %other, "Store error");
                    internal()
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "Internal server error occurred".to_string(),
    )
}
