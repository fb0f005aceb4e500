use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use civic_core::error::CoreError;
use civic_core::protocol::ErrorBody;
use civic_db::ResolveError;

/// Why a resource service refuses a request.
///
/// The auth service's answer collapses to two outcomes: a 403 stays
/// `Forbidden`, everything else (bad credentials, timeouts, transport
/// failures) becomes `Unauthorized`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl GuardError {
    pub fn message(&self) -> &str {
        match self {
            GuardError::Unauthorized(msg) | GuardError::Forbidden(msg) => msg,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GuardError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GuardError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl From<CoreError> for GuardError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Forbidden(msg) => GuardError::Forbidden(msg),
            other => GuardError::Unauthorized(other.message()),
        }
    }
}

impl From<ResolveError> for GuardError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Denied(e) => e.into(),
            ResolveError::Store(e) => {
                tracing::error!(error = %e, "Permission store failed");
                GuardError::Unauthorized(format!("Auth service error: {e}"))
            }
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let code = match self {
            GuardError::Unauthorized(_) => "UNAUTHORIZED",
            GuardError::Forbidden(_) => "FORBIDDEN",
        };
        let body = ErrorBody {
            error: self.message().to_string(),
            code: Some(code.to_string()),
        };
        (self.status(), Json(body)).into_response()
    }
}
