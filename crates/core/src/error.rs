use crate::types::DbId;

/// Domain error shared by every layer.
///
/// The variants map one-to-one onto HTTP statuses in the API crate:
/// `Validation` is 400, `Unauthorized` 401, `Forbidden` 403, `NotFound` 404,
/// `Conflict` 409 and `Internal` 500.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The human-readable message without the variant prefix.
    ///
    /// This is what ends up in the `error` field of JSON responses.
    pub fn message(&self) -> String {
        match self {
            CoreError::NotFound { entity, id } => format!("{entity} with id {id} not found"),
            CoreError::Validation(msg)
            | CoreError::Conflict(msg)
            | CoreError::Unauthorized(msg)
            | CoreError::Forbidden(msg)
            | CoreError::Internal(msg) => msg.clone(),
        }
    }
}
