//! Shared response envelope for the admin endpoints.
//!
//! Permission check and validation endpoints answer with the flat protocol
//! bodies from `civic_core::protocol`; everything else uses `{ "data": ... }`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
