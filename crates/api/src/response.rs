//! Shared response envelope types for API handlers.
//!
//! Single resources use a `{ "data": ... }` envelope; listings return a
//! [`Page`](folio_core::pagination::Page) inside the same envelope.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
