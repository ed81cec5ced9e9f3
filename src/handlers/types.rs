//! # Common API Types
//!
//! Response wrappers shared by several handlers.

use axum::{
    body::Bytes,
    http::{HeaderValue, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};

/// Pre-serialized JSON body, as stored in the response cache.
#[derive(Debug, Clone)]
pub struct JsonPayload(pub Bytes);

impl IntoResponse for JsonPayload {
    fn into_response(self) -> Response {
        (
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            self.0,
        )
            .into_response()
    }
}
