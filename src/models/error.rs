use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::services::error::EditError;

/// Response for an error
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always "error"
    pub status: String,
    /// Machine-readable failure kind
    pub code: String,
    pub message: String,
}

/// Turn a failure into the wire error. Store and connection failures are logged
/// as errors; the other kinds are expected client mistakes.
pub fn error_reply(err: EditError) -> (StatusCode, Json<ErrorResponse>) {
    match &err {
        EditError::Store { .. } | EditError::Connection(_) => error!("{}", err),
        _ => debug!("Request rejected ({}): {}", err.code(), err),
    }
    let status = err.status_code();
    (status, Json(ErrorResponse {
        status: "error".to_string(),
        code: err.code().to_string(),
        message: err.to_string(),
    }))
}
