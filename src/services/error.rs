use axum::http::StatusCode;
use thiserror::Error;

/// Failure reported by a document backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("store returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("malformed store response: {0}")]
    Decode(String),

    #[error("{0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// Outcome of a failed browse, update or restore
#[derive(Debug, Error)]
pub enum EditError {
    #[error("Access denied")]
    AccessDenied,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Cannot convert '{value}' to {expected}")]
    TypeCoercion { value: String, expected: &'static str },

    #[error("Failed to {operation} '{target}': {source}")]
    Store {
        operation: &'static str,
        target: String,
        source: StoreError,
    },

    #[error("Document store is not connected: {0}")]
    Connection(String),
}

impl EditError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            EditError::AccessDenied => "access_denied",
            EditError::Validation(_) => "validation_error",
            EditError::NotFound(_) => "not_found",
            EditError::TypeCoercion { .. } => "type_coercion_error",
            EditError::Store { .. } => "store_error",
            EditError::Connection(_) => "connection_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            EditError::AccessDenied => StatusCode::FORBIDDEN,
            EditError::Validation(_) => StatusCode::BAD_REQUEST,
            EditError::NotFound(_) => StatusCode::NOT_FOUND,
            EditError::TypeCoercion { .. } | EditError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EditError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Wrap a backend failure, turning a missing document into NotFound
    pub fn from_store(operation: &'static str, target: String, source: StoreError) -> Self {
        match source {
            StoreError::NotFound(_) => EditError::NotFound(format!("Document for '{}' not found", target)),
            source => EditError::Store { operation, target, source },
        }
    }
}
