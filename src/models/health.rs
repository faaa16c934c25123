use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API response for health and readiness checks
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    /// Whether the document store backend was initialized
    pub store_connected: bool,
}
