use axum::{extract::State, http::StatusCode, Json};
use crate::{models::HealthResponse, state::AppState};
use tracing::debug;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
        store_connected: state.store.is_connected(),
    })
}

/// Readiness check endpoint; not ready while the document store is unavailable
pub async fn ready_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    debug!("Readiness check requested");
    if state.store.is_connected() {
        (StatusCode::OK, Json(HealthResponse {
            status: "ok".to_string(),
            message: "Service is ready".to_string(),
            store_connected: true,
        }))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse {
            status: "unavailable".to_string(),
            message: "Document store is not connected".to_string(),
            store_connected: false,
        }))
    }
}
