use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::auth::auth;
use crate::models::error_reply;
use crate::services::error::EditError;
use crate::state::AppState;

/// Let a request through only if its principals hold the manage permission.
/// Runs after `auth_middleware`; a request without principals is denied.
pub async fn access_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let allowed = match req.extensions().get::<Vec<String>>() {
        Some(prpls) => auth::check_access(prpls, &state.config.manage_permission),
        None => Err(EditError::AccessDenied),
    };

    if let Err(e) = allowed {
        info!("Access denied to {}", req.uri().path());
        return error_reply(e).into_response();
    }

    next.run(req).await
}
