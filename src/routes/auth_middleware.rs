use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info};

use crate::models::error_reply;
use crate::services::auth_service::{get_auth_token, principals_from_claims, validate_jwt};
use crate::services::error::EditError;
use crate::state::AppState;

fn deny() -> Response {
    error_reply(EditError::AccessDenied).into_response()
}

/// Authenticate the caller and attach its principals (`Vec<String>`) to the request
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {

    // 1. Get the auth token from the request
    let token = match get_auth_token(&req) {
        Ok(token) => token,
        Err(e) => {
            info!("Unauthenticated request to {}: {}", req.uri().path(), e);
            return deny();
        }
    };

    // 2. Validate Token
    let secret = match &state.config.auth_jwt_secret {
        Some(secret) => secret,
        None => {
            error!("Auth JWT secret not configured");
            return deny();
        }
    };
    let token_data = match validate_jwt(&token, secret) {
        Ok(token_data) => token_data,
        Err(e) => {
            info!("JWT validation failed: {}", e);
            return deny();
        }
    };

    // 3. Derive the principals from the claims
    let prpls = match principals_from_claims(&token_data.claims) {
        Ok(prpls) => prpls,
        Err(e) => {
            info!("Rejected token: {}", e);
            return deny();
        }
    };
    debug!("Authenticated {:?}", prpls);

    // 4. Set these principals into request extensions for downstream layers
    req.extensions_mut().insert(prpls);

    next.run(req).await
}
