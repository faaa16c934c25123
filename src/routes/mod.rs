pub mod access_gate;
pub mod api;
pub mod auth_middleware;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::{AllowOrigin, CorsLayer}, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::state::AppState;

pub use api::create_api_routes;

/// The complete application: API routes, Swagger UI, tracing and CORS
pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origin_list()
        .into_iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let app = Router::new()
        // Mount API routes
        .nest("/api", create_api_routes(state))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add tracing layer
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if origins.is_empty() {
        return app;
    }

    app.layer(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}
