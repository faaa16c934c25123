use crate::{
    handlers::{field_restore, field_update, health_check, list_collections, load_documents, load_documents_query, ready_check},
    routes::{access_gate::access_gate, auth_middleware::auth_middleware},
    state::AppState,
};
use axum::{middleware, routing::{get, post}, Router};

/// Create API routes
pub fn create_api_routes(state: AppState) -> Router {
    let firestore_routes = Router::<AppState>::new()
        .route("/update", post(field_update))
        .route("/restore", post(field_restore))
        .route("/documents", get(load_documents_query).post(load_documents))
        .route("/collections", get(list_collections))
        // Layers run bottom-up: authenticate first, then check the permission
        .route_layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::<AppState>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .nest("/firestore", firestore_routes)
        .with_state(state)
}
