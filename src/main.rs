use firestore_admin::config::Config;
use firestore_admin::routes::create_app;
use firestore_admin::services::document_store;
use firestore_admin::state::AppState;
use tracing::{info, error, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use std::panic;

#[tokio::main(flavor = "current_thread")]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "firestore_admin=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    if config.is_development() {
        info!("Running in development mode");
    }
    if config.auth_jwt_secret.is_none() {
        warn!("No AUTH_JWT_SECRET configured - every Firestore request will be denied");
    }

    // Build the document store once; a failure here is reported by every request
    let store = document_store::connect(&config);
    if !store.is_connected() {
        warn!("Document store unavailable - Firestore routes will answer 503");
    }

    let address = config.server_address();
    let app = create_app(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", address));

    info!("🚀 Server running on http://{}", address);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
