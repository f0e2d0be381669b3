use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::get_status))
        // Capture toggle
        .route("/capture/start", post(handlers::start_capture))
        .route("/capture/stop", post(handlers::stop_capture))
        // Recording while capturing
        .route("/recording/start", post(handlers::start_recording))
        .route("/recording/stop", post(handlers::stop_recording))
        // Output folder
        .route(
            "/folder",
            get(handlers::get_folder).post(handlers::pick_folder),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        // The presentation layer is typically a local web page
        .layer(CorsLayer::permissive())
        .with_state(state)
}
