//! Router configuration for the web server.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Search API
        .route("/search", get(handlers::search))
        .route("/search/compare", get(handlers::compare))
        // Raw source files (scans, page images, text dumps)
        .route("/content/:category/*path", get(handlers::serve_content))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
