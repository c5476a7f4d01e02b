use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::key_requests;
use super::keys;
use super::quotes;
use super::state::AppState;

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // API info
        .route("/api", get(health::api_info))
        // Catalog (API-key gated)
        .nest("/api/quotes", quotes::create_quotes_router())
        // Key management (operator only)
        .nest("/api/keys", keys::create_keys_router())
        // Key request workflow
        .nest("/api/key-requests", key_requests::create_key_requests_router())
        // Catalog administration (operator only)
        .nest("/api/admin/quotes", admin::create_admin_quotes_router())
        // Add state and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
