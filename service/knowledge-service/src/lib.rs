//! HTTP surface over C1/C2/C4/C6/C7/C8 (spec.md §6). Grounded on the
//! teacher's `HybridService` for the "one struct wires every store" shape,
//! widened to an `axum` router since the teacher carried no HTTP layer.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the full router under `state.config.api_prefix`. `/health` sits
/// outside the prefix and the auth layer (spec.md §6 "every route except
/// health/root").
pub fn build_router(state: AppState) -> Router {
    let prefix = format!("/{}", state.config.api_prefix.trim_matches('/'));

    let guarded = Router::new()
        .route("/index/:source", post(routes::index::start_one))
        .route("/index", post(routes::index::start_all))
        .route("/index/status", get(routes::index::status))
        .route("/index/:source/reset", post(routes::index::reset))
        .route("/search", get(routes::search::search))
        .route("/navigate", post(routes::navigate::navigate))
        .route("/analytics/stats", get(routes::analytics::stats))
        .route("/analytics/health", get(routes::analytics::health_all))
        .route("/analytics/health/:source", get(routes::analytics::health_one))
        .route("/analytics/config", get(routes::analytics::config_export))
        .route("/analytics/config", post(routes::analytics::config_import))
        .route("/workflows", get(routes::workflows::list))
        .route("/workflows/:id", get(routes::workflows::get))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_api_key));

    Router::new()
        .route("/health", get(routes::health::health))
        .nest(&prefix, guarded)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
