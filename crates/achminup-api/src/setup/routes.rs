//! Route configuration and setup.

use crate::handlers::{assets, health};
use crate::state::AppState;
use achminup_core::Config;
use achminup_infra::request_id_middleware;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    tracing::info!(
        max_upload_mb = config.max_upload_bytes / 1024 / 1024,
        "Request body limit enabled"
    );

    Router::new()
        .route(
            "/api/{format}/{id}",
            put(assets::upload_asset).delete(assets::delete_asset),
        )
        .route("/health", get(health::health_check))
        .with_state(state)
        // Uploads are streamed to disk; the limit layer bounds them instead
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
