//! Route definitions for the control API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::AppState;

use super::api;

/// Create the main router with all routes
pub fn create_router(app_state: Arc<AppState>, config: &HttpConfig) -> Router {
    let cors = if config.cors_enabled {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/api/status", get(api::get_status))
        .route("/api/config", get(api::get_config).put(api::update_config))
        .route("/api/tracking/start", post(api::start_tracking))
        .route("/api/tracking/stop", post(api::stop_tracking))
        .route("/api/calibrate", post(api::calibrate))
        .route("/api/avatar", post(api::load_avatar))
        // Pose stream for the renderer
        .route("/api/stream", get(api::pose_stream))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
