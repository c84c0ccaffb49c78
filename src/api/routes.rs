//! Router configuration.

use axum::{Router, extract::DefaultBodyLimit, http::StatusCode, middleware, routing::get};
use tower_http::timeout::TimeoutLayer;

use crate::api::handlers::{health::health_check, webhook::receive_webhook};
use crate::api::middleware::{global_error_handler, logging_middleware, request_id_middleware};
use crate::config::ServerConfig;
use crate::state::AppState;

/// Builds the application router.
///
/// # Routes
/// - `GET /health` - liveness and registered providers
/// - everything else - handed to the webhook dispatcher
///
/// # Middleware Order
/// Layers run outermost first:
/// 1. request ID
/// 2. access logging
/// 3. error body normalization
/// 4. request timeout
/// 5. body size limit
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .fallback(receive_webhook)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
