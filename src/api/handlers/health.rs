//! Liveness endpoint.

use axum::{Json, extract::State};

use crate::api::dto::HealthResponse;
use crate::state::AppState;

/// `GET /health`: reports the version and the registered providers.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        name: state.name.clone(),
        version: state.version.clone(),
        providers: state.dispatcher.registry().providers(),
    })
}
