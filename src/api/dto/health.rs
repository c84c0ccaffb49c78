use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" while the listener is serving
    pub status: String,
    pub name: String,
    pub version: String,
    /// Registered providers in matching order
    pub providers: Vec<String>,
}
