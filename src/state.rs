//! Shared state handed to every axum handler.

use crate::webhook::Dispatcher;

/// Application state for the `State` extractor.
///
/// Cloning is cheap: the dispatcher shares its registry through an `Arc`.
#[derive(Clone, Debug)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Reported by `GET /health`
    pub name: String,
    pub version: String,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            dispatcher,
            name: name.into(),
            version: version.into(),
        }
    }
}
