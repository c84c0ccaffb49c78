use thiserror::Error;

/// Errors raised while posting a notification to a listener.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid notify address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to encode payload: {0}")]
    Encode(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
