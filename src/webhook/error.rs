//! Error types for the webhook core.

use std::num::ParseFloatError;

use thiserror::Error;

/// Errors raised while registering adapters or subscribing observers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A provider with this name is already registered. The first
    /// registration is kept.
    #[error("provider '{0}' is already registered")]
    DuplicateProvider(String),

    /// No provider with this name is registered.
    #[error("provider '{0}' is not registered")]
    UnknownProvider(String),
}

/// Errors raised by an adapter that recognized a request but could not
/// decode its payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to parse form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    #[error("failed to decode json payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse {field}({source}): {value:?}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("{message}")]
    Invalid { message: String },
}

impl DecodeError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
