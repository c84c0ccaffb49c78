use thiserror::Error;

use crate::config::ConfigError;
use crate::server::ServerError;
use crate::webhook::RegistryError;

/// Top-level error for the HTTP surface and the CLI.
#[derive(Error, Debug)]
pub enum AppError {
    /// No registered provider claimed an inbound request.
    #[error("No provider recognized {method} {path}")]
    Unrouted { method: String, path: String },

    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Provider registration failed")]
    Registry(#[from] RegistryError),

    #[error("Server error")]
    Server(#[from] ServerError),

    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn unrouted(method: impl ToString, path: impl Into<String>) -> Self {
        AppError::Unrouted {
            method: method.to_string(),
            path: path.into(),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            ConfigError::FileNotFound(_) => "file".to_string(),
            _ => "config".to_string(),
        };
        AppError::Configuration {
            key,
            source: error.into(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

pub type AppResult<T> = Result<T, AppError>;
