//! Configuration validation.

use crate::config::error::ConfigError;
use crate::config::settings::{FileSettings, LoggerSettings, ProvidersConfig, ServerConfig, Settings};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// Served by the router itself, never reaches a provider.
const RESERVED_PATHS: &[&str] = &["/health"];

impl ServerConfig {
    /// Port, timeouts and body limit must all be non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if self.idle_timeout == 0 {
            return Err(ConfigError::validation(
                "server.idle_timeout",
                "Idle timeout must be greater than 0 seconds.",
            ));
        }

        if self.body_limit == 0 {
            return Err(ConfigError::validation(
                "server.body_limit",
                "Body limit must be greater than 0 bytes.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

fn validate_provider(name: &str, path: &str, user_agent: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::validation(
            format!("providers.{}.path", name),
            format!("Webhook path '{}' must start with '/'.", path),
        ));
    }

    if RESERVED_PATHS.contains(&path) {
        return Err(ConfigError::validation(
            format!("providers.{}.path", name),
            format!("Webhook path '{}' is reserved by the server.", path),
        ));
    }

    if user_agent.trim().is_empty() {
        return Err(ConfigError::validation(
            format!("providers.{}.user_agent", name),
            "User agent must not be empty for an enabled provider.",
        ));
    }

    Ok(())
}

impl ProvidersConfig {
    /// At least one provider must be enabled, and every enabled provider
    /// needs an absolute path and a user agent to match on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.drone.enabled && !self.coveralls.enabled {
            return Err(ConfigError::validation(
                "providers",
                "At least one provider must be enabled.",
            ));
        }

        if self.drone.enabled {
            validate_provider("drone", &self.drone.path, &self.drone.user_agent)?;
        }

        if self.coveralls.enabled {
            validate_provider("coveralls", &self.coveralls.path, &self.coveralls.user_agent)?;
        }

        Ok(())
    }
}

impl Settings {
    /// Validates every section, returning the first error found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logger.validate()?;
        self.providers.validate()?;
        Ok(())
    }
}
