//! Configuration management.
//!
//! Settings are layered, lowest priority first:
//! 1. `default.toml`
//! 2. `{environment}.toml`
//! 3. `local.toml` (not committed)
//! 4. `CINOTIFY_*` environment variables
//!
//! Setting `CINOTIFY_CONFIG_FILE` replaces the three files with a single one.

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    ApplicationConfig, ConsoleSettings, CoverallsSettings, DroneSettings, FileSettings,
    LoggerSettings, ProvidersConfig, ServerConfig, Settings,
};
