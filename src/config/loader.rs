//! Layered configuration loader.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "CINOTIFY_CONFIG_DIR";

const CONFIG_FILE_ENV: &str = "CINOTIFY_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";

const ENV_PREFIX: &str = "CINOTIFY";

const ENV_SEPARATOR: &str = "__";

/// Loads [`Settings`] from TOML layers and `CINOTIFY_*` variables.
///
/// Sources in increasing priority: `default.toml` (required),
/// `{environment}.toml`, `local.toml`, then the environment. When a single
/// config file is given, it replaces the three TOML layers.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// Skips layered loading when set
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Creates a loader from `CINOTIFY_CONFIG_DIR`, `CINOTIFY_CONFIG_FILE`
    /// and `CINOTIFY_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Fails if both `CINOTIFY_CONFIG_DIR` and `CINOTIFY_CONFIG_FILE` are set.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));

        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_file.is_some() && std::env::var(CONFIG_DIR_ENV).is_ok() {
            return Err(ConfigError::mutual_exclusivity(
                "CINOTIFY_CONFIG_DIR and CINOTIFY_CONFIG_FILE cannot both be set. \
                 Use CINOTIFY_CONFIG_DIR for layered configuration or \
                 CINOTIFY_CONFIG_FILE for a single configuration file.",
            ));
        }

        let environment = AppEnvironment::from_env();

        Ok(Self {
            config_dir,
            config_file,
            environment,
        })
    }

    /// Loads a single file, ignoring `CINOTIFY_CONFIG_DIR`.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: Some(path.into()),
            environment: AppEnvironment::from_env(),
        }
    }

    /// Overrides the environment read from `CINOTIFY_APP_ENV`.
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Loads and validates settings from every source.
    ///
    /// # Errors
    ///
    /// Fails if a required file is missing, a layer cannot be parsed, or the
    /// merged settings do not validate.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = if let Some(ref config_file) = self.config_file {
            self.add_file_source(builder, config_file, true)?
        } else {
            self.build_layered_config(builder)?
        };

        // CINOTIFY_SERVER__PORT -> server.port
        let builder = Self::add_env_source(builder);

        builder.build().map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let default_path = self.config_dir.join("default.toml");
        let builder = self.add_file_source(builder, &default_path, true)?;

        let env_path = self.config_dir.join(self.environment.file_name());
        let builder = self.add_file_source(builder, &env_path, false)?;

        let local_path = self.config_dir.join("local.toml");
        let builder = self.add_file_source(builder, &local_path, false)?;

        Ok(builder)
    }

    fn add_file_source(
        &self,
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        Ok(builder.add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(required),
        ))
    }

    /// Maps `CINOTIFY_*` variables onto keys, `__` separating nested keys:
    /// `CINOTIFY_PROVIDERS__DRONE__USER_AGENT` -> `providers.drone.user_agent`.
    fn add_env_source(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> config::ConfigBuilder<config::builder::DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
            environment: AppEnvironment::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::env_lock;
    use std::fs;
    use tempfile::TempDir;

    const DEFAULT_TOML: &str = r#"
[application]
name = "test-app"
version = "1.0.0"

[server]
host = "127.0.0.1"
port = 3333
request_timeout = 5

[logger]
level = "info"

[logger.console]
enabled = true
colored = false

[providers.drone]
enabled = true
user_agent = "dronenotify"

[providers.coveralls]
enabled = true
user_agent = "ruby"
"#;

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).expect("Failed to write config file");
        }
        temp_dir
    }

    /// Restores every touched variable on drop.
    struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            let mut guard = Self {
                vars_to_restore: Vec::new(),
            };
            for key in [CONFIG_DIR_ENV, CONFIG_FILE_ENV, AppEnvironment::ENV_VAR] {
                guard.remove(key);
            }
            guard
        }

        fn set(&mut self, key: &str, value: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        fn remove(&mut self, key: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in self.vars_to_restore.iter().rev() {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_loader_new_default() {
        let _guard = env_lock();
        let _env = EnvGuard::new();

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.config_dir(), Path::new("config"));
        assert!(loader.config_file().is_none());
        assert_eq!(loader.environment(), AppEnvironment::Development);
    }

    #[test]
    fn test_config_loader_mutual_exclusivity_error() {
        let _guard = env_lock();
        let mut env = EnvGuard::new();

        env.set("CINOTIFY_CONFIG_DIR", "/custom/config");
        env.set("CINOTIFY_CONFIG_FILE", "/path/to/config.toml");

        match ConfigLoader::new() {
            Err(ConfigError::MutualExclusivityError(msg)) => {
                assert!(msg.contains("CINOTIFY_CONFIG_DIR"));
                assert!(msg.contains("CINOTIFY_CONFIG_FILE"));
            }
            other => panic!("Expected MutualExclusivityError, got {:?}", other),
        }
    }

    #[test]
    fn test_config_loader_environment_from_env() {
        let _guard = env_lock();
        let mut env = EnvGuard::new();

        env.set("CINOTIFY_APP_ENV", "production");

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.environment(), AppEnvironment::Production);
    }

    #[test]
    fn test_load_missing_default_toml() {
        let _guard = env_lock();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[]);
        env.set("CINOTIFY_CONFIG_DIR", temp_dir.path().to_str().unwrap());

        let result = ConfigLoader::new().unwrap().load();

        match result {
            Err(ConfigError::FileNotFound(msg)) => assert!(msg.contains("default.toml")),
            other => panic!("Expected FileNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_default_toml_only() {
        let _guard = env_lock();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[("default.toml", DEFAULT_TOML)]);
        env.set("CINOTIFY_CONFIG_DIR", temp_dir.path().to_str().unwrap());

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");

        assert_eq!(settings.application.name, "test-app");
        assert_eq!(settings.server.port, 3333);
        assert_eq!(settings.server.body_limit, 1024 * 1024);
        assert!(settings.providers.drone.enabled);
    }

    #[test]
    fn test_load_full_precedence_chain() {
        let _guard = env_lock();
        let mut env = EnvGuard::new();

        let staging = r#"
[application]
name = "staging-app"

[server]
port = 4001

[providers.coveralls]
user_agent = "coveralls-staging"
"#;
        let local = r#"
[server]
port = 4002
"#;
        let temp_dir = setup_config_dir(&[
            ("default.toml", DEFAULT_TOML),
            ("staging.toml", staging),
            ("local.toml", local),
        ]);
        env.set("CINOTIFY_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.set("CINOTIFY_APP_ENV", "staging");
        env.set("CINOTIFY_SERVER__PORT", "4003");
        env.set("CINOTIFY_PROVIDERS__DRONE__PATH", "/drone");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");

        assert_eq!(settings.server.port, 4003);
        assert_eq!(settings.providers.drone.path, "/drone");
        assert_eq!(settings.providers.coveralls.user_agent, "coveralls-staging");
        assert_eq!(settings.application.name, "staging-app");
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.application.version, "1.0.0");
    }

    #[test]
    fn test_load_single_file_mode() {
        let _guard = env_lock();
        let mut env = EnvGuard::new();

        let single = r#"
[server]
host = "0.0.0.0"
port = 5000

[providers.coveralls]
enabled = false
"#;
        let temp_dir = setup_config_dir(&[("single.toml", single)]);
        let path = temp_dir.path().join("single.toml");
        env.set("CINOTIFY_CONFIG_FILE", path.to_str().unwrap());

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 5000);
        assert!(!settings.providers.coveralls.enabled);
    }

    #[test]
    fn test_from_file_missing() {
        let _guard = env_lock();
        let _env = EnvGuard::new();

        let result = ConfigLoader::from_file("/nonexistent/ci-notify.toml").load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_rejects_invalid_settings() {
        let _guard = env_lock();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[("default.toml", DEFAULT_TOML)]);
        env.set("CINOTIFY_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.set("CINOTIFY_PROVIDERS__DRONE__ENABLED", "false");
        env.set("CINOTIFY_PROVIDERS__COVERALLS__ENABLED", "false");

        let result = ConfigLoader::new().unwrap().load();
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError { ref field, .. }) if field == "providers"
        ));
    }
}
