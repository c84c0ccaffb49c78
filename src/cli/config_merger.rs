//! Merges CLI overrides on top of file configuration.
//!
//! Precedence, lowest first: TOML layers, `CINOTIFY_*` variables, global
//! flags (`--verbose`/`--quiet`), then `serve` options.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Settings};

pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads the base configuration selected by `--config` and `--env`.
    ///
    /// # Errors
    /// Returns ConfigError if loading or validation fails
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let loader = match &cli.config {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::file_not_found(path.display().to_string()));
                }
                ConfigLoader::from_file(path)
            }
            None => ConfigLoader::new()?,
        };

        let loader = match cli.env {
            Some(env) => loader.with_environment(env),
            None => loader,
        };

        tracing::debug!(
            environment = %loader.environment(),
            config_file = ?loader.config_file(),
            config_dir = %loader.config_dir().display(),
            "Loading configuration"
        );

        Ok(Self::new(loader.load()?))
    }

    /// Applies CLI overrides and validates the result.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        Self::apply_global_overrides(&mut config, cli);

        if let Some(command) = &cli.command {
            Self::apply_command_overrides(&mut config, command);
        }

        config.validate()?;

        Ok(config)
    }

    fn apply_global_overrides(config: &mut Settings, cli: &Cli) {
        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }
    }

    fn apply_command_overrides(config: &mut Settings, command: &Commands) {
        match command {
            Commands::Serve {
                host,
                port,
                log_level,
                dry_run: _,
            } => {
                if let Some(host) = host {
                    config.server.host = host.clone();
                }

                if let Some(port) = port {
                    config.server.port = *port;
                }

                // Takes precedence over --verbose/--quiet.
                if let Some(level) = log_level {
                    config.logger.level = level.as_str().to_string();
                }
            }
        }
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn merge(args: &[&str]) -> Result<Settings, ConfigError> {
        let cli = Cli::try_parse_from(args).unwrap();
        ConfigurationMerger::new(Settings::default()).merge_cli_args(&cli)
    }

    #[test]
    fn test_configuration_merger_new() {
        let base_config = Settings::default();
        let merger = ConfigurationMerger::new(base_config.clone());
        assert_eq!(merger.config(), &base_config);
    }

    #[test]
    fn test_merge_without_overrides_keeps_base() {
        assert_eq!(merge(&["ci-notify"]).unwrap(), Settings::default());
    }

    #[test]
    fn test_merge_verbose_flag() {
        assert_eq!(merge(&["ci-notify", "--verbose"]).unwrap().logger.level, "debug");
    }

    #[test]
    fn test_merge_quiet_flag() {
        assert_eq!(merge(&["ci-notify", "--quiet"]).unwrap().logger.level, "error");
    }

    #[test]
    fn test_merge_serve_host_and_port() {
        let merged = merge(&["ci-notify", "serve", "--host", "0.0.0.0", "--port", "8080"]).unwrap();
        assert_eq!(merged.server.host, "0.0.0.0");
        assert_eq!(merged.server.port, 8080);
    }

    #[test]
    fn test_command_log_level_overrides_global() {
        let merged = merge(&["ci-notify", "--verbose", "serve", "--log-level", "warn"]).unwrap();
        assert_eq!(merged.logger.level, "warn");
    }

    #[test]
    fn test_merge_validates_result() {
        let cli = Cli::try_parse_from(["ci-notify"]).unwrap();
        let mut base = Settings::default();
        base.providers.drone.enabled = false;
        base.providers.coveralls.enabled = false;

        let err = ConfigurationMerger::new(base).merge_cli_args(&cli).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "providers"));
    }

    #[test]
    fn test_from_cli_with_config_file() {
        let _lock = crate::test_utils::env_lock();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 4444\n\n[providers.drone]\nuser_agent = \"drone-ci\"").unwrap();

        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["ci-notify", "--config", path, "serve", "--host", "0.0.0.0"]).unwrap();
        let merged = ConfigurationMerger::from_cli(&cli)
            .unwrap()
            .merge_cli_args(&cli)
            .unwrap();

        assert_eq!(merged.server.port, 4444);
        assert_eq!(merged.server.host, "0.0.0.0");
        assert_eq!(merged.providers.drone.user_agent, "drone-ci");
    }
}
