//! Serve command handler.

use std::sync::Arc;

use crate::config::Settings;
use crate::error::AppResult;
use crate::providers::register_enabled;
use crate::server::Server;
use crate::webhook::{LoggingSubscriber, Observer, Registry};

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Validates and exits when `dry_run` is set; otherwise serves until a
    /// shutdown signal arrives.
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Provider registration errors
    /// - Listener bind and serve errors
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only();
        }

        self.config.validate()?;
        let registry = self.build_registry()?;
        Server::new(self.config.clone(), registry).run().await?;
        Ok(())
    }

    /// Validates the configuration and reports what would be served.
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        let registry = self.build_registry()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!("✓ Providers: {}", registry.providers().join(", "));
        println!("Dry run completed successfully");
        Ok(())
    }

    /// Registry holding the enabled providers, with every notification
    /// logged at `info`.
    pub fn build_registry(&self) -> AppResult<Arc<Registry>> {
        let registry = Arc::new(Registry::new());
        let names = register_enabled(&registry, &self.config.providers)?;
        registry.subscribe(Observer::subscriber(LoggingSubscriber));

        tracing::debug!(providers = ?names, "Providers registered");
        Ok(registry)
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_handler_new() {
        let config = Settings::default();
        let handler = ServeCommandHandler::new(config.clone());
        assert_eq!(handler.config(), &config);
    }

    #[tokio::test]
    async fn test_serve_handler_dry_run() {
        let handler = ServeCommandHandler::new(Settings::default());
        assert!(handler.execute(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_serve_handler_dry_run_invalid_config() {
        let mut config = Settings::default();
        config.server.port = 0;
        let handler = ServeCommandHandler::new(config);
        assert!(handler.execute(true).await.is_err());
    }

    #[test]
    fn test_build_registry_respects_enabled_flags() {
        let mut config = Settings::default();
        config.providers.coveralls.enabled = false;

        let registry = ServeCommandHandler::new(config).build_registry().unwrap();
        assert_eq!(registry.providers(), vec!["drone"]);
        assert_eq!(registry.observer_count("drone"), Some(1));
    }
}
