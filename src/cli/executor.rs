//! Dispatches a parsed command to its handler.

use super::handlers::ServeCommandHandler;
use super::parser::{Cli, Commands};
use crate::config::Settings;
use crate::error::AppResult;

/// Runs the command selected on the command line; `serve` when none is.
///
/// # Errors
/// Returns errors from the command handler
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    warn_on_privileged_port(&settings);

    let dry_run = match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => *dry_run,
        None => false,
    };

    ServeCommandHandler::new(settings).execute(dry_run).await
}

fn warn_on_privileged_port(settings: &Settings) {
    if settings.server.port < 1024 {
        tracing::warn!(
            port = settings.server.port,
            "Binding to a port below 1024 typically requires elevated privileges"
        );
    }
}
