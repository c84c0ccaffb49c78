use clap::Parser;

use ci_notify::cli::{Cli, execute_command, init_logger_from_settings, load_and_merge_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_and_merge_config(&cli)?;
    let _log_handle = init_logger_from_settings(&settings)?;

    tracing::debug!(config = ?settings, "Configuration loaded");

    execute_command(&cli, settings).await?;

    Ok(())
}
