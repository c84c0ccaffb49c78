//! Announces a Drone build to a ci-notify listener.
//!
//! Meant to run as a pipeline step: every field comes from the variables
//! Drone exports, and each can be overridden with a flag.

use anyhow::Context;
use clap::Parser;

use ci_notify::logger::{LoggerConfig, init_logger};
use ci_notify::notifier::WebhookClient;
use ci_notify::providers::DroneNotification;

#[derive(Parser, Debug)]
#[command(name = "drone-notify")]
#[command(about = "Posts the current Drone build to a ci-notify listener")]
#[command(version = ci_notify::clap_long_version())]
struct Args {
    /// Listener address, as host:port or a full URL
    ///
    /// When unset the step logs a message and succeeds without sending.
    #[arg(long, env = "DRONE_NOTIFY_ADDRESS")]
    address: Option<String>,

    #[arg(long, env = "DRONE_REPO_SLUG", default_value = "")]
    repo_slug: String,

    #[arg(long, env = "DRONE_BUILD_URL", default_value = "")]
    build_url: String,

    #[arg(long, env = "DRONE_BUILD_DIR", default_value = "")]
    build_dir: String,

    #[arg(long, env = "DRONE_BUILD_NUMBER", default_value = "")]
    build_number: String,

    #[arg(long, env = "DRONE_COMMIT", default_value = "")]
    commit: String,

    #[arg(long, env = "DRONE_BRANCH", default_value = "")]
    branch: String,

    /// Log level for this run
    #[arg(long, env = "DRONE_NOTIFY_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn notification(&self) -> DroneNotification {
        DroneNotification {
            repo_slug: self.repo_slug.clone(),
            build_url: self.build_url.clone(),
            build_dir: self.build_dir.clone(),
            build_number: self.build_number.clone(),
            commit: self.commit.clone(),
            branch: self.branch.clone(),
        }
    }

    /// Listener address, if one was given and is not blank.
    fn address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logger = LoggerConfig {
        level: args.log_level.clone(),
        ..LoggerConfig::default()
    };
    init_logger(logger)?;

    let Some(address) = args.address() else {
        tracing::info!("DRONE_NOTIFY_ADDRESS is not set, skipping notification");
        return Ok(());
    };

    let notification = args.notification();
    let client = WebhookClient::new(address)?;

    tracing::info!(url = %client.url(), notification = %notification, "Sending notification");

    let status = client
        .send(&notification)
        .await
        .with_context(|| format!("Failed to notify {}", client.url()))?;

    if status.is_success() {
        tracing::info!(status = %status, "Notification delivered");
    } else {
        tracing::warn!(status = %status, "Listener did not accept notification");
    }

    Ok(())
}
