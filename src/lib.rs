//! ci-notify
//!
//! Receives webhooks from CI services, recognizes which provider sent each
//! request, decodes it into a notification, and delivers it to observers.

use shadow_rs::shadow;
shadow!(build);

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod notifier;
pub mod providers;
pub mod server;
pub mod state;
pub mod webhook;

#[cfg(test)]
pub(crate) mod test_utils;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
