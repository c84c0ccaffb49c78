//! Drone build runner adapter.
//!
//! Drone posts a JSON document produced by the `drone-notify` binary at the
//! start of each build.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::DroneSettings;
use crate::notifier::{NotifyError, WirePayload};
use crate::webhook::{
    DecodeError, MatchSpec, Notification, ProviderAdapter, SharedNotification, WebhookRequest,
};

/// Name the adapter is registered under.
pub const NAME: &str = "drone";

/// User agent sent by `drone-notify`.
pub const DEFAULT_USER_AGENT: &str = "dronenotify";

pub const CONTENT_TYPE: &str = "application/json";

/// Build notification sent by `drone-notify`.
///
/// Missing fields decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneNotification {
    pub repo_slug: String,
    pub build_url: String,
    pub build_dir: String,
    pub build_number: String,
    pub commit: String,
    pub branch: String,
}

impl fmt::Display for DroneNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Drone[{}]: Job #{} Initiated at {}",
            self.repo_slug, self.build_number, self.build_url
        )
    }
}

impl Notification for DroneNotification {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl WirePayload for DroneNotification {
    fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    fn user_agent(&self) -> &'static str {
        DEFAULT_USER_AGENT
    }

    fn encode(&self) -> Result<Vec<u8>, NotifyError> {
        serde_json::to_vec(self).map_err(|e| NotifyError::Encode(e.to_string()))
    }
}

/// Adapter for Drone webhooks.
#[derive(Debug, Clone)]
pub struct DroneAdapter {
    spec: MatchSpec,
}

impl DroneAdapter {
    pub fn new(spec: MatchSpec) -> Self {
        Self { spec }
    }

    /// Builds the adapter from configuration.
    pub fn from_settings(settings: &DroneSettings) -> Self {
        Self::new(
            MatchSpec::post(settings.path.clone())
                .content_type(CONTENT_TYPE)
                .user_agent(settings.user_agent.clone()),
        )
    }
}

impl Default for DroneAdapter {
    fn default() -> Self {
        Self::from_settings(&DroneSettings::default())
    }
}

impl ProviderAdapter for DroneAdapter {
    fn match_spec(&self) -> &MatchSpec {
        &self.spec
    }

    fn handle(&self, request: &WebhookRequest) -> Result<SharedNotification, DecodeError> {
        let notification: DroneNotification = serde_json::from_slice(request.body())?;
        Ok(Arc::new(notification))
    }
}
