//! Routes requests to adapters and fans notifications out to observers.

use std::sync::Arc;

use super::registry::Registry;
use super::request::WebhookRequest;

/// What happened to one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The adapter produced a notification and observers were invoked.
    /// `failed` counts observers that panicked.
    Delivered {
        provider: String,
        observers: usize,
        failed: usize,
    },
    /// The adapter recognized the request but could not decode it.
    DecodeFailed { provider: String },
    /// No adapter recognized the request.
    Unrouted,
}

/// Runs the match → decode → notify pipeline against a shared registry.
///
/// Cloning is cheap; all clones share the same registry.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Handles one request end to end.
    ///
    /// Decode failures are logged and reported as
    /// [`DispatchOutcome::DecodeFailed`]; they never surface as errors so the
    /// caller can still acknowledge the webhook. Observers run one after the
    /// other in subscription order, and a panicking observer does not stop
    /// delivery to the rest.
    pub async fn handle_and_dispatch(&self, request: &WebhookRequest) -> DispatchOutcome {
        let matched = self.registry.route(request);

        let Some(route) = matched.route else {
            tracing::warn!(
                method = %request.method(),
                path = %request.path(),
                headers = ?request.headers(),
                "No provider recognized request"
            );
            return DispatchOutcome::Unrouted;
        };

        if !matched.shadowed.is_empty() {
            tracing::warn!(
                provider = %route.provider,
                ignored = ?matched.shadowed,
                "Request recognized by several providers, using the first"
            );
        }

        let notification = match route.adapter.handle(request) {
            Ok(notification) => notification,
            Err(e) => {
                tracing::warn!(provider = %route.provider, error = %e, "Failed to decode webhook payload");
                return DispatchOutcome::DecodeFailed {
                    provider: route.provider,
                };
            }
        };

        tracing::debug!(
            provider = %route.provider,
            observers = route.observers.len(),
            "Dispatching notification"
        );

        let mut failed = 0;
        for observer in &route.observers {
            if let Err(message) = observer.invoke(&route.provider, &notification).await {
                failed += 1;
                tracing::error!(
                    provider = %route.provider,
                    panic = %message,
                    "Observer panicked while handling notification"
                );
            }
        }

        DispatchOutcome::Delivered {
            observers: route.observers.len(),
            failed,
            provider: route.provider,
        }
    }
}
