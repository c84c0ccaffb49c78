//! Observers receive decoded notifications.
//!
//! An observer is either a stateful [`Subscriber`] object or a plain closure.
//! Both are wrapped in the [`Observer`] enum and invoked the same way by the
//! dispatcher.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use super::notification::SharedNotification;

/// Stateful observer.
///
/// Implementations must not block for long: the request that produced the
/// notification waits for every observer in turn.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Called once per delivered notification. `provider` is the name the
    /// producing adapter was registered under.
    async fn notify(&self, provider: &str, notification: SharedNotification);
}

/// Closure observer.
pub type NotifyFn = Arc<dyn Fn(&str, &SharedNotification) + Send + Sync>;

/// One registered observer.
#[derive(Clone)]
pub enum Observer {
    Subscriber(Arc<dyn Subscriber>),
    Func(NotifyFn),
}

impl Observer {
    pub fn subscriber<S>(subscriber: S) -> Self
    where
        S: Subscriber + 'static,
    {
        Self::Subscriber(Arc::new(subscriber))
    }

    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&str, &SharedNotification) + Send + Sync + 'static,
    {
        Self::Func(Arc::new(f))
    }

    /// Delivers one notification, catching any panic raised by the observer.
    pub(crate) async fn invoke(
        &self,
        provider: &str,
        notification: &SharedNotification,
    ) -> Result<(), String> {
        let outcome = match self {
            Observer::Subscriber(subscriber) => {
                AssertUnwindSafe(subscriber.notify(provider, Arc::clone(notification)))
                    .catch_unwind()
                    .await
            }
            Observer::Func(f) => {
                std::panic::catch_unwind(AssertUnwindSafe(|| f(provider, notification)))
            }
        };

        outcome.map_err(panic_message)
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observer::Subscriber(_) => f.write_str("Observer::Subscriber"),
            Observer::Func(_) => f.write_str("Observer::Func"),
        }
    }
}

impl<S> From<Arc<S>> for Observer
where
    S: Subscriber + 'static,
{
    fn from(subscriber: Arc<S>) -> Self {
        Self::Subscriber(subscriber)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "observer panicked".to_string()
    }
}

/// Subscriber that writes every notification to the log at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSubscriber;

#[async_trait]
impl Subscriber for LoggingSubscriber {
    async fn notify(&self, provider: &str, notification: SharedNotification) {
        tracing::info!(provider = %provider, notification = %notification, "Notification received");
    }
}
