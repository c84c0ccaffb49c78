//! Webhook ingestion core.
//!
//! Inbound requests are matched against registered provider adapters, the
//! claiming adapter decodes the payload into a [`Notification`], and the
//! notification is delivered to the observers subscribed to that provider.
//!
//! ```text
//! WebhookRequest → Registry::route → ProviderAdapter::handle → Observer::invoke
//! ```

mod adapter;
mod dispatcher;
mod error;
mod matcher;
mod notification;
mod observer;
mod registry;
mod request;

pub use adapter::{FnAdapter, ProviderAdapter};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{DecodeError, RegistryError};
pub use matcher::MatchSpec;
pub use notification::{Notification, SharedNotification};
pub use observer::{LoggingSubscriber, NotifyFn, Observer, Subscriber};
pub use registry::Registry;
pub use request::WebhookRequest;
