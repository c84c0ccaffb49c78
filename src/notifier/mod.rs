//! Outbound side: posts notifications to a running listener.
//!
//! Build scripts use this to announce themselves the same way the real
//! service would, so the listener recognizes the request.

mod client;
mod error;

pub use client::{WebhookClient, endpoint_url};
pub use error::NotifyError;

/// A notification that knows how to put itself on the wire.
pub trait WirePayload {
    /// Media type sent as `Content-Type`.
    fn content_type(&self) -> &'static str;

    /// Value sent as `User-Agent`.
    fn user_agent(&self) -> &'static str;

    fn encode(&self) -> Result<Vec<u8>, NotifyError>;
}
