//! Provider adapter abstraction.

use std::fmt;

use super::error::DecodeError;
use super::matcher::MatchSpec;
use super::notification::SharedNotification;
use super::request::WebhookRequest;

/// Recognizes and decodes the webhooks of one CI provider.
///
/// All providers must be `Send + Sync`: one adapter instance serves every
/// concurrent request.
///
/// # Example Implementation
/// ```ignore
/// struct TravisAdapter {
///     spec: MatchSpec,
/// }
///
/// impl ProviderAdapter for TravisAdapter {
///     fn match_spec(&self) -> &MatchSpec {
///         &self.spec
///     }
///
///     fn handle(&self, request: &WebhookRequest) -> Result<SharedNotification, DecodeError> {
///         let payload: TravisPayload = serde_json::from_slice(request.body())?;
///         Ok(Arc::new(payload))
///     }
/// }
/// ```
pub trait ProviderAdapter: Send + Sync {
    /// Declarative description of the requests this adapter claims.
    fn match_spec(&self) -> &MatchSpec;

    /// Returns true when this adapter claims `request`.
    ///
    /// Defaults to evaluating [`match_spec`](ProviderAdapter::match_spec).
    fn recognize(&self, request: &WebhookRequest) -> bool {
        self.match_spec().matches(request)
    }

    /// Decodes a recognized request into a notification.
    fn handle(&self, request: &WebhookRequest) -> Result<SharedNotification, DecodeError>;
}

/// Adapter built from a match spec and a decoding closure.
pub struct FnAdapter<F> {
    spec: MatchSpec,
    decode: F,
}

impl<F> FnAdapter<F>
where
    F: Fn(&WebhookRequest) -> Result<SharedNotification, DecodeError> + Send + Sync,
{
    pub fn new(spec: MatchSpec, decode: F) -> Self {
        Self { spec, decode }
    }
}

impl<F> ProviderAdapter for FnAdapter<F>
where
    F: Fn(&WebhookRequest) -> Result<SharedNotification, DecodeError> + Send + Sync,
{
    fn match_spec(&self) -> &MatchSpec {
        &self.spec
    }

    fn handle(&self, request: &WebhookRequest) -> Result<SharedNotification, DecodeError> {
        (self.decode)(request)
    }
}

impl<F> fmt::Debug for FnAdapter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAdapter").field("spec", &self.spec).finish()
    }
}
