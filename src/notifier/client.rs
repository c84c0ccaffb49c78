use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{StatusCode, Url};

use super::WirePayload;
use super::error::NotifyError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Turns a listener address into the URL notifications are posted to.
///
/// A bare `host:port` is posted to `http://host:port/`. Addresses that
/// already carry a scheme are used as given.
pub fn endpoint_url(address: &str) -> Result<Url, NotifyError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: "address is empty".to_string(),
        });
    }

    let raw = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}/", address)
    };

    Url::parse(&raw).map_err(|e| NotifyError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// HTTP client posting [`WirePayload`]s to one listener.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: Url,
}

impl WebhookClient {
    pub fn new(address: &str) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(NotifyError::Client)?;
        Self::with_client(client, address)
    }

    /// Uses an existing client, sharing its connection pool.
    pub fn with_client(client: reqwest::Client, address: &str) -> Result<Self, NotifyError> {
        Ok(Self {
            client,
            url: endpoint_url(address)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Posts `payload` and returns the listener's status code.
    ///
    /// Any response counts as delivered; only transport failures are errors.
    pub async fn send<P>(&self, payload: &P) -> Result<StatusCode, NotifyError>
    where
        P: WirePayload + ?Sized,
    {
        let body = payload.encode()?;

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, payload.content_type())
            .header(USER_AGENT, payload.user_agent())
            .body(body)
            .send()
            .await
            .map_err(|source| NotifyError::Request {
                url: self.url.to_string(),
                source,
            })?;

        let status = response.status();
        tracing::debug!(url = %self.url, status = %status, "Notification posted");
        Ok(status)
    }
}
