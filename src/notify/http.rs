//! HTTP webhook transport backed by `reqwest`.

use crate::notify::gateway::{DeliveryError, DeliveryResult, WebhookTransport};
use crate::notify::message::WebhookMessage;
use crate::tracker::domain::WebhookUrl;
use async_trait::async_trait;
use std::time::Duration;

/// Default per-request timeout for webhook posts.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Webhook transport that posts JSON payloads over HTTP.
#[derive(Debug, Clone)]
pub struct HttpWebhookTransport {
    client: reqwest::Client,
}

impl HttpWebhookTransport {
    /// Creates a transport with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Unreachable`] when the TLS backend cannot be
    /// initialised.
    pub fn new() -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DeliveryError::unreachable)?;
        Ok(Self { client })
    }

    /// Creates a transport around an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WebhookTransport for HttpWebhookTransport {
    async fn deliver(&self, url: &WebhookUrl, message: &WebhookMessage) -> DeliveryResult {
        let response = self
            .client
            .post(url.as_str())
            .json(message)
            .send()
            .await
            .map_err(DeliveryError::unreachable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }
        Ok(())
    }
}
