//! Outbound webhook delivery.
//!
//! One POST per relayed message, bounded by a timeout. Best effort and
//! at-most-once: errors are returned to the caller for logging, never retried.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::bridge::OutboundPayload;
use crate::error::DeliveryError;

/// Content type sent with every outbound payload.
pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Posts payloads to side webhooks over a shared, pooled HTTP client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct DeliverySender {
    client: reqwest::Client,
    timeout: Duration,
}

impl DeliverySender {
    /// Build a sender whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("webhook-bridge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }

    /// POST `payload` as JSON to `url`.
    ///
    /// Returns the destination's status on a 2xx response.
    pub async fn send(
        &self,
        url: &str,
        payload: &OutboundPayload,
    ) -> Result<StatusCode, DeliveryError> {
        let body = serde_json::to_vec(payload)?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_UTF8)
            .body(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status { status, body });
        }
        Ok(status)
    }

    fn classify(&self, err: reqwest::Error) -> DeliveryError {
        if err.is_timeout() {
            DeliveryError::Timeout(self.timeout)
        } else {
            DeliveryError::Transport(err)
        }
    }
}
