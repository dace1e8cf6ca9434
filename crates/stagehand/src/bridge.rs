//! HTTP client for the bridge backend's capture endpoints.
//!
//! Three calls, all small JSON over plain POST/GET:
//! - `POST /bridge/start-capture` arms the capture slot and clears any
//!   previous result so polling cannot see stale data.
//! - `POST /bridge/notify-host` relays a one-shot event to the host's
//!   scripting sandbox over UDP. Best effort.
//! - `GET /bridge/latest` returns the current slot contents with a
//!   `has_data` flag.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use croonproto::BridgeLatest;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("bridge returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// The coordinator's view of the bridge backend. Swapped for an in-memory
/// double in tests.
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Arm the capture slot. Must clear the previous result server-side.
    async fn arm_capture(&self) -> Result<(), BridgeError>;

    /// Relay a one-shot event toward the host. Callers treat failure as
    /// non-fatal.
    async fn notify_host(&self, event: &str, data: Value) -> Result<(), BridgeError>;

    /// Read whatever is in the capture slot right now.
    async fn read_latest(&self) -> Result<BridgeLatest, BridgeError>;
}

/// `BridgeClient` over HTTP with reqwest.
pub struct HttpBridgeClient {
    base_url: String,
    client: Client,
}

impl HttpBridgeClient {
    /// Create a client for the given base URL (e.g. "http://127.0.0.1:8000").
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, BridgeError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build a client from the `[bridge]` config section.
    pub fn from_config(config: &croonconf::BridgeConfig) -> Result<Self, BridgeError> {
        Self::new(
            &config.base_url,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BridgeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BridgeError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl BridgeClient for HttpBridgeClient {
    #[tracing::instrument(skip(self), fields(bridge.url = %self.base_url))]
    async fn arm_capture(&self) -> Result<(), BridgeError> {
        let response = self
            .client
            .post(format!("{}/bridge/start-capture", self.base_url))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, data), fields(bridge.url = %self.base_url))]
    async fn notify_host(&self, event: &str, data: Value) -> Result<(), BridgeError> {
        let body = serde_json::json!({ "event": event, "data": data });
        let response = self
            .client
            .post(format!("{}/bridge/notify-host", self.base_url))
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(bridge.url = %self.base_url))]
    async fn read_latest(&self) -> Result<BridgeLatest, BridgeError> {
        let response = self
            .client
            .get(format!("{}/bridge/latest", self.base_url))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }
}
