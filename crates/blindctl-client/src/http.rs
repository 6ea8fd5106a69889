//! reqwest-backed [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::endpoint::Endpoint;
use crate::error::{NetworkError, Result};
use crate::transport::Transport;

/// HTTP transport with a fixed per-request deadline.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport rooted at `base_url` (e.g. `http://192.168.4.1/api/v1`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::InvalidUrl(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// The API root this transport talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn read_body(&self, endpoint: Endpoint, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| NetworkError::from_reqwest(endpoint.path(), self.timeout.as_secs(), e))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            warn!(endpoint = %endpoint, status = status.as_u16(), "device returned an error status");
            return Err(NetworkError::from_http_status(
                endpoint.path(),
                status.as_u16(),
                body.trim(),
            ));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| NetworkError::Malformed {
            endpoint: endpoint.path().to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, endpoint: Endpoint) -> Result<Value> {
        debug!(endpoint = %endpoint, "GET");
        let response = self
            .client
            .get(self.url(endpoint))
            .send()
            .await
            .map_err(|e| NetworkError::from_reqwest(endpoint.path(), self.timeout.as_secs(), e))?;
        self.read_body(endpoint, response).await
    }

    async fn post(&self, endpoint: Endpoint, payload: Value) -> Result<Value> {
        debug!(endpoint = %endpoint, %payload, "POST");
        let response = self
            .client
            .post(self.url(endpoint))
            .json(&payload)
            .send()
            .await
            .map_err(|e| NetworkError::from_reqwest(endpoint.path(), self.timeout.as_secs(), e))?;
        self.read_body(endpoint, response).await
    }
}
