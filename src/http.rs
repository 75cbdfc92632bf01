//! Authenticated JSON transport

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::auth::Credential;
use crate::error::{LabelerError, Result};

/// Performs authenticated requests and returns parsed JSON
///
/// Any non-2xx response fails with [`LabelerError::TransportError`] carrying the
/// status and the raw response body.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get_json(&self, url: &str, credential: &Credential) -> Result<Value>;

    async fn post_json(&self, url: &str, credential: &Credential, body: &Value) -> Result<Value>;
}

/// [`HttpClient`] on top of reqwest
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    http: Client,
}

impl ReqwestHttpClient {
    /// # Arguments
    /// * `timeout` - Per-request timeout; `None` waits indefinitely
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| LabelerError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    async fn send(&self, request: RequestBuilder, credential: &Credential) -> Result<Value> {
        let response = request.bearer_auth(credential.bearer_token()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "Request failed");
            return Err(LabelerError::TransportError {
                status: status.as_u16(),
                body,
            });
        }

        // Some endpoints answer 2xx with an empty body
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body)
            .map_err(|e| LabelerError::SchemaError(format!("Response body is not JSON: {}", e)))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get_json(&self, url: &str, credential: &Credential) -> Result<Value> {
        debug!("GET {}", url);
        self.send(self.http.get(url), credential).await
    }

    async fn post_json(&self, url: &str, credential: &Credential, body: &Value) -> Result<Value> {
        debug!("POST {}", url);
        self.send(self.http.post(url).json(body), credential).await
    }
}
