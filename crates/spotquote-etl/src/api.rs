//! HTTP client for the spot price API
//!
//! One GET per run, no retry. Anything but `200 OK` is a connection failure;
//! a `200` with a body that is not JSON is a validation failure.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ConfigurationError, ConnectionError, Result, ValidationError};

/// Request timeout for the quote API.
pub const API_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("spotquote-etl/", env!("CARGO_PKG_VERSION"));

/// Anything that can hand the extraction service one raw quote payload
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self) -> Result<Value>;
}

/// Quote source backed by a public JSON endpoint
pub struct ApiClient {
    client: Client,
    url: String,
}

impl ApiClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, API_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfigurationError::InvalidSetting {
                name: "http client",
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn transport_error(&self, source: reqwest::Error) -> ConnectionError {
        ConnectionError::ApiTransport {
            url: self.url.clone(),
            source,
        }
    }
}

#[async_trait]
impl QuoteSource for ApiClient {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Value> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Quote API answered with a failure status");
            return Err(ConnectionError::ApiStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let payload: Value = serde_json::from_slice(&body).map_err(ValidationError::from)?;

        debug!(bytes = body.len(), "Quote payload received");
        Ok(payload)
    }
}
