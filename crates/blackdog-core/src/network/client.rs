//! HTTP client wrapper.
//!
//! Provides a wrapper around reqwest with:
//! - A bounded timeout on every request, surfaced as a fetch failure
//! - User-agent management
//! - Page fetching that treats any non-success status as "unavailable"

use crate::config::NetworkConfig;
use crate::{BlackDogError, Result};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// HTTP client shared by the catalog scraper and the archive proxy.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    /// Timeout applied to every request.
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_timeout(NetworkConfig::REQUEST_TIMEOUT)
    }

    /// Create a new HTTP client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| BlackDogError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: None,
            })?;

        Ok(Self { client, timeout })
    }

    /// Get a reference to the underlying reqwest client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Make a GET request. The response is returned whatever its status.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.client.get(url).send().await.map_err(|e| self.map_send_error("GET", url, e))
    }

    /// Make a HEAD request. The response is returned whatever its status.
    pub async fn head(&self, url: &str) -> Result<Response> {
        self.client
            .head(url)
            .send()
            .await
            .map_err(|e| self.map_send_error("HEAD", url, e))
    }

    /// Fetch a page body, or `None` if the server answered with a non-success status.
    pub async fn get_page(&self, url: &str) -> Result<Option<String>> {
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            debug!("GET {} answered {}", url, status);
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }

    /// Fetch a page body, failing on a non-success status.
    pub async fn get_required_page(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BlackDogError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    fn map_send_error(&self, method: &str, url: &str, err: reqwest::Error) -> BlackDogError {
        if err.is_timeout() {
            BlackDogError::Timeout(self.timeout)
        } else {
            BlackDogError::Network {
                message: format!("{} {} failed: {}", method, url, err),
                cause: std::error::Error::source(&err).map(|s| s.to_string()),
            }
        }
    }
}
