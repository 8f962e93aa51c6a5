use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::DiscoveryError;
use crate::retry::RetryPolicy;

/// Upstream endpoint listing the currently offered events, in no fixed schema.
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    async fn fetch_listing(&self) -> Result<Value, DiscoveryError>;

    fn name(&self) -> &str;
}

/// Discovery over plain HTTP, retried with exponential backoff.
pub struct HttpDiscovery {
    http: Client,
    url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpDiscovery {
    pub fn new(http: Client, url: &str, timeout: Duration) -> Self {
        HttpDiscovery {
            http,
            url: url.to_string(),
            timeout,
            retry: RetryPolicy::discovery(),
        }
    }

    async fn fetch_once(&self) -> Result<Value, DiscoveryError> {
        let body = self
            .http
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        serde_json::from_slice(&body).map_err(|e| DiscoveryError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl DiscoverySource for HttpDiscovery {
    fn name(&self) -> &str {
        "http-discovery"
    }

    async fn fetch_listing(&self) -> Result<Value, DiscoveryError> {
        let mut attempt = 0;
        loop {
            debug!("Fetching discovery listing from {} (attempt {})", self.url, attempt + 1);
            match self.fetch_once().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!("Discovery attempt {} failed: {} (retrying in {:?})", attempt + 1, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Shared reqwest client with the browser-like headers the exchange expects.
///
/// No client-wide timeout is set: discovery and lobby requests carry their own
/// limit, and event pages are bounded by the detail fetcher.
pub fn build_http_client(config: &Config) -> anyhow::Result<Client> {
    use anyhow::Context;

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent).context("Invalid User-Agent header")?,
    );
    headers.insert(
        REFERER,
        HeaderValue::from_str(&config.referer).context("Invalid Referer header")?,
    );
    headers.insert(
        ORIGIN,
        HeaderValue::from_str(&config.origin).context("Invalid Origin header")?,
    );

    Client::builder()
        .default_headers(headers)
        .build()
        .context("Failed to build HTTP client")
}
