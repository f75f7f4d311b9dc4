//! Page fetching boundary.
//!
//! Fetch failure is a data condition, not a control-flow fault: the trait
//! returns `None` on any failure so the pipeline can skip and continue.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Fetches a page's HTML, or `None` when it cannot be loaded.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// reqwest-backed fetcher with a navigation timeout and a fixed post-load
/// settle delay to respect target-site load limits.
pub struct HttpFetcher {
    client: reqwest::Client,
    settle_delay: Duration,
}

impl HttpFetcher {
    pub fn new(nav_timeout: Duration, settle_delay: Duration) -> Result<Self> {
        // Browser-like User-Agent to avoid trivial bot detection.
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let client = reqwest::Client::builder()
            .timeout(nav_timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            settle_delay,
        })
    }

    async fn fetch_inner(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {status} for {url}");
        }

        response.text().await.context("failed to read response body")
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        let result = self.fetch_inner(url).await;

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        match result {
            Ok(html) => Some(html),
            Err(error) => {
                tracing::warn!(url = %url, error = %error, "fetch failed");
                None
            }
        }
    }
}
