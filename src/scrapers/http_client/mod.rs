//! HTTP client for episode detail pages.

mod user_agent;

pub use user_agent::{resolve_browser_user_agent, resolve_user_agent, USER_AGENT};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::ScrapeError;

/// Something that can GET a URL and return its body as text.
///
/// The detail fetcher goes through this seam so it can run against canned
/// pages in tests.
#[async_trait]
pub trait FetchText: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Plain HTTP client: one GET per call, no retries.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_delay: Duration,
}

impl HttpClient {
    /// Create a new HTTP client.
    /// - `user_agent_config`: None for the podnotes UA, `"impersonate"`, or a custom string.
    pub fn new(
        timeout: Duration,
        request_delay: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(resolve_user_agent(user_agent_config))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            request_delay,
        })
    }

    /// GET `url` and return the body. Non-2xx statuses are errors.
    pub async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;

        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        Ok(body)
    }
}

#[async_trait]
impl FetchText for HttpClient {
    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
        self.get_text(url).await
    }
}
