//! HTTP client for API fetches with rate limiting and error handling
//!
//! A thin wrapper over reqwest that throttles requests so the sequential
//! fetch loop stays well under the target site's tolerance.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{
    clock::DefaultClock,
    state::{direct::NotKeyed, InMemoryState},
    Quota, RateLimiter,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;

/// Rate-limited HTTP client shared by all API calls of one run.
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout_seconds: u64, max_requests_per_second: u32) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).context("Invalid user agent")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .default_headers(headers)
            .gzip(true)
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(max_requests_per_second).context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
        })
    }

    /// Issues a GET with the given query pairs and parses the body as JSON.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value> {
        self.rate_limiter.until_ready().await;

        tracing::debug!(url, "fetching");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP request failed with status {status}: {url}");
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from: {url}"))
    }
}
