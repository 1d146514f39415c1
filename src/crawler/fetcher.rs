//! Page fetching
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The [`Fetcher`] trait the coordinator depends on
//! - Building the reqwest client with user agent and timeouts
//! - Error classification (retryable or not)
//! - Bounded retries with exponential backoff

use crate::config::{CrawlerConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects, used as the base for relative links
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// The server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// No usable response (connection refused, DNS failure, timeout, body read error)
    NetworkError {
        /// Error description
        error: String,
        /// True if the request hit the per-fetch timeout
        timed_out: bool,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns true if a later attempt may succeed
    ///
    /// | Condition | Retry |
    /// |-----------|-------|
    /// | HTTP 5xx | yes |
    /// | HTTP 408, 429 | yes |
    /// | Other HTTP 4xx | no |
    /// | Timeout, connection error | yes |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Success { .. } => false,
            Self::HttpError { status_code } => {
                *status_code >= 500 || *status_code == 408 || *status_code == 429
            }
            Self::NetworkError { .. } => true,
        }
    }

    /// Short description of a failure, for logs and error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Success { status_code, .. } => format!("HTTP {}", status_code),
            Self::HttpError { status_code } => format!("HTTP {}", status_code),
            Self::NetworkError { error, timed_out } => {
                if *timed_out {
                    format!("timeout: {}", error)
                } else {
                    error.clone()
                }
            }
        }
    }
}

/// Retrieves raw page markup
///
/// The coordinator only depends on this trait, so tests and embedders can
/// serve pages from memory instead of the network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> FetchResult;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Identification sent with every request
/// * `crawler` - Supplies the request and connect timeouts
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(crawler.request_timeout())
        .connect_timeout(crawler.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, crawler)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return classify_request_error(e),
        };

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return FetchResult::HttpError {
                status_code: status.as_u16(),
            };
        }

        match response.text().await {
            Ok(body) => FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                body,
            },
            Err(e) => classify_request_error(e),
        }
    }
}

fn classify_request_error(e: reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            timed_out: true,
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: format!("Connection failed: {}", e),
            timed_out: false,
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
            timed_out: false,
        }
    }
}

/// Retry budget for a single URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each subsequent one
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: config.retry_backoff(),
        }
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

/// Outcome of [`fetch_with_retry`]: the final result and how many retries it took
#[derive(Debug, Clone)]
pub struct RetriedFetch {
    pub result: FetchResult,
    pub retries: u32,
}

/// Fetches a URL, retrying retryable failures with exponential backoff
///
/// Returns the first success, the first non-retryable failure, or the last
/// failure once the budget is spent.
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    url: &Url,
    policy: &RetryPolicy,
) -> RetriedFetch {
    let mut retries = 0;
    loop {
        let result = fetcher.fetch(url).await;

        if result.is_success() || !result.is_retryable() || retries >= policy.max_retries {
            return RetriedFetch { result, retries };
        }

        let delay = policy.backoff(retries);
        tracing::debug!(
            "Fetch of {} failed ({}), retry {}/{} in {:?}",
            url,
            result.describe(),
            retries + 1,
            policy.max_retries,
            delay
        );
        tokio::time::sleep(delay).await;
        retries += 1;
    }
}
