use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Bookcrawl
///
/// Every section and key is optional; missing values fall back to the
/// defaults for the public books.toscrape.com catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// First listing page of the catalog
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Hosts the crawler may fetch from (supports "*.example.com")
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Maximum number of detail pages fetched at the same time
    #[serde(rename = "max-concurrent-details")]
    pub max_concurrent_details: u32,

    /// Queued plus in-flight detail pages allowed before the listing chain pauses
    #[serde(rename = "max-pending-details")]
    pub max_pending_details: u32,

    /// Whole-request timeout for a single fetch (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// TCP/TLS connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Extra attempts after a retryable fetch failure
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base delay before the first retry; doubles on every further attempt (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Refetches of a listing page that has a next link but no book links
    #[serde(rename = "empty-listing-retries")]
    pub empty_listing_retries: u32,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: "https://books.toscrape.com/".to_string(),
            allowed_domains: vec!["books.toscrape.com".to_string()],
            max_concurrent_details: 8,
            max_pending_details: 200,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 3,
            retry_backoff_ms: 500,
            empty_listing_retries: 1,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "bookcrawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/bookcrawl/bookcrawl".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the JSON array of book records
    #[serde(rename = "books-path")]
    pub books_path: String,

    /// Path to the markdown catalog summary
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            books_path: "data/books.json".to_string(),
            summary_path: "data/summary.md".to_string(),
        }
    }
}
