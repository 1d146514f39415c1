//! Crawler module for catalog traversal and page extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry and backoff
//! - Listing page parsing (detail links and the next-page link)
//! - Detail page extraction into book records
//! - The deduplicating detail frontier
//! - Overall crawl coordination

mod coordinator;
mod detail;
mod fetcher;
mod frontier;
mod listing;

pub use coordinator::{run_crawl, Coordinator};
pub use detail::{normalize_availability, parse_detail, rating_from_class, ExtractError, ParsedBook};
pub use fetcher::{
    build_http_client, fetch_with_retry, FetchResult, Fetcher, HttpFetcher, RetriedFetch,
    RetryPolicy,
};
pub use frontier::Frontier;
pub use listing::{parse_listing, ListingPage};
