//! Crawl statistics
//!
//! Counters collected by the coordinator while it walks the catalog. They
//! are the crawl's report to the operator: skipped records and a truncated
//! listing chain never change the exit code, so they have to be visible here.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters for a single crawl run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlStats {
    /// Listing pages fetched and parsed
    pub listing_pages: u64,

    /// Unique detail URLs discovered on listing pages
    pub details_discovered: u64,

    /// Detail pages fetched successfully
    pub details_fetched: u64,

    /// Records handed to the sink
    pub records_emitted: u64,

    /// Records dropped because required fields were missing
    pub records_skipped: u64,

    /// Detail pages that could not be fetched after all retries
    pub detail_fetch_failures: u64,

    /// Detail links seen again after their URL was already queued
    pub duplicate_links: u64,

    /// Parsed records whose UPC had already been emitted
    pub duplicate_records: u64,

    /// Links pointing outside the allowed domains
    pub offsite_links: u64,

    /// Fetch attempts beyond the first, across all pages
    pub retries: u64,

    /// Listing refetches triggered by a page without book links
    pub empty_listing_retries: u64,

    /// Listing URL whose failure cut the chain short, if any
    pub truncated_at: Option<String>,

    /// True if the caller aborted the crawl before it finished
    pub cancelled: bool,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlStats {
    /// Creates counters stamped with the current time as the start
    pub fn started() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Whole-crawl duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<f64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }

    /// True if every discovered detail page produced a record
    pub fn is_complete(&self) -> bool {
        !self.cancelled
            && self.truncated_at.is_none()
            && self.records_skipped == 0
            && self.detail_fetch_failures == 0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Traversal:");
    println!("  Listing pages: {}", stats.listing_pages);
    println!("  Detail pages discovered: {}", stats.details_discovered);
    println!("  Detail pages fetched: {}", stats.details_fetched);
    println!("  Duplicate links ignored: {}", stats.duplicate_links);
    println!("  Off-site links ignored: {}", stats.offsite_links);
    println!("  Retries: {}", stats.retries);
    println!();

    println!("Records:");
    println!("  Emitted: {}", stats.records_emitted);
    println!("  Skipped (malformed): {}", stats.records_skipped);
    println!("  Skipped (duplicate UPC): {}", stats.duplicate_records);
    println!("  Lost (fetch failure): {}", stats.detail_fetch_failures);
    println!();

    if let Some(url) = &stats.truncated_at {
        println!("WARNING: listing chain truncated at {}", url);
        println!("  Listing pages after this one were never reached.");
        println!();
    }

    if stats.cancelled {
        println!("Crawl was cancelled; output holds the records written so far.");
        println!();
    }

    if let Some(seconds) = stats.duration_seconds() {
        println!("Duration: {:.1}s", seconds);
    }
}
