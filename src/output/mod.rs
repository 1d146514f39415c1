//! Output module for book records and crawl reports
//!
//! This module handles:
//! - The [`Book`] record and its JSON interchange format
//! - Record sinks: the streaming JSON array file and an in-memory sink
//! - Loading a finished collection back for reporting
//! - Crawl statistics and catalog summaries (stdout and markdown)

mod book;
mod json;
mod markdown;
pub mod stats;
mod summary;
mod traits;

pub use book::{Book, Rating, UNKNOWN_CATEGORY};
pub use json::{load_books, JsonArraySink};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, CrawlStats};
pub use summary::{print_catalog_summary, CatalogSummary};
pub use traits::{MemorySink, OutputError, OutputResult, RecordSink};
