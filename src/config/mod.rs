//! Configuration module for Bookcrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: [`Config::default`] targets the public
//! books.toscrape.com catalog.
//!
//! # Example
//!
//! ```no_run
//! use bookcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("bookcrawl.toml")).unwrap();
//! println!("Crawl starts at: {}", config.crawler.seed_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
