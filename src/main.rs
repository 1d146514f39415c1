//! Bookcrawl main entry point
//!
//! This is the command-line interface for the bookcrawl catalog crawler.

use anyhow::Context;
use bookcrawl::config::{load_config_with_hash, validate, Config};
use bookcrawl::crawler::run_crawl;
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Bookcrawl: a book-catalog crawler
///
/// Bookcrawl walks a paginated book catalog from its first listing page to
/// the last, extracts one record per book detail page and writes the
/// records to a JSON collection.
#[derive(Parser, Debug)]
#[command(name = "bookcrawl")]
#[command(version)]
#[command(about = "A book-catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults if omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the seed listing URL
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Override the output collection path
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show a catalog summary of the collected books and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Write the markdown catalog summary from the collected books and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given; using defaults");
            Config::default()
        }
    };

    apply_overrides(&mut config, &cli)?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bookcrawl=info,warn"),
            1 => EnvFilter::new("bookcrawl=debug,info"),
            2 => EnvFilter::new("bookcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides and re-validates the result
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(seed) = &cli.seed {
        config.crawler.seed_url = seed.clone();
    }
    if let Some(output) = &cli.output {
        config.output.books_path = output.clone();
    }

    validate(config).context("invalid configuration")?;
    Ok(())
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Bookcrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!(
        "  Allowed domains: {}",
        config.crawler.allowed_domains.join(", ")
    );
    println!(
        "  Max concurrent detail fetches: {}",
        config.crawler.max_concurrent_details
    );
    println!(
        "  Max pending detail pages: {}",
        config.crawler.max_pending_details
    );
    println!(
        "  Request timeout: {}s (connect {}s)",
        config.crawler.request_timeout_secs, config.crawler.connect_timeout_secs
    );
    println!(
        "  Retries: {} (base backoff {}ms)",
        config.crawler.max_retries, config.crawler.retry_backoff_ms
    );
    println!(
        "  Empty listing retries: {}",
        config.crawler.empty_listing_retries
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Books: {}", config.output.books_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", config.crawler.seed_url);
}

/// Handles the --stats mode: summarizes the collected books
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use bookcrawl::output::{load_books, print_catalog_summary, CatalogSummary};

    println!("Collection: {}\n", config.output.books_path);

    let books = load_books(Path::new(&config.output.books_path))?;
    let summary = CatalogSummary::from_books(&books);
    print_catalog_summary(&summary);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    use bookcrawl::output::{generate_markdown_summary, load_books, CatalogSummary};

    println!("=== Exporting Catalog Summary ===\n");
    println!("Collection: {}", config.output.books_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    tracing::info!("Loading collected books...");
    let books = load_books(Path::new(&config.output.books_path))?;

    tracing::info!("Generating markdown summary...");
    let summary = CatalogSummary::from_books(&books);
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    use bookcrawl::output::print_statistics;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing the output file and stopping");
            on_interrupt.cancel();
        }
    });

    tracing::info!(
        "Crawling {} (allowed: {})",
        config.crawler.seed_url,
        config.crawler.allowed_domains.join(", ")
    );

    let books_path = config.output.books_path.clone();
    match run_crawl(config, cancel).await {
        Ok(stats) => {
            print_statistics(&stats);
            if stats.is_complete() {
                tracing::info!("Crawl completed successfully");
            } else {
                tracing::warn!("Crawl completed with gaps; see statistics above");
            }
            println!("✓ Books written to: {}", books_path);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
