//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the traversal loop, which:
//! - Walks the listing-page chain strictly in sequence
//! - Queues every newly discovered detail URL exactly once
//! - Fetches detail pages on a bounded pool of tokio tasks
//! - Deduplicates parsed records by UPC and streams them into the sink
//! - Handles retries, truncation, structural anomalies and cancellation

use crate::config::Config;
use crate::crawler::detail::{parse_detail, ExtractError, ParsedBook};
use crate::crawler::fetcher::{fetch_with_retry, FetchResult, Fetcher, HttpFetcher, RetryPolicy};
use crate::crawler::frontier::Frontier;
use crate::crawler::listing::parse_listing;
use crate::output::{CrawlStats, JsonArraySink, RecordSink};
use crate::state::{DetailState, ListingState};
use crate::url::{is_allowed, normalize_url, resolve_link};
use crate::config::validate;
use crate::{CrawlError, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How often (in emitted records) progress is logged
const PROGRESS_INTERVAL: u64 = 50;

/// What a detail worker produced
#[derive(Debug)]
enum DetailResult {
    Parsed(ParsedBook),
    Malformed(ExtractError),
    FetchFailed(String),
}

/// A finished detail task, handed back to the coordinator
#[derive(Debug)]
struct DetailOutcome {
    url: Url,
    result: DetailResult,
    retries: u32,
}

/// Where the listing chain goes after one listing page
enum ListingStep {
    Advance(Url),
    Done,
    Truncated,
    Cancelled,
}

/// Main crawler coordinator structure
///
/// Owns the frontier, the set of emitted UPCs and the sink. Detail workers
/// never touch any of them: they return a [`DetailOutcome`] and the
/// coordinator applies it, so inserts into the seen sets and writes to the
/// sink are serialized without locks.
pub struct Coordinator<S: RecordSink> {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    sink: S,
    frontier: Frontier,
    workers: JoinSet<DetailOutcome>,
    permits: Arc<Semaphore>,
    retry: RetryPolicy,
    visited_listings: HashSet<String>,
    emitted_upcs: HashSet<String>,
    stats: CrawlStats,
    cancel: CancellationToken,
}

impl<S: RecordSink> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration (seed URL, allowlist, limits)
    /// * `fetcher` - Retrieves page markup
    /// * `sink` - Receives each record as soon as it is extracted
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>, sink: S) -> Self {
        let permits = Arc::new(Semaphore::new(
            config.crawler.max_concurrent_details.max(1) as usize,
        ));
        let retry = RetryPolicy::from_config(&config.crawler);

        Self {
            config,
            fetcher,
            sink,
            frontier: Frontier::new(),
            workers: JoinSet::new(),
            permits,
            retry,
            visited_listings: HashSet::new(),
            emitted_upcs: HashSet::new(),
            stats: CrawlStats::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Lets the caller abort the crawl through `token`
    ///
    /// Records already written stay in the sink and the sink is still
    /// finished, so the output remains a well-formed collection.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs the crawl to completion
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStats)` - The chain ended (normally, truncated or cancelled)
    /// * `Err(CrawlError::SeedUnreachable)` - The first listing page could not be fetched
    /// * `Err(CrawlError::Output)` - The sink failed; the crawl cannot produce output
    pub async fn run(&mut self) -> Result<CrawlStats> {
        self.stats = CrawlStats::started();

        let seed = Url::parse(&self.config.crawler.seed_url)?;
        tracing::info!("Starting crawl at {}", seed);

        let mut next = Some(seed);
        let mut is_seed = true;

        while let Some(listing_url) = next.take() {
            if self.cancel.is_cancelled() {
                break;
            }

            // Keep the frontier bounded: let detail work catch up before
            // discovering more of it
            self.drain_until_below(self.config.crawler.max_pending_details as usize)
                .await?;
            if self.cancel.is_cancelled() {
                break;
            }

            match self.crawl_listing(listing_url, is_seed).await? {
                ListingStep::Advance(url) => next = Some(url),
                ListingStep::Done | ListingStep::Truncated | ListingStep::Cancelled => {}
            }
            is_seed = false;
        }

        self.drain_until_below(1).await?;

        if self.cancel.is_cancelled() {
            self.stats.cancelled = true;
            self.workers.abort_all();
            let dropped = self.frontier.clear_pending();
            tracing::warn!(
                "Crawl cancelled; {} queued and {} in-flight detail pages abandoned",
                dropped,
                self.workers.len()
            );
            while self.workers.join_next().await.is_some() {}
        }

        self.sink.finish()?;
        self.stats.finished_at = Some(Utc::now());

        tracing::info!(
            "Crawl finished: {} records from {} listing pages ({} skipped, {} fetch failures, {} duplicates)",
            self.stats.records_emitted,
            self.stats.listing_pages,
            self.stats.records_skipped,
            self.stats.detail_fetch_failures,
            self.stats.duplicate_records
        );

        Ok(self.stats.clone())
    }

    /// Fetches and parses one listing page, queues its detail links and
    /// decides where the chain continues
    async fn crawl_listing(&mut self, url: Url, is_seed: bool) -> Result<ListingStep> {
        self.visited_listings.insert(normalize_url(&url).to_string());
        let mut empty_retries = 0;

        loop {
            tracing::debug!("Fetching listing page {}", url);

            let fetched = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(ListingStep::Cancelled),
                fetched = fetch_with_retry(self.fetcher.as_ref(), &url, &self.retry) => fetched,
            };
            self.stats.retries += u64::from(fetched.retries);

            let (final_url, body) = match fetched.result {
                FetchResult::Success {
                    final_url, body, ..
                } => {
                    self.visited_listings
                        .insert(normalize_url(&final_url).to_string());
                    (final_url, body)
                }
                failure => {
                    log_listing(&url, ListingState::Fetching, ListingState::Truncated);
                    if is_seed {
                        return Err(CrawlError::SeedUnreachable {
                            url: url.to_string(),
                            reason: failure.describe(),
                        });
                    }
                    tracing::warn!(
                        "Listing page {} failed after {} retries ({}); listing chain truncated, later pages are lost",
                        url,
                        fetched.retries,
                        failure.describe()
                    );
                    self.stats.truncated_at = Some(url.to_string());
                    return Ok(ListingStep::Truncated);
                }
            };

            log_listing(&url, ListingState::Fetching, ListingState::Parsing);
            let page = parse_listing(&body);

            if page.detail_links.is_empty()
                && page.next_page.is_some()
                && empty_retries < self.config.crawler.empty_listing_retries
            {
                log_listing(&url, ListingState::Parsing, ListingState::Fetching);
                let delay = self.retry.backoff(empty_retries);
                empty_retries += 1;
                self.stats.empty_listing_retries += 1;
                tracing::warn!(
                    "Listing page {} has a next link but no books; refetching in {:?} ({}/{})",
                    url,
                    delay,
                    empty_retries,
                    self.config.crawler.empty_listing_retries
                );
                tokio::select! {
                    _ = self.cancel.cancelled() => return Ok(ListingStep::Cancelled),
                    _ = tokio::time::sleep(delay) => continue,
                }
            }

            self.stats.listing_pages += 1;

            if page.is_empty() {
                tracing::warn!(
                    "Listing page {} has no book links and no next link; treating it as the end of the catalog",
                    url
                );
            }

            let queued = self.enqueue_details(&final_url, &page.detail_links);
            tracing::info!(
                "Listing page {}: {} book links, {} new",
                url,
                page.detail_links.len(),
                queued
            );
            self.spawn_ready_workers();

            let Some(next) = page
                .next_page
                .as_deref()
                .and_then(|href| self.next_listing_url(href, &final_url))
            else {
                log_listing(&url, ListingState::Parsing, ListingState::Done);
                return Ok(ListingStep::Done);
            };

            log_listing(&url, ListingState::Parsing, ListingState::Advancing);
            return Ok(ListingStep::Advance(next));
        }
    }

    /// Resolves and vets the next-page link; None ends the chain
    fn next_listing_url(&self, href: &str, base: &Url) -> Option<Url> {
        let Some(next) = resolve_link(href, base) else {
            tracing::warn!("Next-page link '{}' on {} is not followable", href, base);
            return None;
        };

        if !is_allowed(&next, &self.config.crawler.allowed_domains) {
            tracing::warn!("Next-page link {} leaves the allowed domains; stopping", next);
            return None;
        }

        if self
            .visited_listings
            .contains(normalize_url(&next).as_str())
        {
            tracing::warn!("Next-page link {} points back into the chain; stopping", next);
            return None;
        }

        Some(next)
    }

    /// Queues new detail links; returns how many were actually new
    fn enqueue_details(&mut self, base: &Url, links: &[String]) -> usize {
        let mut queued = 0;

        for href in links {
            let Some(url) = resolve_link(href, base) else {
                tracing::debug!("Skipping unfollowable detail link '{}' on {}", href, base);
                continue;
            };

            if !is_allowed(&url, &self.config.crawler.allowed_domains) {
                tracing::debug!("Skipping off-site detail link {}", url);
                self.stats.offsite_links += 1;
                continue;
            }

            if self.frontier.push(url) {
                self.stats.details_discovered += 1;
                queued += 1;
            } else {
                self.stats.duplicate_links += 1;
            }
        }

        queued
    }

    /// Moves queued URLs onto worker tasks while permits are available
    ///
    /// Nothing new is started once the crawl is cancelled.
    fn spawn_ready_workers(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }

        while !self.frontier.is_empty() {
            let Ok(permit) = self.permits.clone().try_acquire_owned() else {
                break;
            };
            let Some(url) = self.frontier.pop() else {
                break;
            };

            let fetcher = Arc::clone(&self.fetcher);
            let retry = self.retry;
            self.workers
                .spawn(process_detail(fetcher, url, retry, permit));
        }
    }

    /// Collects finished detail tasks until fewer than `limit` detail pages
    /// are queued or in flight (or the crawl is cancelled)
    async fn drain_until_below(&mut self, limit: usize) -> Result<()> {
        loop {
            self.spawn_ready_workers();

            if self.frontier.len() + self.workers.len() < limit || self.workers.is_empty() {
                return Ok(());
            }

            let joined = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(()),
                joined = self.workers.join_next() => joined,
            };

            match joined {
                Some(Ok(outcome)) => self.apply_outcome(outcome)?,
                Some(Err(e)) if e.is_panic() => {
                    tracing::error!("Detail worker panicked: {}", e);
                    self.stats.records_skipped += 1;
                }
                Some(Err(_)) => {}
                None => return Ok(()),
            }
        }
    }

    /// Applies a finished detail task: dedup by UPC, write to the sink, count
    fn apply_outcome(&mut self, outcome: DetailOutcome) -> Result<()> {
        self.stats.retries += u64::from(outcome.retries);
        let url = outcome.url;

        match outcome.result {
            DetailResult::FetchFailed(reason) => {
                log_detail(&url, DetailState::Fetching, DetailState::Skipped);
                self.stats.detail_fetch_failures += 1;
                tracing::warn!("Skipping {}: fetch failed ({})", url, reason);
            }

            DetailResult::Malformed(e) => {
                log_detail(&url, DetailState::Parsing, DetailState::Skipped);
                self.stats.details_fetched += 1;
                self.stats.records_skipped += 1;
                tracing::warn!("Skipping {}: {}", url, e);
            }

            DetailResult::Parsed(book) => {
                self.stats.details_fetched += 1;

                if !self.emitted_upcs.insert(book.upc.clone()) {
                    log_detail(&url, DetailState::Parsing, DetailState::Skipped);
                    self.stats.duplicate_records += 1;
                    tracing::debug!("Skipping {}: UPC {} already emitted", url, book.upc);
                    return Ok(());
                }

                let record = book.into_record();
                self.sink.write(&record)?;
                log_detail(&url, DetailState::Parsing, DetailState::Emitted);
                self.stats.records_emitted += 1;

                if self.stats.records_emitted % PROGRESS_INTERVAL == 0 {
                    tracing::info!(
                        "Progress: {} records, {} queued, {} in flight",
                        self.stats.records_emitted,
                        self.frontier.len(),
                        self.workers.len()
                    );
                }
            }
        }

        Ok(())
    }
}

/// Fetches and parses one detail page on a worker task
///
/// The semaphore permit is held for the lifetime of the task.
async fn process_detail(
    fetcher: Arc<dyn Fetcher>,
    url: Url,
    retry: RetryPolicy,
    _permit: OwnedSemaphorePermit,
) -> DetailOutcome {
    log_detail(&url, DetailState::Queued, DetailState::Fetching);
    let fetched = fetch_with_retry(fetcher.as_ref(), &url, &retry).await;

    let result = match fetched.result {
        FetchResult::Success {
            final_url, body, ..
        } => {
            log_detail(&url, DetailState::Fetching, DetailState::Parsing);
            match parse_detail(&body, &final_url) {
                Ok(book) => DetailResult::Parsed(book),
                Err(e) => DetailResult::Malformed(e),
            }
        }
        failure => DetailResult::FetchFailed(failure.describe()),
    };

    DetailOutcome {
        url,
        result,
        retries: fetched.retries,
    }
}

fn log_detail(url: &Url, from: DetailState, to: DetailState) {
    debug_assert!(
        from.can_transition_to(to),
        "illegal detail transition {} -> {}",
        from,
        to
    );
    tracing::trace!("detail {}: {} -> {}", url, from, to);
}

fn log_listing(url: &Url, from: ListingState, to: ListingState) {
    debug_assert!(
        from.can_transition_to(to),
        "illegal listing transition {} -> {}",
        from,
        to
    );
    tracing::trace!("listing {}: {} -> {}", url, from, to);
}

/// Runs a complete crawl over HTTP into the configured JSON file
///
/// The configuration is validated first; an invalid one fails with
/// [`CrawlError::Config`] before any request is made.
///
/// # Example
///
/// ```no_run
/// use bookcrawl::config::Config;
/// use bookcrawl::crawler::run_crawl;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stats = run_crawl(Config::default(), CancellationToken::new()).await?;
/// println!("{} books", stats.records_emitted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, cancel: CancellationToken) -> Result<CrawlStats> {
    validate(&config)?;

    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler)?;
    let sink = JsonArraySink::create(Path::new(&config.output.books_path))?;

    let mut coordinator =
        Coordinator::new(config, Arc::new(fetcher), sink).with_cancellation(cancel);
    coordinator.run().await
}
