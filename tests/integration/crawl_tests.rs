//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small synthetic catalog and run the
//! full crawl cycle end-to-end over real HTTP.

use bookcrawl::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use bookcrawl::crawler::{run_crawl, Coordinator, HttpFetcher};
use bookcrawl::output::{load_books, Book, MemorySink};
use bookcrawl::{CrawlError, CrawlStats};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, books_path: &str) -> Config {
    let host = url::Url::parse(base_url)
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();

    Config {
        crawler: CrawlerConfig {
            seed_url: format!("{}/", base_url),
            allowed_domains: vec![host],
            max_concurrent_details: 4,
            max_pending_details: 50,
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
            max_retries: 1,
            retry_backoff_ms: 10,
            empty_listing_retries: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
        },
        output: OutputConfig {
            books_path: books_path.to_string(),
            summary_path: "./test_summary.md".to_string(),
        },
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

fn listing_page(detail_hrefs: &[String], next: Option<&str>) -> String {
    let pods: String = detail_hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<li class="col-xs-6"><article class="product_pod">
                   <div class="image_container"><a href="{href}"><img src="thumb.jpg"></a></div>
                   <h3><a href="{href}" title="Book">Book</a></h3>
                   </article></li>"#
            )
        })
        .collect();
    let pager = next
        .map(|href| {
            format!(r#"<ul class="pager"><li class="next"><a href="{href}">next</a></li></ul>"#)
        })
        .unwrap_or_default();

    format!(
        r#"<html><body><section><ol class="row">{pods}</ol>{pager}</section></body></html>"#
    )
}

/// A detail page; `title` None produces a page with the heading missing
fn detail_page(title: Option<&str>, upc: &str, with_description: bool) -> String {
    let heading = title.map(|t| format!("<h1>{t}</h1>")).unwrap_or_default();
    let description = if with_description {
        r#"<div id="product_description" class="sub-header"><h2>Product Description</h2></div>
           <p>A book about books.</p>"#
    } else {
        ""
    };

    format!(
        r#"<html><body>
        <ul class="breadcrumb">
          <li><a href="/index.html">Home</a></li>
          <li><a href="/catalogue/category/books_1/index.html">Books</a></li>
          <li><a href="/catalogue/category/books/poetry_23/index.html">Poetry</a></li>
          <li class="active">{upc}</li>
        </ul>
        <div class="item active"><img src="../../media/cache/{upc}.jpg" alt="cover"></div>
        <div class="product_main">
          {heading}
          <p class="price_color">£51.77</p>
          <p class="instock availability">
            <i class="icon-ok"></i>
              In stock (22 available)
          </p>
          <p class="star-rating Three"></p>
        </div>
        {description}
        <table class="table table-striped">
          <tr><th>UPC</th><td>{upc}</td></tr>
          <tr><th>Product Type</th><td>Books</td></tr>
        </table>
        </body></html>"#
    )
}

/// Mounts a catalog of `pages` listing pages with `per_page` books each
async fn mount_catalog(server: &MockServer, pages: usize, per_page: usize) {
    for p in 1..=pages {
        let listing_path = if p == 1 {
            "/".to_string()
        } else {
            format!("/catalogue/page-{}.html", p)
        };
        let hrefs: Vec<String> = (0..per_page)
            .map(|b| format!("/catalogue/book-{}-{}/index.html", p, b))
            .collect();
        let next = (p < pages).then(|| format!("/catalogue/page-{}.html", p + 1));

        Mock::given(method("GET"))
            .and(path(listing_path))
            .respond_with(html(listing_page(&hrefs, next.as_deref())))
            .mount(server)
            .await;

        for b in 0..per_page {
            Mock::given(method("GET"))
                .and(path(format!("/catalogue/book-{}-{}/index.html", p, b)))
                .respond_with(html(detail_page(
                    Some(&format!("Book {}-{}", p, b)),
                    &format!("upc{}x{}", p, b),
                    b % 2 == 0,
                )))
                .mount(server)
                .await;
        }
    }
}

async fn crawl_in_memory(config: Config) -> Result<(CrawlStats, Vec<Book>), CrawlError> {
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler)?;
    let mut coordinator = Coordinator::new(config, Arc::new(fetcher), MemorySink::new());
    let stats = coordinator.run().await?;
    Ok((stats, coordinator.into_sink().into_books()))
}

fn upcs(books: &[Book]) -> HashSet<String> {
    books.iter().map(|b| b.upc.clone()).collect()
}

#[tokio::test]
async fn test_full_catalog_crawl() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, 3, 4).await;

    let config = create_test_config(&mock_server.uri(), "unused.json");
    let (stats, books) = crawl_in_memory(config).await.expect("Crawl failed");

    assert_eq!(books.len(), 12, "Should emit N x M records");
    assert_eq!(upcs(&books).len(), 12, "Every record should have a distinct UPC");
    assert_eq!(stats.listing_pages, 3);
    assert_eq!(stats.records_emitted, 12);
    assert!(stats.is_complete());
}

#[tokio::test]
async fn test_record_extraction_over_http() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, 1, 2).await;

    let config = create_test_config(&mock_server.uri(), "unused.json");
    let (_, books) = crawl_in_memory(config).await.expect("Crawl failed");

    let with_description = books.iter().find(|b| b.upc == "upc1x0").unwrap();
    assert_eq!(with_description.title, "Book 1-0");
    assert_eq!(with_description.price, "£51.77");
    assert_eq!(with_description.rating.as_score(), 3);
    assert_eq!(with_description.availability, "In stock (22 available)");
    assert_eq!(
        with_description.description.as_deref(),
        Some("A book about books.")
    );
    assert_eq!(with_description.category, "Poetry");
    assert_eq!(
        with_description.image_url,
        format!("{}/media/cache/upc1x0.jpg", mock_server.uri())
    );

    let without_description = books.iter().find(|b| b.upc == "upc1x1").unwrap();
    assert_eq!(without_description.description, None);
}

#[tokio::test]
async fn test_detail_linked_twice_fetched_once() {
    let mock_server = MockServer::start().await;
    let shared = "/catalogue/shared_9/index.html".to_string();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing_page(
            &[shared.clone(), shared.clone()],
            Some("/catalogue/page-2.html"),
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-2.html"))
        .respond_with(html(listing_page(&[shared.clone()], None)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(shared.as_str()))
        .respond_with(html(detail_page(Some("Shared"), "sharedupc", true)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), "unused.json");
    let (stats, books) = crawl_in_memory(config).await.expect("Crawl failed");

    assert_eq!(books.len(), 1);
    assert_eq!(stats.duplicate_links, 2);
}

#[tokio::test]
async fn test_last_page_links_not_dropped() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, 2, 3).await;

    let config = create_test_config(&mock_server.uri(), "unused.json");
    let (_, books) = crawl_in_memory(config).await.expect("Crawl failed");

    let found = upcs(&books);
    for b in 0..3 {
        assert!(found.contains(&format!("upc2x{}", b)));
    }

    // Nothing beyond the last page is requested
    let requests = mock_server.received_requests().await.unwrap();
    assert!(!requests
        .iter()
        .any(|r| r.url.path() == "/catalogue/page-3.html"));
}

#[tokio::test]
async fn test_malformed_detail_contained() {
    let mock_server = MockServer::start().await;
    let hrefs: Vec<String> = (0..4).map(|i| format!("/book-{}/index.html", i)).collect();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing_page(&hrefs, None)))
        .mount(&mock_server)
        .await;
    for (i, href) in hrefs.iter().enumerate() {
        let title = (i != 2).then(|| format!("Book {}", i));
        Mock::given(method("GET"))
            .and(path(href.as_str()))
            .respond_with(html(detail_page(title.as_deref(), &format!("u{}", i), false)))
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&mock_server.uri(), "unused.json");
    let (stats, books) = crawl_in_memory(config).await.expect("Crawl failed");

    assert_eq!(books.len(), 3, "Total candidates minus malformed");
    assert!(!upcs(&books).contains("u2"));
    assert_eq!(stats.records_skipped, 1);
}

#[tokio::test]
async fn test_missing_detail_page_skipped() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, 1, 2).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing_page(
            &[
                "/catalogue/book-1-0/index.html".to_string(),
                "/catalogue/gone/index.html".to_string(),
            ],
            None,
        )))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), "unused.json");
    let (stats, books) = crawl_in_memory(config).await.expect("Crawl failed");

    assert_eq!(books.len(), 1);
    assert_eq!(stats.detail_fetch_failures, 1);
    assert!(!stats.is_complete());
}

#[tokio::test]
async fn test_unreachable_seed_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let books_path = dir.path().join("books.json");
    let config = create_test_config(&mock_server.uri(), books_path.to_str().unwrap());

    let result = run_crawl(config, CancellationToken::new()).await;
    assert!(matches!(result, Err(CrawlError::SeedUnreachable { .. })));
    assert!(!books_path.exists(), "No collection should be written");
}

#[tokio::test]
async fn test_listing_failure_truncates_chain() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalogue/page-2.html"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_catalog(&mock_server, 3, 2).await;

    let config = create_test_config(&mock_server.uri(), "unused.json");
    let (stats, books) = crawl_in_memory(config).await.expect("Crawl failed");

    assert_eq!(books.len(), 2, "Details from the seed page still drain");
    assert_eq!(
        stats.truncated_at,
        Some(format!("{}/catalogue/page-2.html", mock_server.uri()))
    );
    assert_eq!(stats.listing_pages, 1);
}

#[tokio::test]
async fn test_offsite_links_not_fetched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing_page(
            &[
                "https://elsewhere.invalid/book/index.html".to_string(),
                "/mine/index.html".to_string(),
            ],
            None,
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mine/index.html"))
        .respond_with(html(detail_page(Some("Mine"), "mine", false)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), "unused.json");
    let (stats, books) = crawl_in_memory(config).await.expect("Crawl failed");

    assert_eq!(books.len(), 1);
    assert_eq!(stats.offsite_links, 1);
}

#[tokio::test]
async fn test_collection_written_and_rerun_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, 2, 5).await;

    let dir = tempdir().unwrap();
    let first_path = dir.path().join("out").join("first.json");
    let second_path = dir.path().join("out").join("second.json");

    let first = run_crawl(
        create_test_config(&mock_server.uri(), first_path.to_str().unwrap()),
        CancellationToken::new(),
    )
    .await
    .expect("First crawl failed");
    let second = run_crawl(
        create_test_config(&mock_server.uri(), second_path.to_str().unwrap()),
        CancellationToken::new(),
    )
    .await
    .expect("Second crawl failed");

    assert_eq!(first.records_emitted, 10);
    assert_eq!(second.records_emitted, 10);

    let first_books = load_books(&first_path).expect("First collection unreadable");
    let second_books = load_books(&second_path).expect("Second collection unreadable");
    assert_eq!(upcs(&first_books), upcs(&second_books));

    let raw = std::fs::read_to_string(&first_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &json.as_array().unwrap()[0];
    assert!(record["rating"].is_u64());
    assert!(record.get("description").is_some());
}

#[tokio::test]
async fn test_cancelled_crawl_leaves_valid_collection() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, 2, 2).await;

    let dir = tempdir().unwrap();
    let books_path = dir.path().join("books.json");
    let config = create_test_config(&mock_server.uri(), books_path.to_str().unwrap());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let stats = run_crawl(config, cancel).await.expect("Cancelled crawl should not fail");

    assert!(stats.cancelled);
    assert!(load_books(&books_path).unwrap().is_empty());
}
