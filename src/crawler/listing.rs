//! Listing page parser
//!
//! A listing page is one page of the paginated catalog. It carries a grid of
//! book summaries, each linking to the book's detail page, and (except on
//! the last page) a "next" pager link.

use scraper::{Html, Selector};
use std::sync::OnceLock;

/// Links extracted from one listing page
///
/// Links are returned exactly as written in the markup (usually relative);
/// the coordinator resolves them against the listing page's URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Detail page links in document order
    pub detail_links: Vec<String>,

    /// Link to the next listing page; `None` on the last page
    pub next_page: Option<String>,
}

impl ListingPage {
    /// True if the page has neither book links nor a next link
    pub fn is_empty(&self) -> bool {
        self.detail_links.is_empty() && self.next_page.is_none()
    }
}

fn detail_link_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| {
        Selector::parse("article.product_pod h3 a[href]").expect("valid detail link selector")
    })
}

fn next_page_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("li.next a[href]").expect("valid next page selector"))
}

/// Parses a catalog listing page
///
/// A page without any book summaries yields an empty `detail_links` list
/// rather than an error; telling an empty page apart from a failed fetch is
/// the fetcher's job.
///
/// # Example
///
/// ```
/// use bookcrawl::crawler::parse_listing;
///
/// let html = r#"
///     <ol class="row">
///       <li><article class="product_pod"><h3><a href="a-light_1000/index.html">A Light</a></h3></article></li>
///     </ol>
///     <ul class="pager"><li class="next"><a href="page-2.html">next</a></li></ul>
/// "#;
/// let page = parse_listing(html);
/// assert_eq!(page.detail_links, vec!["a-light_1000/index.html"]);
/// assert_eq!(page.next_page.as_deref(), Some("page-2.html"));
/// ```
pub fn parse_listing(html: &str) -> ListingPage {
    let document = Html::parse_document(html);

    let detail_links = document
        .select(detail_link_selector())
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect();

    let next_page = document
        .select(next_page_selector())
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string);

    ListingPage {
        detail_links,
        next_page,
    }
}
