//! URL handling module for Bookcrawl
//!
//! This module resolves relative catalog links, derives the URL key used for
//! visit deduplication, and filters links against the configured domain
//! allowlist.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_allowed, matches_wildcard};
pub use normalize::normalize_url;

use url::Url;

/// Resolves a link href against the page it was found on
///
/// Returns None if the link should be excluded:
/// - empty hrefs and fragment-only anchors
/// - javascript:, mailto:, tel: and data: schemes
/// - hrefs that fail to join with the base
/// - non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use bookcrawl::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://books.toscrape.com/catalogue/page-2.html").unwrap();
/// let url = resolve_link("a-light-in-the-attic_1000/index.html", &base).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://books.toscrape.com/catalogue/a-light-in-the-attic_1000/index.html"
/// );
/// ```
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
