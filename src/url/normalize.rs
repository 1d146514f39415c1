use url::Url;

/// Produces the key used to decide whether a URL was already visited
///
/// The `url` crate has already resolved dot segments and lowercased the
/// scheme when parsing. On top of that this:
///
/// 1. Lowercases the host
/// 2. Removes the fragment
/// 3. Removes an empty query string (trailing `?`)
///
/// Path case and query parameter order are preserved: catalog servers are
/// free to treat them as significant.
///
/// # Examples
///
/// ```
/// use bookcrawl::url::normalize_url;
/// use url::Url;
///
/// let url = Url::parse("https://books.toscrape.com/catalogue/a_1/index.html?#reviews").unwrap();
/// assert_eq!(
///     normalize_url(&url).as_str(),
///     "https://books.toscrape.com/catalogue/a_1/index.html"
/// );
/// ```
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();

    if let Some(host) = url.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host {
            // Only fails for cannot-be-a-base URLs, which have no host anyway
            let _ = normalized.set_host(Some(&lowered));
        }
    }

    normalized.set_fragment(None);

    if normalized.query() == Some("") {
        normalized.set_query(None);
    }

    normalized
}
