use url::Url;

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use bookcrawl::url::extract_domain;
///
/// let url = Url::parse("https://Books.ToScrape.com/index.html").unwrap();
/// assert_eq!(extract_domain(&url), Some("books.toscrape.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a host matches an allowlist pattern
///
/// "example.com" matches only itself. "*.example.com" matches the bare
/// domain and any subdomain depth below it.
pub fn matches_wildcard(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            host == base
                || host
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => host == pattern,
    }
}

/// Returns true if the URL's host is covered by one of the allowlist patterns
///
/// URLs without a host are never allowed.
pub fn is_allowed(url: &Url, allowed_domains: &[String]) -> bool {
    match extract_domain(url) {
        Some(host) => allowed_domains
            .iter()
            .any(|pattern| matches_wildcard(pattern, &host)),
        None => false,
    }
}
