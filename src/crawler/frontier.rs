//! Detail page frontier
//!
//! Holds detail URLs that have been discovered but not yet handed to a
//! worker, plus the set of every URL ever accepted. A URL enters the queue
//! at most once for the lifetime of the crawl.

use crate::url::normalize_url;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// FIFO queue of pending detail URLs with insert-if-absent semantics
#[derive(Debug, Default)]
pub struct Frontier {
    /// URLs waiting to be fetched, in discovery order
    pending: VecDeque<Url>,

    /// Normalized form of every URL ever pushed
    seen: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a URL unless an equivalent one was queued before
    ///
    /// # Returns
    ///
    /// * `true` - The URL is new and was queued
    /// * `false` - The URL (after normalization) was already seen
    pub fn push(&mut self, url: Url) -> bool {
        let key = normalize_url(&url);
        if !self.seen.insert(key.to_string()) {
            return false;
        }
        self.pending.push_back(key);
        true
    }

    /// Takes the oldest pending URL
    pub fn pop(&mut self) -> Option<Url> {
        self.pending.pop_front()
    }

    /// Number of URLs waiting to be fetched
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of distinct URLs accepted so far
    pub fn seen(&self) -> usize {
        self.seen.len()
    }

    /// Drops all pending URLs; the seen set is kept
    pub fn clear_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new();
        frontier.push(url("https://example.com/b"));
        frontier.push(url("https://example.com/a"));

        assert_eq!(frontier.pop().unwrap().as_str(), "https://example.com/b");
        assert_eq!(frontier.pop().unwrap().as_str(), "https://example.com/a");
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut frontier = Frontier::new();
        assert!(frontier.push(url("https://example.com/a_1/index.html")));
        assert!(!frontier.push(url("https://example.com/a_1/index.html")));
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.seen(), 1);
    }

    #[test]
    fn test_equivalent_urls_deduplicated() {
        let mut frontier = Frontier::new();
        assert!(frontier.push(url("https://example.com/catalogue/a_1/index.html")));
        assert!(!frontier.push(url("https://example.com/catalogue/a_1/index.html#reviews")));
        assert!(!frontier.push(url("https://example.com/catalogue/x/../a_1/index.html")));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_visited_url_not_requeued_after_pop() {
        let mut frontier = Frontier::new();
        frontier.push(url("https://example.com/a"));
        frontier.pop();

        assert!(!frontier.push(url("https://example.com/a")));
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_clear_pending_keeps_seen() {
        let mut frontier = Frontier::new();
        frontier.push(url("https://example.com/a"));
        frontier.push(url("https://example.com/b"));

        assert_eq!(frontier.clear_pending(), 2);
        assert!(frontier.is_empty());
        assert_eq!(frontier.seen(), 2);
    }
}
