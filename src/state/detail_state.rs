//! Detail page state definitions

use std::fmt;

/// Lifecycle of a single book detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailState {
    /// Discovered on a listing page and waiting in the frontier
    Queued,

    /// Request in flight (including retries)
    Fetching,

    /// Markup received, record being extracted
    Parsing,

    /// Record extracted and handed to the sink
    Emitted,

    /// Fetch failed, record malformed, or record was a duplicate
    Skipped,
}

impl DetailState {
    /// Returns true if no further processing happens in this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Emitted | Self::Skipped)
    }

    /// Returns true if moving from `self` to `next` is a legal step
    ///
    /// Skipping is allowed from every active state: a page can be dropped
    /// before its fetch (cancellation), after it (fetch failure) or after
    /// parsing (defect or duplicate).
    pub fn can_transition_to(&self, next: DetailState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Fetching)
                | (Self::Fetching, Self::Parsing)
                | (Self::Parsing, Self::Emitted)
                | (Self::Queued | Self::Fetching | Self::Parsing, Self::Skipped)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Emitted => "emitted",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for DetailState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
