use std::fmt;

/// Lifecycle of the listing-page chain
///
/// The chain is strictly sequential: the next listing URL is only known
/// once the current page has been parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingState {
    Fetching,
    Parsing,
    /// A next-page link was found; the chain continues with a new fetch
    Advancing,
    /// No next-page link: the end of the catalog
    Done,
    /// A listing fetch failed after all retries; later pages are unreachable
    Truncated,
}

impl ListingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Truncated)
    }

    pub fn can_transition_to(&self, next: ListingState) -> bool {
        matches!(
            (self, next),
            (Self::Fetching, Self::Parsing)
                | (Self::Fetching, Self::Truncated)
                | (Self::Parsing, Self::Advancing)
                | (Self::Parsing, Self::Done)
                // empty page retried before advancing
                | (Self::Parsing, Self::Fetching)
                | (Self::Advancing, Self::Fetching)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Advancing => "advancing",
            Self::Done => "done",
            Self::Truncated => "truncated",
        }
    }
}

impl fmt::Display for ListingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
