//! State module for tracking crawl progress
//!
//! Two small state machines describe where a page is in the traversal:
//!
//! - `ListingState`: the sequential chain of catalog listing pages
//!   (`Fetching → Parsing → Advancing | Done | Truncated`)
//! - `DetailState`: one book detail page
//!   (`Queued → Fetching → Parsing → Emitted | Skipped`)

mod detail_state;
mod listing_state;

pub use detail_state::DetailState;
pub use listing_state::ListingState;
