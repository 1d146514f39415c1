//! The book record written to the output collection

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Category written when a detail page has no third breadcrumb entry
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Star rating of a book, 1 to 5, or absent when the page carries no
/// recognizable rating
///
/// Absence is kept distinct from a score internally. On the wire the rating
/// is a plain integer 0–5 where 0 means "no rating found".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rating(Option<u8>);

impl Rating {
    pub const UNRATED: Rating = Rating(None);

    /// Builds a rating from a star count; anything outside 1..=5 is unrated
    pub fn new(stars: u8) -> Self {
        if (1..=5).contains(&stars) {
            Rating(Some(stars))
        } else {
            Rating(None)
        }
    }

    pub fn stars(&self) -> Option<u8> {
        self.0
    }

    /// The value as exposed to JSON consumers
    pub fn as_score(&self) -> u8 {
        self.0.unwrap_or(0)
    }
}

impl From<Option<u8>> for Rating {
    fn from(value: Option<u8>) -> Self {
        value.map(Rating::new).unwrap_or_default()
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(stars) => write!(f, "{}/5", stars),
            None => f.write_str("unrated"),
        }
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_score())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<u8>::deserialize(deserializer)? {
            None | Some(0) => Ok(Rating::UNRATED),
            Some(stars @ 1..=5) => Ok(Rating(Some(stars))),
            Some(other) => Err(serde::de::Error::custom(format!(
                "rating must be between 0 and 5, got {}",
                other
            ))),
        }
    }
}

/// One book, extracted from its detail page
///
/// Field names are the collection's interchange format and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,

    /// Raw price text including the currency symbol, e.g. "£51.77"
    pub price: String,

    pub rating: Rating,

    /// Stock status, whitespace-normalized
    pub availability: String,

    /// `None` when the page has no description; serialized as `null`
    pub description: Option<String>,

    /// Universal Product Code, unique per book
    pub upc: String,

    pub category: String,

    /// Absolute URL of the cover image
    pub image_url: String,
}

impl Book {
    /// Numeric price with currency symbols and thousands separators removed
    ///
    /// Returns None if nothing numeric remains.
    pub fn price_value(&self) -> Option<f64> {
        let digits: String = self
            .price
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        digits.parse().ok()
    }

    /// Description cut to at most `max_chars` characters, "…" appended when cut
    ///
    /// A missing description yields an empty string rather than an error.
    pub fn description_excerpt(&self, max_chars: usize) -> String {
        let Some(description) = self.description.as_deref() else {
            return String::new();
        };
        if description.chars().count() <= max_chars {
            return description.to_string();
        }
        let mut excerpt: String = description.chars().take(max_chars).collect();
        excerpt.push('…');
        excerpt
    }
}
