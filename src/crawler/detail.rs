//! Detail page parser
//!
//! Extracts one book record from a book's detail page. Title, price and UPC
//! are required: if one is missing the whole record fails with an
//! [`ExtractError`]. Optional fields (description, category) come back as
//! `None` and the aggregation step decides how to present them. A page
//! without a usable cover image keeps its record; `image_url` then points at
//! the detail page itself.

use crate::output::{Book, Rating, UNKNOWN_CATEGORY};
use crate::url::resolve_link;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

/// Per-record extraction failure
///
/// The coordinator logs it, counts the record as skipped and keeps crawling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("required field '{0}' is missing or empty")]
    MissingField(&'static str),
}

/// Fields extracted from a detail page, before aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBook {
    pub title: String,
    pub price: String,
    pub rating: Rating,
    pub availability: String,
    pub description: Option<String>,
    pub upc: String,
    /// Third breadcrumb entry, if the breadcrumb has one
    pub category: Option<String>,
    pub image_url: String,
}

impl ParsedBook {
    /// Converts to the output record, substituting the "Unknown" category
    pub fn into_record(self) -> Book {
        Book {
            title: self.title,
            price: self.price,
            rating: self.rating,
            availability: self.availability,
            description: self.description,
            upc: self.upc,
            category: self
                .category
                .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
            image_url: self.image_url,
        }
    }
}

struct DetailSelectors {
    title: Selector,
    price: Selector,
    rating: Selector,
    availability: Selector,
    description: Selector,
    info_row: Selector,
    header_cell: Selector,
    data_cell: Selector,
    category: Selector,
    image: Selector,
}

fn selectors() -> &'static DetailSelectors {
    static SELECTORS: OnceLock<DetailSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |css: &str| Selector::parse(css).expect("valid detail page selector");
        DetailSelectors {
            title: parse("h1"),
            price: parse("p.price_color"),
            rating: parse("p.star-rating"),
            availability: parse("p.availability"),
            description: parse("#product_description ~ p"),
            info_row: parse("table.table-striped tr"),
            header_cell: parse("th"),
            data_cell: parse("td"),
            category: parse("ul.breadcrumb li:nth-child(3) a"),
            image: parse("div.item img[src]"),
        }
    })
}

/// Parses a book detail page
///
/// # Arguments
///
/// * `html` - The detail page markup
/// * `page_url` - The detail page's own URL, the base for the cover image link
///
/// # Returns
///
/// * `Ok(ParsedBook)` - All required fields present
/// * `Err(ExtractError)` - Title, price or UPC missing
pub fn parse_detail(html: &str, page_url: &Url) -> Result<ParsedBook, ExtractError> {
    let document = Html::parse_document(html);
    let sel = selectors();

    let title = first_text(&document, &sel.title).ok_or(ExtractError::MissingField("title"))?;
    let price = first_text(&document, &sel.price).ok_or(ExtractError::MissingField("price"))?;
    let upc = product_info(&document, "UPC").ok_or(ExtractError::MissingField("upc"))?;

    let rating = document
        .select(&sel.rating)
        .next()
        .and_then(|p| p.value().attr("class"))
        .and_then(rating_from_class)
        .into();

    let availability = document
        .select(&sel.availability)
        .next()
        .map(|p| normalize_availability(p.text()))
        .unwrap_or_default();

    let description = document
        .select(&sel.description)
        .next()
        .and_then(|p| element_text(&p))
        .filter(|text| !text.is_empty());

    let category = first_text(&document, &sel.category);

    let image_url = document
        .select(&sel.image)
        .next()
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| resolve_link(src, page_url))
        .unwrap_or_else(|| page_url.clone())
        .to_string();

    Ok(ParsedBook {
        title,
        price,
        rating,
        availability,
        description,
        upc,
        category,
        image_url,
    })
}

/// Maps a star-rating class attribute to a score
///
/// The last word of the class list names the score ("star-rating Three" is
/// 3). Anything other than One..Five yields None.
pub fn rating_from_class(class_attr: &str) -> Option<u8> {
    match class_attr.split_whitespace().last()? {
        "One" => Some(1),
        "Two" => Some(2),
        "Three" => Some(3),
        "Four" => Some(4),
        "Five" => Some(5),
        _ => None,
    }
}

/// Joins whitespace-fragmented text into a single line
///
/// Every fragment is trimmed, empty ones are dropped, and the rest are
/// joined with single spaces. Whitespace runs inside a fragment are
/// collapsed as well, so the result never contains double spaces.
pub fn normalize_availability<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    fragments
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Value cell of the product information row whose header is `label`
fn product_info(document: &Html, label: &str) -> Option<String> {
    let sel = selectors();
    document
        .select(&sel.info_row)
        .find(|row| {
            row.select(&sel.header_cell)
                .next()
                .and_then(|th| element_text(&th))
                .is_some_and(|text| text == label)
        })
        .and_then(|row| row.select(&sel.data_cell).next())
        .and_then(|td| element_text(&td))
        .filter(|text| !text.is_empty())
}

/// Trimmed text of the first match, None if there is no match or it is blank
fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| element_text(&el))
        .filter(|text| !text.is_empty())
}

/// Trimmed text content of an element; None if it has no text nodes at all
fn element_text(element: &ElementRef<'_>) -> Option<String> {
    let mut fragments = element.text().peekable();
    fragments.peek()?;
    Some(fragments.collect::<String>().trim().to_string())
}
