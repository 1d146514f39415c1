//! Catalog-level summary of a crawled book collection

use crate::output::book::Book;
use std::collections::BTreeMap;

/// Aggregate view of a book collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSummary {
    pub total_books: usize,

    /// Books per category, sorted by category name
    pub categories: BTreeMap<String, usize>,

    /// Books per rating score; index 0 counts unrated books
    pub rating_histogram: [usize; 6],

    /// Mean star rating over rated books only
    pub mean_rating: Option<f64>,

    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub mean_price: Option<f64>,

    /// Books whose price text had no numeric value
    pub unparseable_prices: usize,

    pub missing_descriptions: usize,
}

impl CatalogSummary {
    pub fn from_books(books: &[Book]) -> Self {
        let mut summary = CatalogSummary {
            total_books: books.len(),
            ..Self::default()
        };

        let mut rated_sum = 0u64;
        let mut rated_count = 0u64;
        let mut price_sum = 0.0;
        let mut price_count = 0usize;

        for book in books {
            *summary.categories.entry(book.category.clone()).or_insert(0) += 1;

            let score = book.rating.as_score();
            summary.rating_histogram[score as usize] += 1;
            if let Some(stars) = book.rating.stars() {
                rated_sum += u64::from(stars);
                rated_count += 1;
            }

            match book.price_value() {
                Some(price) => {
                    summary.min_price = Some(summary.min_price.map_or(price, |m| m.min(price)));
                    summary.max_price = Some(summary.max_price.map_or(price, |m| m.max(price)));
                    price_sum += price;
                    price_count += 1;
                }
                None => summary.unparseable_prices += 1,
            }

            if book.description.is_none() {
                summary.missing_descriptions += 1;
            }
        }

        if rated_count > 0 {
            summary.mean_rating = Some(rated_sum as f64 / rated_count as f64);
        }
        if price_count > 0 {
            summary.mean_price = Some(price_sum / price_count as f64);
        }

        summary
    }

    /// Categories ordered by book count, largest first, ties by name
    pub fn top_categories(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .categories
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(limit);
        ranked
    }
}

/// Prints a catalog summary to stdout
pub fn print_catalog_summary(summary: &CatalogSummary) {
    println!("=== Catalog Summary ===\n");
    println!("  Books: {}", summary.total_books);
    println!("  Categories: {}", summary.categories.len());
    if let (Some(min), Some(max), Some(mean)) =
        (summary.min_price, summary.max_price, summary.mean_price)
    {
        println!("  Price: £{:.2} – £{:.2} (mean £{:.2})", min, max, mean);
    }
    match summary.mean_rating {
        Some(mean) => println!("  Mean rating: {:.2}", mean),
        None => println!("  Mean rating: n/a"),
    }
    println!("  Without description: {}", summary.missing_descriptions);
    println!();

    println!("Ratings:");
    for (score, count) in summary.rating_histogram.iter().enumerate() {
        let label = if score == 0 {
            "unrated".to_string()
        } else {
            format!("{} star", score)
        };
        println!("  {:>8}: {}", label, count);
    }
    println!();

    println!("Top categories:");
    for (name, count) in summary.top_categories(10) {
        println!("  {}: {}", name, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::book::Rating;

    fn book(upc: &str, category: &str, price: &str, rating: u8, description: bool) -> Book {
        Book {
            title: format!("Book {}", upc),
            price: price.to_string(),
            rating: Rating::new(rating),
            availability: "In stock".to_string(),
            description: description.then(|| "Some text".to_string()),
            upc: upc.to_string(),
            category: category.to_string(),
            image_url: "https://example.com/cover.jpg".to_string(),
        }
    }

    #[test]
    fn test_empty_collection() {
        let summary = CatalogSummary::from_books(&[]);
        assert_eq!(summary.total_books, 0);
        assert_eq!(summary.mean_price, None);
        assert_eq!(summary.mean_rating, None);
    }

    #[test]
    fn test_aggregates() {
        let books = vec![
            book("1", "Poetry", "£10.00", 3, true),
            book("2", "Poetry", "£30.00", 5, false),
            book("3", "Travel", "£20.00", 0, true),
            book("4", "Unknown", "free", 1, true),
        ];
        let summary = CatalogSummary::from_books(&books);

        assert_eq!(summary.total_books, 4);
        assert_eq!(summary.categories["Poetry"], 2);
        assert_eq!(summary.categories["Unknown"], 1);
        assert_eq!(summary.rating_histogram, [1, 1, 0, 1, 0, 1]);
        assert_eq!(summary.mean_rating, Some(3.0));
        assert_eq!(summary.min_price, Some(10.0));
        assert_eq!(summary.max_price, Some(30.0));
        assert_eq!(summary.mean_price, Some(20.0));
        assert_eq!(summary.unparseable_prices, 1);
        assert_eq!(summary.missing_descriptions, 1);
    }

    #[test]
    fn test_top_categories_ordering() {
        let books = vec![
            book("1", "Travel", "£1", 1, true),
            book("2", "Poetry", "£1", 1, true),
            book("3", "Poetry", "£1", 1, true),
            book("4", "Art", "£1", 1, true),
        ];
        let summary = CatalogSummary::from_books(&books);
        assert_eq!(
            summary.top_categories(2),
            vec![("Poetry", 2), ("Art", 1)]
        );
    }
}
