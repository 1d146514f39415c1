//! Markdown catalog summary generation
//!
//! Produces a human-readable report over a crawled book collection:
//! overall figures, the rating distribution and the category breakdown.

use crate::output::summary::CatalogSummary;
use crate::output::traits::OutputResult;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of the catalog
///
/// # Arguments
///
/// * `summary` - The catalog summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CatalogSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a catalog summary as markdown
pub fn format_markdown_summary(summary: &CatalogSummary) -> String {
    let mut md = String::new();

    md.push_str("# Book Catalog Summary\n\n");
    md.push_str(&format!(
        "_Generated {}_\n\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
    ));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Books**: {}\n", summary.total_books));
    md.push_str(&format!("- **Categories**: {}\n", summary.categories.len()));
    if let (Some(min), Some(max), Some(mean)) =
        (summary.min_price, summary.max_price, summary.mean_price)
    {
        md.push_str(&format!(
            "- **Price Range**: £{:.2} – £{:.2} (mean £{:.2})\n",
            min, max, mean
        ));
    }
    if summary.unparseable_prices > 0 {
        md.push_str(&format!(
            "- **Unparseable Prices**: {}\n",
            summary.unparseable_prices
        ));
    }
    match summary.mean_rating {
        Some(mean) => md.push_str(&format!("- **Mean Rating**: {:.2} / 5\n", mean)),
        None => md.push_str("- **Mean Rating**: n/a\n"),
    }
    md.push_str(&format!(
        "- **Without Description**: {}\n\n",
        summary.missing_descriptions
    ));

    md.push_str("## Rating Distribution\n\n");
    md.push_str("| Rating | Books |\n");
    md.push_str("|--------|-------|\n");
    for (score, count) in summary.rating_histogram.iter().enumerate().rev() {
        let label = if score == 0 {
            "Unrated".to_string()
        } else {
            "★".repeat(score)
        };
        md.push_str(&format!("| {} | {} |\n", label, count));
    }
    md.push('\n');

    if !summary.categories.is_empty() {
        md.push_str("## Categories\n\n");
        md.push_str("| Category | Books |\n");
        md.push_str("|----------|-------|\n");
        for (name, count) in summary.top_categories(usize::MAX) {
            md.push_str(&format!("| {} | {} |\n", name, count));
        }
        md.push('\n');
    }

    md
}
