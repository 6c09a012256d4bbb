//! HTML extraction for listing and product pages
//!
//! All selectors come from the configuration; this module only knows the
//! shape of the extraction (a container of product links, a price pair, an
//! attribute table, a gallery of images), not any concrete site. Selector
//! strings are validated at config load, so a parse failure here is reported
//! as an extraction error rather than a panic.

mod listing;
mod product;

pub use listing::extract_product_links;
pub use product::{extract_image_urls, parse_product_fields, ParsedProduct};

use scraper::Selector;

/// Parses a CSS selector string, mapping the error to a plain message
fn parse_selector(selector: &str) -> Result<Selector, String> {
    Selector::parse(selector).map_err(|e| format!("bad selector '{}': {}", selector, e))
}

/// Collects an element's text content, whitespace-trimmed
fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
