//! Field and image extraction from product pages

use crate::config::SelectorsConfig;
use crate::extract::{element_text, parse_selector};
use scraper::Html;
use std::collections::HashMap;
use url::Url;

/// Structured fields parsed from a product page
#[derive(Debug, Clone, Default)]
pub struct ParsedProduct {
    pub price: Option<String>,
    pub old_price: Option<String>,
    pub description: Option<String>,
    pub attributes: HashMap<String, String>,
}

/// Parses price, description, and attributes from product page HTML
///
/// Price pair rule: when two (or more) price elements are present the first
/// is the crossed-out old price and the second the current one; a single
/// element is the current price with no old price.
pub fn parse_product_fields(
    html: &str,
    selectors: &SelectorsConfig,
) -> Result<ParsedProduct, String> {
    let document = Html::parse_document(html);

    let price_selector = parse_selector(&selectors.price)?;
    let container_selector = parse_selector(&selectors.detail_container)?;
    let description_selector = parse_selector(&selectors.description)?;
    let row_selector = parse_selector(&selectors.attribute_row)?;
    let name_selector = parse_selector(&selectors.attribute_name)?;
    let value_selector = parse_selector(&selectors.attribute_value)?;

    let mut product = ParsedProduct::default();

    let prices: Vec<String> = document
        .select(&price_selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();

    if prices.len() >= 2 {
        product.old_price = Some(prices[0].clone());
        product.price = Some(prices[1].clone());
    } else if let Some(price) = prices.first() {
        product.price = Some(price.clone());
    }

    // Description and attributes are scoped to the detail container; a page
    // without it still yields whatever prices were found.
    if let Some(container) = document.select(&container_selector).next() {
        product.description = container
            .select(&description_selector)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty());

        for row in container.select(&row_selector) {
            let name = row.select(&name_selector).next().map(element_text);
            let value = row.select(&value_selector).next().map(element_text);
            if let (Some(name), Some(value)) = (name, value) {
                if !name.is_empty() {
                    product.attributes.insert(name, value);
                }
            }
        }
    }

    Ok(product)
}

/// Extracts candidate image URLs from the product gallery, in document order
///
/// Relative sources are resolved against the product page URL; unresolvable
/// ones are dropped. Duplicates are removed preserving first occurrence.
pub fn extract_image_urls(
    html: &str,
    selectors: &SelectorsConfig,
    page_url: &Url,
) -> Result<Vec<String>, String> {
    let document = Html::parse_document(html);
    let image_selector = parse_selector(&selectors.gallery_image)?;

    let mut urls = Vec::new();

    for img in document.select(&image_selector) {
        let src = match img.value().attr("src") {
            Some(s) => s.trim(),
            None => continue,
        };
        if src.is_empty() {
            continue;
        }
        if let Ok(resolved) = page_url.join(src) {
            let resolved = resolved.to_string();
            if !urls.contains(&resolved) {
                urls.push(resolved);
            }
        }
    }

    Ok(urls)
}
