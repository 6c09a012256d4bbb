//! Product link extraction from listing pages

use crate::config::SelectorsConfig;
use crate::extract::parse_selector;
use scraper::Html;
use std::collections::HashSet;
use url::Url;

/// Extracts product URLs from a listing page, in document order
///
/// Links are taken from anchors matching `product-link` inside the
/// `listing-container` element, filtered to hrefs under `link-prefix`, and
/// resolved against `base_url`. Duplicates within the page are dropped.
///
/// A missing listing container yields an empty list; the collector treats
/// that the same as an out-of-catalog page.
pub fn extract_product_links(
    html: &str,
    selectors: &SelectorsConfig,
    base_url: &Url,
) -> Result<Vec<String>, String> {
    let document = Html::parse_document(html);
    let container_selector = parse_selector(&selectors.listing_container)?;
    let link_selector = parse_selector(&selectors.product_link)?;

    let container = match document.select(&container_selector).next() {
        Some(c) => c,
        None => return Ok(Vec::new()),
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in container.select(&link_selector) {
        let href = match anchor.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };

        if let Some(url) = resolve_product_href(href, &selectors.link_prefix, base_url) {
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
    }

    Ok(links)
}

/// Resolves an href to an absolute product URL, or None if it is not one
///
/// Accepts relative hrefs starting with the configured prefix and absolute
/// URLs whose path starts with it.
fn resolve_product_href(href: &str, prefix: &str, base_url: &Url) -> Option<String> {
    if href.is_empty() {
        return None;
    }

    let resolved = base_url.join(href).ok()?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    if !resolved.path().starts_with(prefix) {
        return None;
    }

    Some(resolved.to_string())
}
