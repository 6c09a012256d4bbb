use serde::Deserialize;

/// Main configuration structure for shelfcrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub collector: CollectorConfig,
    pub details: DetailsConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub selectors: SelectorsConfig,
}

/// Link collector configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Seed listing URL; page 1 is fetched from this URL verbatim,
    /// later pages append a `?page=N` query parameter
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Page number to start from when no checkpoint exists
    #[serde(rename = "start-page", default = "default_start_page")]
    pub start_page: u32,

    /// Last page to visit, only honored once `min-links` is reached
    #[serde(rename = "end-page", default)]
    pub end_page: Option<u32>,

    /// Minimum number of links before the end-page limit applies
    #[serde(rename = "min-links", default = "default_min_links")]
    pub min_links: usize,

    /// Stop once at least this many links are collected. Checked after a
    /// whole page is appended, so the output may overshoot by one page.
    #[serde(rename = "max-links", default = "default_max_links")]
    pub max_links: usize,

    /// Path of the final JSON array of product URLs
    #[serde(rename = "output-file", default = "default_links_output")]
    pub output_file: String,

    /// Path of the collector checkpoint file
    #[serde(rename = "checkpoint-file", default = "default_links_checkpoint")]
    pub checkpoint_file: String,
}

/// Detail fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetailsConfig {
    /// JSON array of product URLs to process
    #[serde(rename = "input-file", default = "default_links_output")]
    pub input_file: String,

    /// Directory receiving one subdirectory per product index
    #[serde(rename = "result-dir", default = "default_result_dir")]
    pub result_dir: String,

    /// Path of the detail fetcher checkpoint file
    #[serde(rename = "checkpoint-file", default = "default_details_checkpoint")]
    pub checkpoint_file: String,

    /// Index to start from when no checkpoint exists
    #[serde(rename = "start-from", default)]
    pub start_from: usize,

    /// Truncate the input list to this many products
    #[serde(rename = "max-products", default)]
    pub max_products: Option<usize>,
}

/// Which engine fetches pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchEngineKind {
    /// Chrome DevTools session that renders dynamic content
    Render,
    /// Plain HTTP GET, for catalogs that serve complete HTML
    Http,
}

/// Fetch engine and pacing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Engine selection: "render" or "http"
    #[serde(default = "default_engine")]
    pub engine: FetchEngineKind,

    /// Run the rendering engine without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Per-fetch timeout, also bounds the render marker wait
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Base delay before every fetch
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Upper bound of the uniform random jitter added to the base delay
    #[serde(rename = "jitter-ms", default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            headless: default_headless(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

/// CSS selectors driving HTML extraction
///
/// These are the only site-specific knobs; everything else in the crawl loop
/// is catalog-agnostic. The defaults target the catalog the original run was
/// tuned for and are expected to be overridden per site.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorsConfig {
    /// Container holding product cards on a listing page. Also used as the
    /// render-wait marker for listing pages. Absent container means
    /// "no links on this page".
    #[serde(rename = "listing-container", default = "default_listing_container")]
    pub listing_container: String,

    /// Anchor elements inside the listing container whose href is a product
    #[serde(rename = "product-link", default = "default_product_link")]
    pub product_link: String,

    /// Only hrefs starting with this path prefix are treated as products
    #[serde(rename = "link-prefix", default = "default_link_prefix")]
    pub link_prefix: String,

    /// Container for description/attributes on a product page. Also used as
    /// the render-wait marker for product pages.
    #[serde(rename = "detail-container", default = "default_detail_container")]
    pub detail_container: String,

    /// Price elements; two matches mean old price then current price
    #[serde(default = "default_price")]
    pub price: String,

    /// Product description element inside the detail container
    #[serde(default = "default_description")]
    pub description: String,

    /// One element per attribute row inside the detail container
    #[serde(rename = "attribute-row", default = "default_attribute_row")]
    pub attribute_row: String,

    /// Attribute name element inside a row
    #[serde(rename = "attribute-name", default = "default_attribute_name")]
    pub attribute_name: String,

    /// Attribute value element inside a row
    #[serde(rename = "attribute-value", default = "default_attribute_value")]
    pub attribute_value: String,

    /// Gallery images whose src is an image candidate, in document order
    #[serde(rename = "gallery-image", default = "default_gallery_image")]
    pub gallery_image: String,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            listing_container: default_listing_container(),
            product_link: default_product_link(),
            link_prefix: default_link_prefix(),
            detail_container: default_detail_container(),
            price: default_price(),
            description: default_description(),
            attribute_row: default_attribute_row(),
            attribute_name: default_attribute_name(),
            attribute_value: default_attribute_value(),
            gallery_image: default_gallery_image(),
        }
    }
}

fn default_start_page() -> u32 {
    1
}

fn default_min_links() -> usize {
    50
}

fn default_max_links() -> usize {
    1000
}

fn default_links_output() -> String {
    "product_links.json".to_string()
}

fn default_links_checkpoint() -> String {
    "checkpoint_links.json".to_string()
}

fn default_result_dir() -> String {
    "products_result".to_string()
}

fn default_details_checkpoint() -> String {
    "checkpoints/checkpoint.json".to_string()
}

fn default_engine() -> FetchEngineKind {
    FetchEngineKind::Render
}

fn default_headless() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_request_delay_ms() -> u64 {
    2000
}

fn default_jitter_ms() -> u64 {
    2000
}

fn default_listing_container() -> String {
    "div.grid__catalog".to_string()
}

fn default_product_link() -> String {
    "a.x-product-card__pic".to_string()
}

fn default_link_prefix() -> String {
    "/p/".to_string()
}

fn default_detail_container() -> String {
    "div#reviews-and-questions".to_string()
}

fn default_price() -> String {
    r#"span[class*="_price_"]"#.to_string()
}

fn default_description() -> String {
    r#"div[class*="_description_"]"#.to_string()
}

fn default_attribute_row() -> String {
    r#"p[class*="_item_"]"#.to_string()
}

fn default_attribute_name() -> String {
    r#"span[class*="_attributeName_"]"#.to_string()
}

fn default_attribute_value() -> String {
    r#"span[class*="_value_"]"#.to_string()
}

fn default_gallery_image() -> String {
    r#"div[class*="ui-product-page-gallery"] img"#.to_string()
}
