use crate::config::types::{CollectorConfig, Config, DetailsConfig, FetcherConfig, SelectorsConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_collector_config(&config.collector)?;
    validate_details_config(&config.details)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_selectors_config(&config.selectors)?;
    Ok(())
}

/// Validates link collector configuration
fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must be http(s), got '{}'",
            base.scheme()
        )));
    }

    if config.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "start-page must be >= 1, got {}",
            config.start_page
        )));
    }

    if let Some(end_page) = config.end_page {
        if end_page < config.start_page {
            return Err(ConfigError::Validation(format!(
                "end-page ({}) must not be below start-page ({})",
                end_page, config.start_page
            )));
        }
    }

    if config.max_links < 1 {
        return Err(ConfigError::Validation(format!(
            "max-links must be >= 1, got {}",
            config.max_links
        )));
    }

    if config.min_links > config.max_links {
        return Err(ConfigError::Validation(format!(
            "min-links ({}) must not exceed max-links ({})",
            config.min_links, config.max_links
        )));
    }

    if config.output_file.is_empty() {
        return Err(ConfigError::Validation(
            "output-file cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_file.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint-file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates detail fetcher configuration
fn validate_details_config(config: &DetailsConfig) -> Result<(), ConfigError> {
    if config.input_file.is_empty() {
        return Err(ConfigError::Validation(
            "input-file cannot be empty".to_string(),
        ));
    }

    if config.result_dir.is_empty() {
        return Err(ConfigError::Validation(
            "result-dir cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_file.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint-file cannot be empty".to_string(),
        ));
    }

    if let Some(max_products) = config.max_products {
        if max_products < 1 {
            return Err(ConfigError::Validation(format!(
                "max-products must be >= 1 when set, got {}",
                max_products
            )));
        }
    }

    Ok(())
}

/// Validates fetch engine configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates that every configured selector parses as CSS
///
/// Catching a typo here beats discovering it mid-run on page 40.
fn validate_selectors_config(config: &SelectorsConfig) -> Result<(), ConfigError> {
    let selectors = [
        ("listing-container", &config.listing_container),
        ("product-link", &config.product_link),
        ("detail-container", &config.detail_container),
        ("price", &config.price),
        ("description", &config.description),
        ("attribute-row", &config.attribute_row),
        ("attribute-name", &config.attribute_name),
        ("attribute-value", &config.attribute_value),
        ("gallery-image", &config.gallery_image),
    ];

    for (name, selector) in selectors {
        if Selector::parse(selector).is_err() {
            return Err(ConfigError::InvalidSelector(format!(
                "{} = '{}'",
                name, selector
            )));
        }
    }

    Ok(())
}
