//! Shelfcrawl: a resumable e-commerce catalog scraper
//!
//! This crate implements a two-phase catalog scraper: a link collector that
//! paginates listing pages and accumulates unique product URLs, and a detail
//! fetcher that visits each product URL, extracts structured fields, and
//! downloads one image per product. Both loops checkpoint after every unit of
//! work so an interrupted run resumes where it left off.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod persist;
pub mod pipeline;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for shelfcrawl operations
///
/// Per-item failures (fetch/parse) never surface here; they are handled at
/// the loop boundary as skips. This enum covers the failures that terminate
/// a run: bad configuration, a fetch engine that cannot start, and disk
/// writes that must not be silently lost.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch engine initialization failed: {0}")]
    FetchEngine(String),

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for shelfcrawl operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use fetch::{FetchError, PageFetcher};
pub use persist::{CrawlCheckpoint, FetchCheckpoint, ProductRecord};
pub use pipeline::{DetailFetcher, LinkCollector, SkipReason};
