//! Configuration module for shelfcrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use shelfcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Collecting from: {}", config.collector.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CollectorConfig, Config, DetailsConfig, FetchEngineKind, FetcherConfig, SelectorsConfig,
};

// Re-export parser functions
pub use parser::load_config;
