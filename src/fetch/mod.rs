//! Page fetching for both pipelines
//!
//! This module contains the two fetch engines and the pacing policy:
//! - Plain HTTP GET via reqwest, for catalogs that serve complete HTML
//! - A rendering engine driving a Chrome DevTools session, for catalogs that
//!   assemble the page client-side
//! - A fixed delay-plus-jitter pause taken before every fetch
//!
//! Every fetch failure is a skip signal for the calling loop; only engine
//! initialization failure is fatal.

mod http;
mod render;

pub use http::{build_image_client, HttpFetcher};
pub use render::RenderFetcher;

use crate::config::{FetchEngineKind, FetcherConfig};
use crate::ScrapeError;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;

/// A failed fetch attempt
///
/// All variants are recoverable from the loop's point of view: log, skip the
/// item, continue. A dead render session is additionally self-healed by the
/// render fetcher before this error is ever returned.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Timed out waiting for '{selector}' on {url}")]
    MarkerTimeout { url: String, selector: String },

    #[error("Render session error: {0}")]
    Session(String),
}

/// Page fetcher dispatching to the configured engine
///
/// Owned by a pipeline instance for its entire run; the driver must call
/// [`PageFetcher::shutdown`] when done rather than relying on Drop.
pub enum PageFetcher {
    Http(HttpFetcher),
    Render(RenderFetcher),
}

impl PageFetcher {
    /// Creates the engine selected in the configuration
    ///
    /// # Errors
    ///
    /// Returns `ScrapeError::FetchEngine` when the engine cannot start; no
    /// work is possible without it, so this propagates to the caller.
    pub async fn new(config: &FetcherConfig) -> Result<Self, ScrapeError> {
        match config.engine {
            FetchEngineKind::Http => Ok(Self::Http(HttpFetcher::new(config)?)),
            FetchEngineKind::Render => Ok(Self::Render(RenderFetcher::launch(config).await?)),
        }
    }

    /// Fetches a page and returns its HTML
    ///
    /// `marker` is the CSS selector whose appearance signals that dynamic
    /// content has finished loading; the HTTP engine ignores it.
    pub async fn fetch(&mut self, url: &str, marker: &str) -> Result<String, FetchError> {
        match self {
            Self::Http(fetcher) => fetcher.fetch(url).await,
            Self::Render(fetcher) => fetcher.fetch(url, marker).await,
        }
    }

    /// Releases the underlying session, if any
    pub async fn shutdown(&mut self) {
        if let Self::Render(fetcher) = self {
            fetcher.shutdown().await;
        }
    }
}

/// Sleeps for the configured base delay plus a bounded random jitter
///
/// The jitter avoids a fixed-interval request fingerprint; the policy is a
/// knob, not adaptive.
pub async fn pace(config: &FetcherConfig) {
    let jitter = if config.jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=config.jitter_ms)
    };
    let total = config.request_delay_ms + jitter;
    if total > 0 {
        tokio::time::sleep(Duration::from_millis(total)).await;
    }
}
