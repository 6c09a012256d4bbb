//! Plain HTTP fetch engine
//!
//! A thin reqwest wrapper that issues GET requests with a browser-like user
//! agent. Used both as a full fetch engine (for catalogs that serve complete
//! HTML) and, via [`build_image_client`], for image downloads regardless of
//! which page engine is active.

use crate::config::FetcherConfig;
use crate::fetch::FetchError;
use crate::ScrapeError;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches pages over plain HTTP GET
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds the fetcher with the configured timeout
    pub fn new(config: &FetcherConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| ScrapeError::FetchEngine(e.to_string()))?;

        Ok(Self { client })
    }

    /// Fetches a URL and returns the response body
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

/// Builds the client used for image downloads
///
/// Images are always fetched over plain HTTP, even when pages go through the
/// rendering engine. Short timeout; a slow image host must not stall the run.
pub fn build_image_client() -> Result<Client, ScrapeError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| ScrapeError::FetchEngine(e.to_string()))
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
