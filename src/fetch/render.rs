//! Rendering fetch engine
//!
//! Drives a Chrome DevTools session via chromiumoxide. Navigation reuses one
//! long-lived page; after navigating, the fetcher polls for a marker selector
//! until it appears or the timeout elapses, then returns the rendered HTML.
//!
//! The browser session is the only self-healing resource in the system: a
//! dead session is detected before navigation and transparently relaunched,
//! after which the navigation is retried once. Everything else fails the
//! item, not the run.
//!
//! chromiumoxide pages hold CDP connections that are not released by Drop,
//! so the loop driver must call [`RenderFetcher::shutdown`] explicitly.

use crate::config::FetcherConfig;
use crate::fetch::FetchError;
use crate::ScrapeError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Fetches pages through a rendered browser session
pub struct RenderFetcher {
    headless: bool,
    timeout: Duration,
    session: Option<RenderSession>,
}

/// A live browser, its event handler task, and the page used for navigation
struct RenderSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl RenderFetcher {
    /// Launches the browser session
    ///
    /// # Errors
    ///
    /// Returns `ScrapeError::FetchEngine` when the browser cannot start.
    /// Unlike mid-run session deaths this is not recovered: without an
    /// engine there is no work to do.
    pub async fn launch(config: &FetcherConfig) -> Result<Self, ScrapeError> {
        let session = RenderSession::launch(config.headless)
            .await
            .map_err(ScrapeError::FetchEngine)?;

        Ok(Self {
            headless: config.headless,
            timeout: Duration::from_secs(config.timeout_secs),
            session: Some(session),
        })
    }

    /// Navigates to `url` and returns the rendered HTML once `marker` appears
    ///
    /// A session-level failure relaunches the browser and retries once; a
    /// marker timeout does not, since the session itself is healthy.
    pub async fn fetch(&mut self, url: &str, marker: &str) -> Result<String, FetchError> {
        let alive = match &self.session {
            Some(session) => session.is_alive().await,
            None => false,
        };

        if !alive {
            tracing::warn!("Render session is dead, relaunching browser");
            self.relaunch().await?;
        }

        match self.try_fetch(url, marker).await {
            Err(FetchError::Session(e)) => {
                tracing::warn!("Render fetch of {} failed ({}), relaunching once", url, e);
                self.relaunch().await?;
                self.try_fetch(url, marker).await
            }
            result => result,
        }
    }

    async fn try_fetch(&self, url: &str, marker: &str) -> Result<String, FetchError> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| FetchError::Session("no active browser session".to_string()))?;

        session.navigate(url).await?;
        session.await_marker(url, marker, self.timeout).await?;
        session.content().await
    }

    /// Closes the browser session; further fetches relaunch it
    pub async fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            session.shutdown().await;
        }
    }

    async fn relaunch(&mut self) -> Result<(), FetchError> {
        if let Some(session) = self.session.take() {
            session.shutdown().await;
        }
        let session = RenderSession::launch(self.headless)
            .await
            .map_err(FetchError::Session)?;
        self.session = Some(session);
        Ok(())
    }
}

impl RenderSession {
    async fn launch(headless: bool) -> Result<Self, String> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build()?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| e.to_string())?;

        // The handler stream must be polled for the browser to make progress
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| e.to_string())?;

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// Cheap liveness probe against the DevTools endpoint
    async fn is_alive(&self) -> bool {
        self.browser.version().await.is_ok()
    }

    async fn navigate(&self, url: &str) -> Result<(), FetchError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| FetchError::Session(format!("navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    /// Polls for the marker selector until it appears or the timeout elapses
    async fn await_marker(
        &self,
        url: &str,
        marker: &str,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(marker).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(FetchError::MarkerTimeout {
                    url: url.to_string(),
                    selector: marker.to_string(),
                });
            }
            tokio::time::sleep(MARKER_POLL_INTERVAL).await;
        }
    }

    async fn content(&self) -> Result<String, FetchError> {
        self.page
            .content()
            .await
            .map_err(|e| FetchError::Session(format!("failed to read page content: {}", e)))
    }

    async fn shutdown(mut self) {
        let _ = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}
