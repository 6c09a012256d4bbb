//! Link collector: paginates a listing and accumulates product URLs

use crate::config::{CollectorConfig, Config, FetcherConfig, SelectorsConfig};
use crate::extract::extract_product_links;
use crate::fetch::{pace, PageFetcher};
use crate::persist::{
    clear_checkpoint, load_checkpoint, save_checkpoint, write_link_list, CrawlCheckpoint,
};
use crate::Result;
use std::collections::HashSet;
use std::path::Path;
use url::Url;

/// Walks a paginated listing, collecting unique product URLs
///
/// Checkpoints after every page; an interrupted run resumes from the
/// checkpointed page with the links gathered so far. Stop conditions, first
/// match wins:
/// 1. collected count reached `max-links` (checked after a whole page is
///    appended, so the output may overshoot by up to one page)
/// 2. a page failed to fetch
/// 3. a page yielded zero new links (end of catalog; a missing listing
///    container counts as zero)
/// 4. `min-links` reached and `end-page` is configured and passed
pub struct LinkCollector {
    collector: CollectorConfig,
    fetcher_config: FetcherConfig,
    selectors: SelectorsConfig,
    fetcher: PageFetcher,
    base_url: Url,
    links: Vec<String>,
    seen: HashSet<String>,
    current_page: u32,
}

impl LinkCollector {
    /// Creates a collector, starting the configured fetch engine
    pub async fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.collector.base_url)?;
        let fetcher = PageFetcher::new(&config.fetcher).await?;

        Ok(Self {
            collector: config.collector.clone(),
            fetcher_config: config.fetcher.clone(),
            selectors: config.selectors.clone(),
            fetcher,
            base_url,
            links: Vec::new(),
            seen: HashSet::new(),
            current_page: config.collector.start_page,
        })
    }

    /// Runs the collection loop and writes the result file
    ///
    /// With `fresh` set, an existing checkpoint is discarded and collection
    /// starts over from `start-page`. The fetch engine is released before
    /// returning, on success and on error alike.
    pub async fn run(&mut self, fresh: bool) -> Result<Vec<String>> {
        let result = self.run_inner(fresh).await;
        self.fetcher.shutdown().await;
        result
    }

    async fn run_inner(&mut self, fresh: bool) -> Result<Vec<String>> {
        let checkpoint_path = Path::new(&self.collector.checkpoint_file).to_path_buf();

        if fresh {
            tracing::info!("Starting fresh collection (ignoring previous checkpoint)");
            clear_checkpoint(&checkpoint_path)?;
        } else if let Some(checkpoint) = load_checkpoint::<CrawlCheckpoint>(&checkpoint_path) {
            tracing::info!(
                "Loaded checkpoint: {} links, current page {}",
                checkpoint.links.len(),
                checkpoint.current_page
            );
            self.seen = checkpoint.links.iter().cloned().collect();
            self.links = checkpoint.links;
            self.current_page = checkpoint.current_page;
        }

        tracing::info!("Collecting links starting from page {}", self.current_page);

        loop {
            if self.links.len() >= self.collector.max_links {
                tracing::info!(
                    "Reached maximum links limit ({} >= {})",
                    self.links.len(),
                    self.collector.max_links
                );
                break;
            }

            let page_url = self.page_url();
            tracing::info!("Processing page {}: {}", self.current_page, page_url);

            pace(&self.fetcher_config).await;

            let html = match self
                .fetcher
                .fetch(&page_url, &self.selectors.listing_container)
                .await
            {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("Failed to fetch page {}: {}, stopping", self.current_page, e);
                    break;
                }
            };

            let extracted = match extract_product_links(&html, &self.selectors, &self.base_url) {
                Ok(links) => links,
                Err(e) => {
                    tracing::warn!("Extraction failed on page {}: {}", self.current_page, e);
                    Vec::new()
                }
            };

            let new_links: Vec<String> = extracted
                .into_iter()
                .filter(|link| !self.seen.contains(link))
                .collect();

            if new_links.is_empty() {
                tracing::info!(
                    "No new links found on page {}, stopping",
                    self.current_page
                );
                break;
            }

            for link in new_links {
                self.seen.insert(link.clone());
                self.links.push(link);
            }
            tracing::info!(
                "Page {} done, {} links total",
                self.current_page,
                self.links.len()
            );

            // The checkpoint records the next page to fetch; resuming must
            // not re-fetch the page whose links were just appended.
            save_checkpoint(
                &checkpoint_path,
                &CrawlCheckpoint {
                    links: self.links.clone(),
                    current_page: self.current_page + 1,
                },
            )?;

            if self.links.len() >= self.collector.min_links {
                if let Some(end_page) = self.collector.end_page {
                    if self.current_page >= end_page {
                        tracing::info!(
                            "Reached end page {} with {} links",
                            end_page,
                            self.links.len()
                        );
                        break;
                    }
                }
            }

            self.current_page += 1;
        }

        write_link_list(Path::new(&self.collector.output_file), &self.links)?;
        tracing::info!(
            "Finished collecting: {} links written to {}",
            self.links.len(),
            self.collector.output_file
        );

        Ok(self.links.clone())
    }

    /// URL for the current page: page 1 is the bare base URL, later pages
    /// carry a `page=N` query parameter
    fn page_url(&self) -> String {
        if self.current_page == 1 {
            self.collector.base_url.clone()
        } else {
            format!("{}?page={}", self.collector.base_url, self.current_page)
        }
    }
}
