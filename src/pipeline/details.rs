//! Detail fetcher: walks a product URL list and writes one output unit each

use crate::config::{Config, DetailsConfig, FetcherConfig, SelectorsConfig};
use crate::extract::{extract_image_urls, parse_product_fields};
use crate::fetch::{build_image_client, pace, PageFetcher};
use crate::persist::{
    clear_checkpoint, ensure_product_dir, load_checkpoint, read_link_list, save_checkpoint,
    write_image, write_no_image_sentinel, write_product_record, FetchCheckpoint, ProductRecord,
};
use crate::pipeline::SkipReason;
use crate::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const IMAGE_RETRY_ATTEMPTS: u32 = 3;
const IMAGE_RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Counts reported after a detail run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub saved: usize,
    pub skipped: usize,
}

/// Outcome of one product index
enum ItemOutcome {
    Saved,
    Skipped(SkipReason),
}

/// Iterates a fixed product URL list, extracting fields and one image each
///
/// Best effort, never abort the whole run: fetch and parse failures skip the
/// item (without writing a checkpoint, so a later run retries it). Persist
/// failures abort: losing records silently to a sick disk is worse than
/// stopping. On clean completion the checkpoint file is deleted so the next
/// invocation starts fresh.
pub struct DetailFetcher {
    details: DetailsConfig,
    fetcher_config: FetcherConfig,
    selectors: SelectorsConfig,
    fetcher: PageFetcher,
    image_client: reqwest::Client,
}

impl DetailFetcher {
    /// Creates a fetcher, starting the configured fetch engine
    pub async fn new(config: &Config) -> Result<Self> {
        let fetcher = PageFetcher::new(&config.fetcher).await?;
        let image_client = build_image_client()?;

        Ok(Self {
            details: config.details.clone(),
            fetcher_config: config.fetcher.clone(),
            selectors: config.selectors.clone(),
            fetcher,
            image_client,
        })
    }

    /// Runs the detail loop over the whole input list
    ///
    /// The fetch engine is released before returning, on success and on
    /// error alike.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let result = self.run_inner().await;
        self.fetcher.shutdown().await;
        result
    }

    async fn run_inner(&mut self) -> Result<RunSummary> {
        let mut links = read_link_list(Path::new(&self.details.input_file))?;
        if let Some(max_products) = self.details.max_products {
            links.truncate(max_products);
        }

        let checkpoint_path = PathBuf::from(&self.details.checkpoint_file);
        let start = match load_checkpoint::<FetchCheckpoint>(&checkpoint_path) {
            Some(checkpoint) => {
                // Checkpoint content is untrusted; a max-value index must not
                // wrap around to zero.
                let start = checkpoint.last_index.saturating_add(1);
                tracing::info!("Resuming from index {}", start);
                start
            }
            None => self.details.start_from,
        };

        let total = links.len();
        tracing::info!("Processing {} products starting at index {}", total, start);

        let started = std::time::Instant::now();
        let mut saved = 0;
        let mut skipped = 0;

        for (index, url) in links.iter().enumerate().skip(start) {
            tracing::info!("[{}/{}] {}", index + 1, total, url);

            match self.process_product(index, url).await? {
                ItemOutcome::Saved => {
                    save_checkpoint(&checkpoint_path, &FetchCheckpoint { last_index: index })?;
                    saved += 1;
                }
                ItemOutcome::Skipped(reason) => {
                    tracing::warn!("Skipping product {} ({}): {}", index, url, reason);
                    skipped += 1;
                }
            }
        }

        // A missing checkpoint means "start fresh", signalling a clean run
        clear_checkpoint(&checkpoint_path)?;

        tracing::info!(
            "All products processed: {} saved, {} skipped in {:?}",
            saved,
            skipped,
            started.elapsed()
        );

        Ok(RunSummary {
            total,
            saved,
            skipped,
        })
    }

    /// Processes one product index end to end
    ///
    /// Returns the per-item outcome; only persist failures become `Err`.
    async fn process_product(&mut self, index: usize, url: &str) -> Result<ItemOutcome> {
        pace(&self.fetcher_config).await;

        let html = match self
            .fetcher
            .fetch(url, &self.selectors.detail_container)
            .await
        {
            Ok(html) => html,
            Err(e) => return Ok(ItemOutcome::Skipped(SkipReason::Fetch(e))),
        };

        let (record, image_urls) = match parse_product(url, &html, &self.selectors) {
            Ok(parsed) => parsed,
            Err(reason) => return Ok(ItemOutcome::Skipped(reason)),
        };

        let unit = ensure_product_dir(Path::new(&self.details.result_dir), index)?;

        match download_first_image(&self.image_client, &image_urls).await {
            Some((image_url, bytes)) => {
                write_image(&unit, &image_url, &bytes)?;
            }
            None => {
                write_no_image_sentinel(&unit)?;
            }
        }

        write_product_record(&unit, &record)?;

        Ok(ItemOutcome::Saved)
    }
}

/// Parses the record fields and image candidates from product page HTML
fn parse_product(
    url: &str,
    html: &str,
    selectors: &SelectorsConfig,
) -> std::result::Result<(ProductRecord, Vec<String>), SkipReason> {
    let page_url =
        Url::parse(url).map_err(|e| SkipReason::Parse(format!("bad product URL: {}", e)))?;

    let parsed = parse_product_fields(html, selectors).map_err(SkipReason::Parse)?;
    let image_urls = extract_image_urls(html, selectors, &page_url).map_err(SkipReason::Parse)?;

    let record = ProductRecord {
        url: url.to_string(),
        price: parsed.price,
        old_price: parsed.old_price,
        description: parsed.description,
        attributes: parsed.attributes,
    };

    Ok((record, image_urls))
}

/// Tries image candidates in order; first HTTP 200 body wins
///
/// Each candidate gets up to three attempts with a one second pause between
/// them. Returns None when no candidate succeeds, which the caller records
/// with the no-image sentinel.
async fn download_first_image(
    client: &reqwest::Client,
    image_urls: &[String],
) -> Option<(String, Vec<u8>)> {
    for image_url in image_urls {
        for attempt in 1..=IMAGE_RETRY_ATTEMPTS {
            match try_download(client, image_url).await {
                Ok(bytes) => return Some((image_url.clone(), bytes)),
                Err(e) => {
                    tracing::debug!(
                        "Image attempt {}/{} failed for {}: {}",
                        attempt,
                        IMAGE_RETRY_ATTEMPTS,
                        image_url,
                        e
                    );
                    if attempt < IMAGE_RETRY_ATTEMPTS {
                        tokio::time::sleep(IMAGE_RETRY_PAUSE).await;
                    }
                }
            }
        }
    }
    None
}

async fn try_download(
    client: &reqwest::Client,
    url: &str,
) -> std::result::Result<Vec<u8>, String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;

    if response.status() != reqwest::StatusCode::OK {
        return Err(format!("HTTP {}", response.status().as_u16()));
    }

    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    Ok(bytes.to_vec())
}
