//! The two crawl pipelines
//!
//! Both share one shape: fetch a page, parse it, persist the result, persist
//! a checkpoint, then continue or stop. They differ in parse/persist logic
//! and stop conditions:
//! - [`LinkCollector`] paginates a listing until a stop condition fires
//! - [`DetailFetcher`] walks a fixed URL list to exhaustion, skipping bad
//!   items instead of aborting

mod collector;
mod details;

pub use collector::LinkCollector;
pub use details::{DetailFetcher, RunSummary};

use crate::fetch::FetchError;
use thiserror::Error;

/// Why a single product was skipped
///
/// Skips are per-item outcomes, not errors: the loop logs them with the
/// item's index and URL and moves on. No checkpoint is written for a skipped
/// index, so an interrupted run retries it.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("parse failed: {0}")]
    Parse(String),
}
