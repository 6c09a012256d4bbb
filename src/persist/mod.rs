//! Durable state: checkpoints, link lists, and product output units
//!
//! Everything the pipelines write to disk goes through this module. The two
//! checkpoint formats are tiny JSON objects overwritten wholesale on every
//! save; saves go through a tmp-file-then-rename replace so a crash mid-write
//! never leaves a truncated checkpoint. Loads tolerate a corrupt file by
//! treating it as absent, since the worst case is re-doing one unit of work.
//!
//! Write failures are mapped to [`ScrapeError::Persist`] and abort the run:
//! disk errors are environmental, and retrying per item would silently drop
//! records.

use crate::{Result, ScrapeError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Link collector checkpoint: everything gathered so far plus the next page
///
/// `links` holds unique URLs in discovery order; resuming re-reads this and
/// continues from `current_page` without re-fetching earlier pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlCheckpoint {
    pub links: Vec<String>,
    pub current_page: u32,
}

/// Detail fetcher checkpoint: the last durably saved product index
///
/// Resume starts at `last_index + 1`; the index and everything before it are
/// considered saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchCheckpoint {
    pub last_index: usize,
}

/// One product's extracted data, written as `data.json` in its output unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub url: String,
    pub price: Option<String>,
    pub old_price: Option<String>,
    pub description: Option<String>,
    pub attributes: HashMap<String, String>,
}

/// Loads a checkpoint, treating missing or corrupt files as absent
pub fn load_checkpoint<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read checkpoint {}: {}", path.display(), e);
            }
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(checkpoint) => Some(checkpoint),
        Err(e) => {
            tracing::warn!(
                "Ignoring corrupt checkpoint {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Saves a checkpoint, replacing any previous one atomically
///
/// Must complete before the loop advances; this bounds crash loss to one
/// in-flight item.
pub fn save_checkpoint<T: Serialize>(path: &Path, checkpoint: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(checkpoint)?;
    write_atomic(path, &json)
}

/// Removes a checkpoint file; missing is fine
///
/// The detail fetcher calls this after a complete run: no checkpoint means
/// "start fresh", never "resume".
pub fn clear_checkpoint(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(persist_error(path, e)),
    }
}

/// Writes the collector's final JSON array of product URLs
pub fn write_link_list(path: &Path, links: &[String]) -> Result<()> {
    let json = serde_json::to_vec_pretty(links)?;
    write_atomic(path, &json)
}

/// Reads the detail fetcher's input list of product URLs
pub fn read_link_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Path of the output unit for a product index
pub fn product_dir(result_dir: &Path, index: usize) -> PathBuf {
    result_dir.join(index.to_string())
}

/// Creates a product's output directory
pub fn ensure_product_dir(result_dir: &Path, index: usize) -> Result<PathBuf> {
    let dir = product_dir(result_dir, index);
    std::fs::create_dir_all(&dir).map_err(|e| persist_error(&dir, e))?;
    Ok(dir)
}

/// Writes `data.json` into the product's output unit
pub fn write_product_record(dir: &Path, record: &ProductRecord) -> Result<()> {
    let path = dir.join("data.json");
    let json = serde_json::to_vec_pretty(record)?;
    std::fs::write(&path, json).map_err(|e| persist_error(&path, e))
}

/// Writes a downloaded image as `image.<ext>` and returns its path
pub fn write_image(dir: &Path, image_url: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(format!("image.{}", image_extension(image_url)));
    std::fs::write(&path, bytes).map_err(|e| persist_error(&path, e))?;
    Ok(path)
}

/// Writes the empty `no_image.txt` sentinel
///
/// Distinct from an absent file: it records "no image was obtainable" rather
/// than "the record is incomplete".
pub fn write_no_image_sentinel(dir: &Path) -> Result<()> {
    let path = dir.join("no_image.txt");
    std::fs::write(&path, b"").map_err(|e| persist_error(&path, e))
}

/// Derives an image file extension from a URL path, defaulting to `jpg`
fn image_extension(image_url: &str) -> String {
    Url::parse(image_url)
        .ok()
        .and_then(|url| {
            Path::new(url.path())
                .extension()
                .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        })
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "jpg".to_string())
}

/// Writes bytes to `<path>.tmp`, then renames over the target
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| persist_error(parent, e))?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, bytes).map_err(|e| persist_error(&tmp_path, e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| persist_error(path, e))
}

fn persist_error(path: &Path, source: std::io::Error) -> ScrapeError {
    ScrapeError::Persist {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_crawl_checkpoint_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint_links.json");

        let checkpoint = CrawlCheckpoint {
            links: vec!["https://shop.example/p/a".to_string()],
            current_page: 4,
        };
        save_checkpoint(&path, &checkpoint).unwrap();

        let loaded: CrawlCheckpoint = load_checkpoint(&path).unwrap();
        assert_eq!(loaded, checkpoint);
    }

    #[test]
    fn test_fetch_checkpoint_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        save_checkpoint(&path, &FetchCheckpoint { last_index: 5 }).unwrap();

        let loaded: FetchCheckpoint = load_checkpoint(&path).unwrap();
        assert_eq!(loaded.last_index, 5);
    }

    #[test]
    fn test_missing_checkpoint_is_none() {
        let dir = tempdir().unwrap();
        let loaded: Option<FetchCheckpoint> = load_checkpoint(&dir.path().join("nope.json"));
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_checkpoint_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        std::fs::write(&path, "{not json").unwrap();

        let loaded: Option<FetchCheckpoint> = load_checkpoint(&path);
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_leaves_no_tmp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        save_checkpoint(&path, &FetchCheckpoint { last_index: 0 }).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("checkpoint.json")]);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoints/nested/checkpoint.json");
        save_checkpoint(&path, &FetchCheckpoint { last_index: 1 }).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_clear_checkpoint_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        save_checkpoint(&path, &FetchCheckpoint { last_index: 2 }).unwrap();

        clear_checkpoint(&path).unwrap();
        assert!(!path.exists());

        // Clearing again is not an error
        clear_checkpoint(&path).unwrap();
    }

    #[test]
    fn test_link_list_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("links.json");
        let links = vec![
            "https://shop.example/p/a".to_string(),
            "https://shop.example/p/b".to_string(),
        ];

        write_link_list(&path, &links).unwrap();
        assert_eq!(read_link_list(&path).unwrap(), links);
    }

    #[test]
    fn test_product_record_written_as_data_json() {
        let dir = tempdir().unwrap();
        let unit = ensure_product_dir(dir.path(), 7).unwrap();

        let record = ProductRecord {
            url: "https://shop.example/p/a".to_string(),
            price: Some("1499".to_string()),
            old_price: Some("999".to_string()),
            description: None,
            attributes: HashMap::new(),
        };
        write_product_record(&unit, &record).unwrap();

        let content = std::fs::read_to_string(unit.join("data.json")).unwrap();
        let loaded: ProductRecord = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded, record);
        assert_eq!(unit, dir.path().join("7"));
    }

    #[test]
    fn test_image_extension_from_url_path() {
        assert_eq!(image_extension("https://cdn.example/img/a.png"), "png");
        assert_eq!(image_extension("https://cdn.example/img/a.JPG"), "jpg");
        assert_eq!(
            image_extension("https://cdn.example/img/a.webp?size=large"),
            "webp"
        );
    }

    #[test]
    fn test_image_extension_defaults_to_jpg() {
        assert_eq!(image_extension("https://cdn.example/img/raw"), "jpg");
        assert_eq!(image_extension("not a url"), "jpg");
    }

    #[test]
    fn test_write_image_and_sentinel() {
        let dir = tempdir().unwrap();
        let unit = ensure_product_dir(dir.path(), 0).unwrap();

        let path = write_image(&unit, "https://cdn.example/a.png", b"bytes").unwrap();
        assert_eq!(path, unit.join("image.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");

        write_no_image_sentinel(&unit).unwrap();
        assert_eq!(std::fs::read(unit.join("no_image.txt")).unwrap(), b"");
    }
}
