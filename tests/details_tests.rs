//! Integration tests for the detail fetcher
//!
//! These tests use wiremock product pages to exercise the full per-product
//! loop end-to-end: output units, the image retry ladder and sentinel,
//! resume, skip-on-failure, and checkpoint cleanup.

use shelfcrawl::config::{
    CollectorConfig, Config, DetailsConfig, FetchEngineKind, FetcherConfig, SelectorsConfig,
};
use shelfcrawl::persist::{save_checkpoint, write_link_list, FetchCheckpoint, ProductRecord};
use shelfcrawl::pipeline::DetailFetcher;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server and temp dir
fn create_test_config(base_url: &str, workdir: &Path) -> Config {
    Config {
        collector: CollectorConfig {
            base_url: format!("{}/catalog", base_url),
            start_page: 1,
            end_page: None,
            min_links: 1,
            max_links: 1000,
            output_file: workdir.join("links.json").to_string_lossy().into_owned(),
            checkpoint_file: workdir
                .join("checkpoint_links.json")
                .to_string_lossy()
                .into_owned(),
        },
        details: DetailsConfig {
            input_file: workdir.join("links.json").to_string_lossy().into_owned(),
            result_dir: workdir.join("out").to_string_lossy().into_owned(),
            checkpoint_file: workdir
                .join("checkpoint.json")
                .to_string_lossy()
                .into_owned(),
            start_from: 0,
            max_products: None,
        },
        fetcher: FetcherConfig {
            engine: FetchEngineKind::Http,
            headless: true,
            timeout_secs: 5,
            request_delay_ms: 0,
            jitter_ms: 0,
        },
        selectors: SelectorsConfig {
            detail_container: "div#info".to_string(),
            price: "span.price".to_string(),
            description: "div.description".to_string(),
            attribute_row: "p.attr".to_string(),
            attribute_name: "span.name".to_string(),
            attribute_value: "span.value".to_string(),
            gallery_image: "div.gallery img".to_string(),
            ..SelectorsConfig::default()
        },
    }
}

/// Builds product page HTML with a price pair, description, one attribute,
/// and a gallery image
fn product_page(prices: &[&str], img_src: &str) -> String {
    let price_spans: String = prices
        .iter()
        .map(|p| format!(r#"<span class="price">{}</span>"#, p))
        .collect();
    format!(
        r#"<html><body>
        {}
        <div id="info">
            <div class="description">A lovely dress</div>
            <p class="attr"><span class="name">Color</span><span class="value">Blue</span></p>
        </div>
        <div class="gallery"><img src="{}"></div>
        </body></html>"#,
        price_spans, img_src
    )
}

fn write_input(config: &Config, urls: &[String]) {
    write_link_list(Path::new(&config.details.input_file), urls).unwrap();
}

fn unit_dir(config: &Config, index: usize) -> PathBuf {
    PathBuf::from(&config.details.result_dir).join(index.to_string())
}

fn read_record(config: &Config, index: usize) -> ProductRecord {
    let content = std::fs::read_to_string(unit_dir(config, index).join("data.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[tokio::test]
async fn test_full_run_writes_units_and_cleans_checkpoint() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/p/one"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(product_page(&["999", "1499"], "/img/one.png")),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/two"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page(&["250"], "/img/two.jpg")),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/one.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes".to_vec()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/two.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpg-bytes".to_vec()))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), workdir.path());
    let urls = vec![
        format!("{}/p/one", server.uri()),
        format!("{}/p/two", server.uri()),
    ];
    write_input(&config, &urls);

    let mut fetcher = DetailFetcher::new(&config).await.unwrap();
    let summary = fetcher.run().await.unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.saved, 2);
    assert_eq!(summary.skipped, 0);

    let record = read_record(&config, 0);
    assert_eq!(record.url, urls[0]);
    assert_eq!(record.old_price.as_deref(), Some("999"));
    assert_eq!(record.price.as_deref(), Some("1499"));
    assert_eq!(record.description.as_deref(), Some("A lovely dress"));
    assert_eq!(record.attributes.get("Color").map(String::as_str), Some("Blue"));
    assert_eq!(
        std::fs::read(unit_dir(&config, 0).join("image.png")).unwrap(),
        b"png-bytes"
    );

    let record = read_record(&config, 1);
    assert_eq!(record.price.as_deref(), Some("250"));
    assert_eq!(record.old_price, None);
    assert!(unit_dir(&config, 1).join("image.jpg").exists());

    // A clean, complete run must leave no checkpoint behind
    assert!(!Path::new(&config.details.checkpoint_file).exists());

    // Re-running with no checkpoint reproduces the same structural writes
    let mut fetcher = DetailFetcher::new(&config).await.unwrap();
    let summary = fetcher.run().await.unwrap();
    assert_eq!(summary.saved, 2);
    assert_eq!(read_record(&config, 0).url, urls[0]);
}

#[tokio::test]
async fn test_resume_starts_after_last_index() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    // Indices 0 and 1 are covered by the checkpoint and must not be fetched
    Mock::given(method("GET"))
        .and(path("/p/zero"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/one"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/two"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page(&["100"], "/img/a.png")),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), workdir.path());
    write_input(
        &config,
        &[
            format!("{}/p/zero", server.uri()),
            format!("{}/p/one", server.uri()),
            format!("{}/p/two", server.uri()),
        ],
    );
    save_checkpoint(
        Path::new(&config.details.checkpoint_file),
        &FetchCheckpoint { last_index: 1 },
    )
    .unwrap();

    let mut fetcher = DetailFetcher::new(&config).await.unwrap();
    let summary = fetcher.run().await.unwrap();

    assert_eq!(summary.saved, 1);
    assert!(unit_dir(&config, 2).join("data.json").exists());
    assert!(!unit_dir(&config, 0).exists());
    assert!(!Path::new(&config.details.checkpoint_file).exists());
}

#[tokio::test]
async fn test_start_from_offset_without_checkpoint() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    // Below the configured offset, must never be fetched
    Mock::given(method("GET"))
        .and(path("/p/zero"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/one"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page(&["100"], "/img/a.png")),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), workdir.path());
    config.details.start_from = 1;
    write_input(
        &config,
        &[
            format!("{}/p/zero", server.uri()),
            format!("{}/p/one", server.uri()),
        ],
    );

    let mut fetcher = DetailFetcher::new(&config).await.unwrap();
    let summary = fetcher.run().await.unwrap();

    assert_eq!(summary.saved, 1);
    assert!(unit_dir(&config, 1).join("data.json").exists());
    assert!(!unit_dir(&config, 0).exists());
}

#[tokio::test]
async fn test_max_value_checkpoint_index_processes_nothing() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    // A checkpoint claiming everything is done must not wrap to index 0
    Mock::given(method("GET"))
        .and(path("/p/zero"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), workdir.path());
    write_input(&config, &[format!("{}/p/zero", server.uri())]);
    save_checkpoint(
        Path::new(&config.details.checkpoint_file),
        &FetchCheckpoint {
            last_index: usize::MAX,
        },
    )
    .unwrap();

    let mut fetcher = DetailFetcher::new(&config).await.unwrap();
    let summary = fetcher.run().await.unwrap();

    assert_eq!(summary.saved, 0);
    assert_eq!(summary.skipped, 0);
}

#[tokio::test]
async fn test_fetch_failure_skips_item_and_continues() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/p/bad"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/good"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page(&["100"], "/img/a.png")),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), workdir.path());
    write_input(
        &config,
        &[
            format!("{}/p/bad", server.uri()),
            format!("{}/p/good", server.uri()),
        ],
    );

    let mut fetcher = DetailFetcher::new(&config).await.unwrap();
    let summary = fetcher.run().await.unwrap();

    assert_eq!(summary.saved, 1);
    assert_eq!(summary.skipped, 1);
    // The skipped index gets no output unit, the good one does
    assert!(!unit_dir(&config, 0).exists());
    assert!(unit_dir(&config, 1).join("data.json").exists());
}

#[tokio::test]
async fn test_unreachable_image_writes_sentinel_after_retries() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/p/one"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page(&["100"], "/img/gone.png")),
        )
        .mount(&server)
        .await;

    // Three attempts per candidate, then the sentinel
    Mock::given(method("GET"))
        .and(path("/img/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), workdir.path());
    write_input(&config, &[format!("{}/p/one", server.uri())]);

    let mut fetcher = DetailFetcher::new(&config).await.unwrap();
    let summary = fetcher.run().await.unwrap();

    assert_eq!(summary.saved, 1);
    let unit = unit_dir(&config, 0);
    assert!(unit.join("no_image.txt").exists());
    assert!(unit.join("data.json").exists());
    assert!(!unit.join("image.png").exists());
}

#[tokio::test]
async fn test_max_products_truncates_input() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/p/one"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page(&["100"], "/img/a.png")),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/two"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), workdir.path());
    config.details.max_products = Some(1);
    write_input(
        &config,
        &[
            format!("{}/p/one", server.uri()),
            format!("{}/p/two", server.uri()),
        ],
    );

    let mut fetcher = DetailFetcher::new(&config).await.unwrap();
    let summary = fetcher.run().await.unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(summary.saved, 1);
}
