//! Exhibit loading integration tests.
//!
//! Tests verify:
//! - Exhibits load from files, fetchers and resolved values
//! - Missing or malformed documents surface as errors
//! - The layout report matches what the builder registers

use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use wsi_exhibit::error::ExhibitError;
use wsi_exhibit::exhibit::{
    load_exhibit, ExhibitBuilder, ExhibitFetcher, ExhibitSource, HttpFetcher, LayoutReport,
};
use wsi_exhibit::viewer::{HeadlessRenderState, HeadlessViewer, Viewer};

use super::test_utils::{exhibit, exhibit_bytes, image_json, two_image_exhibit, MockFetcher};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("wsi-exhibit-{}-{}.json", name, std::process::id()))
}

#[tokio::test]
async fn test_load_from_file() {
    let ex = two_image_exhibit();
    let path = temp_path("file");
    tokio::fs::write(&path, exhibit_bytes(&ex)).await.unwrap();

    let source = ExhibitSource::parse(path.to_str().unwrap());
    let loaded = load_exhibit(source, &MockFetcher::new()).await;
    tokio::fs::remove_file(&path).await.unwrap();

    assert_eq!(loaded.unwrap(), ex);
}

#[tokio::test]
async fn test_load_from_fetcher() {
    let ex = two_image_exhibit();
    let fetcher = MockFetcher::new().with_body("https://exhibits.example/a.json", exhibit_bytes(&ex));

    let loaded = load_exhibit(
        ExhibitSource::parse("https://exhibits.example/a.json"),
        &fetcher,
    )
    .await
    .unwrap();
    assert_eq!(loaded, ex);
}

#[tokio::test]
async fn test_fetch_error_is_reported() {
    let fetcher = MockFetcher::new();
    let result = load_exhibit(
        ExhibitSource::parse("https://exhibits.example/missing.json"),
        &fetcher,
    )
    .await;

    match result {
        Err(ExhibitError::Fetch { url, message }) => {
            assert_eq!(url, "https://exhibits.example/missing.json");
            assert!(message.contains("404"));
        }
        other => panic!("expected fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_document() {
    let fetcher = MockFetcher::new().with_body("https://exhibits.example/bad.json", "{\"Name\": 3}");
    let result = load_exhibit(
        ExhibitSource::parse("https://exhibits.example/bad.json"),
        &fetcher,
    )
    .await;
    assert!(matches!(result, Err(ExhibitError::Parse(_))));
}

#[tokio::test]
async fn test_http_fetcher_connection_error() {
    // Nothing listens on the discard port
    let url = Url::parse("http://127.0.0.1:9/exhibit.json").unwrap();
    let result = HttpFetcher::new().fetch(&url).await;
    assert!(matches!(result, Err(ExhibitError::Fetch { .. })));
}

#[test]
fn test_layout_report_matches_builder() {
    let ex = exhibit(
        &[image_json("a", 3000, 1500), image_json("b", 1000, 1500)],
        &[&["a"], &["b"]],
        &["mask-cells"],
    );
    let report = LayoutReport::plan(&ex, 64).unwrap();

    let headless = Arc::new(HeadlessViewer::new());
    let viewer: Arc<dyn Viewer> = headless.clone();
    let built = ExhibitBuilder::new(Arc::new(HeadlessRenderState::new()))
        .build(&ex, &viewer, Box::new(|_| {}))
        .unwrap();

    assert_eq!(report.shape, built.shape);
    assert_eq!(report.placements, built.placements);
    assert_eq!(report.barrier_total, built.barrier.total());
    assert_eq!(report.viewer.max_image_cache_count, 64);

    for (plan, handle) in report.layers.iter().zip(&built.layers) {
        let registered = headless
            .with_layer(handle.index, |spec| spec.tile_source.clone())
            .unwrap();
        assert_eq!(plan.tile_source, registered);
    }
}
