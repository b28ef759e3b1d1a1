//! Exhibit assembly integration tests.
//!
//! Tests verify:
//! - A two-image exhibit registers two layers and fires its barrier once
//! - Success hooks update the render state before the initializer runs
//! - Unresolved layers are reported when the viewer goes away
//! - Arrow overlays are corrected after viewport updates

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use wsi_exhibit::barrier::{BarrierReport, FailurePolicy};
use wsi_exhibit::exhibit::{ExhibitBuilder, ExhibitSource};
use wsi_exhibit::viewer::{
    HeadlessRenderState, HeadlessViewer, Overlay, OverlayElement, Placement, Point, Viewer,
    ViewerEventKind,
};

use super::test_utils::{
    exhibit, exhibit_bytes, image_json, two_image_exhibit, CallLog, LoggingRenderState,
    MockFetcher,
};

fn headless_pair() -> (Arc<HeadlessViewer>, Arc<dyn Viewer>) {
    let headless = Arc::new(HeadlessViewer::new());
    let viewer: Arc<dyn Viewer> = headless.clone();
    (headless, viewer)
}

// =============================================================================
// End to End
// =============================================================================

#[test]
fn test_two_image_row_fires_once() {
    let (headless, viewer) = headless_pair();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();

    let built = ExhibitBuilder::new(Arc::new(HeadlessRenderState::new()))
        .build(
            &two_image_exhibit(),
            &viewer,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    assert_eq!(built.shape.num_columns, 2);
    assert_eq!(built.shape.num_rows, 1);
    assert!((built.shape.cell_height - 1.0).abs() < 1e-9);
    assert_eq!(built.barrier.total(), 2);
    assert_eq!(built.layers.len(), 2);

    assert!(headless.complete_layer(0));
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert!(headless.complete_layer(1));
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    // Late duplicate completions are impossible and extra notifications
    // past the total are ignored
    assert!(!headless.complete_layer(1));
    built.barrier.notify_loaded();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_home_center_uses_grid_aspect_ratio() {
    let (_, viewer) = headless_pair();
    let built = ExhibitBuilder::new(Arc::new(HeadlessRenderState::new()))
        .build(&two_image_exhibit(), &viewer, Box::new(|_| {}))
        .unwrap();

    let center = viewer.center();
    assert!((center.x - 0.5 * built.shape.aspect_ratio()).abs() < 1e-9);
    assert!((center.y - 0.5).abs() < 1e-9);
}

#[test]
fn test_hooks_run_before_initializer() {
    let log = CallLog::new();
    let (headless, viewer) = headless_pair();
    let ex = exhibit(
        &[image_json("a", 2000, 1000)],
        &[&["a"]],
        &["mask-cells", "mask-tumor"],
    );

    let init_log = log.clone();
    let built = ExhibitBuilder::new(Arc::new(LoggingRenderState::new(log.clone())))
        .build(
            &ex,
            &viewer,
            Box::new(move |report: &BarrierReport| {
                init_log.push(format!("init:{}", report.loaded));
            }),
        )
        .unwrap();
    assert_eq!(built.barrier.total(), 4);

    headless.complete_all();

    assert_eq!(
        log.entries(),
        [
            "create-lens",
            "target:render-layer-main:main",
            "target:render-layer-lens:lens",
            "new-masks",
            "new-masks",
            "init:4",
        ]
    );
}

#[test]
fn test_failed_layer_degrades_report() {
    let (headless, viewer) = headless_pair();
    let ex = exhibit(&[image_json("a", 1000, 1000)], &[&["a"]], &["mask-cells"]);

    let built = ExhibitBuilder::new(Arc::new(HeadlessRenderState::new()))
        .with_failure_policy(FailurePolicy::CountAsLoaded)
        .build(&ex, &viewer, Box::new(|_| {}))
        .unwrap();

    headless.fail_layer(2, "HTTP 404");
    headless.complete_all();

    let report = built.barrier.report().unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.loaded, 2);
    assert_eq!(report.failed, 1);
    assert!(report.is_degraded());
    assert!(!report.timed_out);
}

#[test]
fn test_dropped_viewer_reports_pending_layers() {
    let (headless, viewer) = headless_pair();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();

    let built = ExhibitBuilder::new(Arc::new(HeadlessRenderState::new()))
        .build(
            &two_image_exhibit(),
            &viewer,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    headless.complete_layer(0);
    drop(viewer);
    drop(headless);

    let report = built.barrier.report().unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Overlays
// =============================================================================

#[test]
fn test_arrow_overlays_corrected_after_viewport_update() {
    let (headless, viewer) = headless_pair();
    ExhibitBuilder::new(Arc::new(HeadlessRenderState::new()))
        .build(&two_image_exhibit(), &viewer, Box::new(|_| {}))
        .unwrap();

    let arrow = Arc::new(OverlayElement::new("minerva-arrow-1", "arrow"));
    viewer.add_overlay(Overlay {
        element: arrow.clone(),
        location: Point::new(0.3, 0.4),
        placement: Placement::Center,
        check_resize: false,
    });

    viewer.zoom_to(1.5);
    headless.emit(ViewerEventKind::UpdateViewport);
    assert_eq!(arrow.transform(), "scale(1.5)");

    headless.tick();
    assert_eq!(arrow.transform(), "");

    // Titles keep the engine's transform
    let overlays = viewer.current_overlays();
    let title = overlays
        .iter()
        .find(|o| o.element.id().starts_with("minerva-title"))
        .unwrap();
    assert_eq!(title.element.transform(), "scale(1.5)");
}

// =============================================================================
// Sources
// =============================================================================

#[tokio::test]
async fn test_build_from_fetched_source() {
    let ex = two_image_exhibit();
    let fetcher =
        MockFetcher::new().with_body("https://exhibits.example/two.json", exhibit_bytes(&ex));
    let (headless, viewer) = headless_pair();

    let built = ExhibitBuilder::new(Arc::new(HeadlessRenderState::new()))
        .build_from_source(
            ExhibitSource::parse("https://exhibits.example/two.json"),
            &fetcher,
            &viewer,
            Box::new(|_| {}),
        )
        .await
        .unwrap();

    assert_eq!(fetcher.request_count(), 1);
    assert_eq!(built.display_name, "Test exhibit");
    headless.complete_all();
    assert!(built.barrier.wait().await.is_ok());
}

#[tokio::test]
async fn test_fetch_failure_builds_nothing() {
    let fetcher = MockFetcher::new();
    let (headless, viewer) = headless_pair();

    let result = ExhibitBuilder::new(Arc::new(HeadlessRenderState::new()))
        .build_from_source(
            ExhibitSource::parse("https://exhibits.example/missing.json"),
            &fetcher,
            &viewer,
            Box::new(|_| {}),
        )
        .await;

    assert!(result.is_err());
    assert!(headless.layers().is_empty());
}
