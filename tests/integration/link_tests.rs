//! Viewer linking integration tests.
//!
//! Tests verify:
//! - Two exhibits built into separate viewers follow each other after a handshake
//! - Each original event moves the follower exactly once, without echo
//! - A peer that never shows up surfaces as an error

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wsi_exhibit::error::LinkError;
use wsi_exhibit::exhibit::ExhibitBuilder;
use wsi_exhibit::linker::ViewerLinker;
use wsi_exhibit::viewer::{HeadlessRenderState, HeadlessViewer, Point, Viewer, ViewerEventKind};

use super::test_utils::two_image_exhibit;

fn built_viewer() -> Arc<dyn Viewer> {
    let viewer: Arc<dyn Viewer> = Arc::new(HeadlessViewer::new());
    ExhibitBuilder::new(Arc::new(HeadlessRenderState::new()))
        .build(&two_image_exhibit(), &viewer, Box::new(|_| {}))
        .unwrap();
    viewer
}

fn count(viewer: &Arc<dyn Viewer>, event: ViewerEventKind) -> Arc<AtomicUsize> {
    let counter = Arc::new(AtomicUsize::new(0));
    let c = counter.clone();
    viewer.add_handler(
        event,
        Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }),
    );
    counter
}

#[tokio::test]
async fn test_handshake_links_built_viewers() {
    let first = built_viewer();
    let (offer, pending) = ViewerLinker::handshake();

    // The second instance finishes loading later and offers its viewer
    let second = built_viewer();
    let peer = second.clone();
    let opener = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        offer.ready(peer)
    });

    let link = pending
        .link_timeout(&first, Duration::from_secs(5))
        .await
        .unwrap();
    opener.await.unwrap().unwrap();
    assert!(link.is_open());

    let first_zooms = count(&first, ViewerEventKind::Zoom);
    let second_zooms = count(&second, ViewerEventKind::Zoom);
    let second_pans = count(&second, ViewerEventKind::Pan);

    first.zoom_to(6.0);
    assert_eq!(second.zoom(), 6.0);
    assert_eq!(second.center(), first.center());
    assert_eq!(first_zooms.load(Ordering::SeqCst), 1);
    assert_eq!(second_zooms.load(Ordering::SeqCst), 1);
    assert_eq!(second_pans.load(Ordering::SeqCst), 1);

    second.pan_to(Point::new(0.25, 0.75));
    assert_eq!(first.center(), Point::new(0.25, 0.75));
    assert_eq!(first.zoom(), 6.0);
    // The relay back to the first viewer did not echo into the second
    assert_eq!(second_zooms.load(Ordering::SeqCst), 1);
    assert!(!link.is_relaying());
}

#[test]
fn test_many_events_never_echo() {
    let a = built_viewer();
    let b = built_viewer();
    let _link = ViewerLinker::link(&a, &b);
    let a_pans = count(&a, ViewerEventKind::Pan);
    let b_pans = count(&b, ViewerEventKind::Pan);

    for i in 0..10 {
        let p = Point::new(i as f64 / 10.0, 0.5);
        if i % 2 == 0 {
            a.pan_to(p);
        } else {
            b.pan_to(p);
        }
        assert_eq!(a.center(), p);
        assert_eq!(b.center(), p);
    }

    // Every pan is seen once by the viewer that moved and once by its peer
    assert_eq!(a_pans.load(Ordering::SeqCst), 10);
    assert_eq!(b_pans.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_peer_never_ready() {
    let first = built_viewer();
    let (offer, pending) = ViewerLinker::handshake();

    let result = pending
        .link_timeout(&first, Duration::from_millis(30))
        .await;
    assert_eq!(result.unwrap_err(), LinkError::TimedOut(30));

    // The opener learns that nobody is waiting anymore
    assert_eq!(offer.ready(built_viewer()), Err(LinkError::PeerClosed));
}
