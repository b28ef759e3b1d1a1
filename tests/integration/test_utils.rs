//! Test utilities for integration tests.
//!
//! This module provides a mock exhibit fetcher, a render state that logs
//! the order of its calls, and helpers for creating exhibit documents.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

use wsi_exhibit::error::ExhibitError;
use wsi_exhibit::exhibit::{Exhibit, ExhibitFetcher};
use wsi_exhibit::viewer::{RenderState, TiledImageHandle, Viewer};

// =============================================================================
// Mock Fetcher
// =============================================================================

/// A fetcher serving fixed bodies by URL and counting requests.
#[derive(Default)]
pub struct MockFetcher {
    bodies: HashMap<String, Bytes>,
    request_count: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: impl Into<Bytes>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExhibitFetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, ExhibitError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ExhibitError::Fetch {
                url: url.to_string(),
                message: "404 Not Found".to_string(),
            })
    }
}

// =============================================================================
// Call Log
// =============================================================================

/// Shared, ordered log of events observed during a test.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

/// A render state that writes every call to a [`CallLog`].
pub struct LoggingRenderState {
    log: CallLog,
}

impl LoggingRenderState {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl RenderState for LoggingRenderState {
    fn set_target_image(&self, item: &TiledImageHandle, is_lens: bool) {
        self.log
            .push(format!("target:{}:{}", item.layer, if is_lens { "lens" } else { "main" }));
    }

    fn new_masks(&self, _viewer: &dyn Viewer) {
        self.log.push("new-masks");
    }

    fn create_lens(&self, _viewer: &dyn Viewer) {
        self.log.push("create-lens");
    }
}

// =============================================================================
// Exhibit Fixtures
// =============================================================================

/// JSON for one image entry.
pub fn image_json(name: &str, width: u32, height: u32) -> String {
    format!(
        r#"{{"Name": "{name}", "Description": "Image {name}", "Path": "https://tiles.example/{name}",
            "Width": {width}, "Height": {height}, "MaxLevel": 4, "TileSize": [256, 256]}}"#
    )
}

/// Build an exhibit from image entries, a grid of names and mask paths.
pub fn exhibit(images: &[String], grid: &[&[&str]], masks: &[&str]) -> Exhibit {
    let grid_json: Vec<String> = grid
        .iter()
        .map(|row| {
            let names: Vec<String> = row.iter().map(|name| format!("\"{}\"", name)).collect();
            format!("[{}]", names.join(", "))
        })
        .collect();
    let masks_json: Vec<String> = masks
        .iter()
        .map(|path| format!(r#"{{"Name": "{path}", "Path": "{path}", "Colorize": true}}"#))
        .collect();

    let json = format!(
        r#"{{"Name": "Test exhibit", "Images": [{}], "Layout": {{"Grid": [{}]}}, "Masks": [{}]}}"#,
        images.join(", "),
        grid_json.join(", "),
        masks_json.join(", ")
    );
    Exhibit::from_slice(json.as_bytes()).unwrap()
}

/// Two equally sized images side by side, without masks.
pub fn two_image_exhibit() -> Exhibit {
    exhibit(
        &[image_json("a", 1000, 1000), image_json("b", 1000, 1000)],
        &[&["a", "b"]],
        &[],
    )
}

/// Serialize an exhibit back to JSON bytes.
pub fn exhibit_bytes(exhibit: &Exhibit) -> Bytes {
    Bytes::from(serde_json::to_vec(exhibit).unwrap())
}
