//! Arrow overlay position correction.
//!
//! The engine writes its own inline transform onto every overlay element to
//! keep it anchored during pan and zoom. Arrow annotations position and
//! rotate themselves, so after each viewport update (one tick later, once
//! the engine's layout pass is done) and on every animation frame the
//! engine's transform is cleared from them.

use std::sync::Arc;

use tracing::trace;

use crate::viewer::{Overlay, OverlayElement, Viewer, ViewerEventKind};

/// Id prefix identifying arrow annotations.
pub const ARROW_OVERLAY_PREFIX: &str = "minerva-arrow";

/// Class of the per-image title overlays.
pub const TITLE_OVERLAY_CLASS: &str = "minerva-overlay-title";

/// Clears the engine transform from arrow overlays.
#[derive(Debug, Clone)]
pub struct OverlayPositionCorrector {
    prefix: String,
}

impl OverlayPositionCorrector {
    pub fn new() -> Self {
        Self::with_prefix(ARROW_OVERLAY_PREFIX)
    }

    /// Corrector for overlays whose id starts with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn is_arrow(&self, element: &OverlayElement) -> bool {
        element.id().starts_with(&self.prefix)
    }

    /// Clear the transform of every arrow overlay. Returns the number of
    /// arrow overlays visited.
    pub fn correct(&self, overlays: &[Overlay]) -> usize {
        let mut corrected = 0;
        for overlay in overlays {
            if self.is_arrow(&overlay.element) {
                overlay.element.set_transform("");
                corrected += 1;
            }
        }
        corrected
    }

    /// Run the correction on `viewer` for as long as the viewer lives.
    pub fn install(self, viewer: &Arc<dyn Viewer>) {
        let corrector = Arc::new(self);

        let deferred = {
            let corrector = Arc::clone(&corrector);
            let viewer = Arc::downgrade(viewer);
            move |_: ViewerEventKind| {
                let Some(scheduler) = viewer.upgrade() else {
                    return;
                };
                let corrector = Arc::clone(&corrector);
                let viewer = viewer.clone();
                scheduler.defer(Box::new(move || {
                    if let Some(viewer) = viewer.upgrade() {
                        let n = corrector.correct(&viewer.current_overlays());
                        trace!(corrected = n, "Corrected arrow overlays after viewport update");
                    }
                }));
            }
        };

        let immediate = {
            let viewer = Arc::downgrade(viewer);
            move |_: ViewerEventKind| {
                if let Some(viewer) = viewer.upgrade() {
                    corrector.correct(&viewer.current_overlays());
                }
            }
        };

        viewer.add_handler(ViewerEventKind::UpdateViewport, Arc::new(deferred));
        viewer.add_handler(ViewerEventKind::Animation, Arc::new(immediate));
    }
}

impl Default for OverlayPositionCorrector {
    fn default() -> Self {
        Self::new()
    }
}
