//! Per-layer completion handles.
//!
//! Each registered layer carries exactly one [`LayerCompletion`]. Resolving
//! it consumes the handle, so a layer can report to the barrier at most
//! once; a handle dropped without being resolved reports a failure, so it
//! also reports at least once.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::barrier::LoadBarrier;
use crate::viewer::TiledImageHandle;

/// Work run when a layer loads, before the barrier is notified.
pub type SuccessHook = Box<dyn FnOnce(&TiledImageHandle) + Send>;

/// One-shot completion handle for a registered layer.
pub struct LayerCompletion {
    layer: String,
    barrier: Arc<LoadBarrier>,
    on_success: Option<SuccessHook>,
    resolved: bool,
}

impl LayerCompletion {
    pub fn new(layer: impl Into<String>, barrier: Arc<LoadBarrier>) -> Self {
        Self {
            layer: layer.into(),
            barrier,
            on_success: None,
            resolved: false,
        }
    }

    /// Run `hook` when the layer loads, before the barrier is notified.
    pub fn with_success_hook(mut self, hook: SuccessHook) -> Self {
        self.on_success = Some(hook);
        self
    }

    /// Name of the layer this handle belongs to.
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Report that the layer loaded, whether it was fetched or cached.
    ///
    /// A hook that panics leaves the handle unresolved, so the unwind
    /// reports the layer as failed.
    pub fn succeed(mut self, item: &TiledImageHandle) {
        debug!(layer = %self.layer, index = item.index, "Layer loaded");

        if let Some(hook) = self.on_success.take() {
            hook(item);
        }
        self.resolved = true;
        self.barrier.notify_loaded();
    }

    /// Report that the layer failed to load.
    pub fn fail(mut self, reason: &str) {
        self.resolved = true;
        self.barrier.notify_failed(&self.layer, reason);
    }
}

impl Drop for LayerCompletion {
    fn drop(&mut self) {
        if !self.resolved {
            warn!(layer = %self.layer, "Layer completion dropped without being resolved");
            self.barrier
                .notify_failed(&self.layer, "completion dropped unresolved");
        }
    }
}

impl fmt::Debug for LayerCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerCompletion")
            .field("layer", &self.layer)
            .field("has_hook", &self.on_success.is_some())
            .field("resolved", &self.resolved)
            .finish()
    }
}
