//! In-process viewer.
//!
//! [`HeadlessViewer`] models the parts of a tiled-image engine the exhibit
//! core observes: registered layers and their pending completions,
//! overlays, event dispatch, a deferred-task queue drained by [`tick`], and
//! viewport pan/zoom.
//!
//! Viewport setters dispatch their event synchronously, like the browser
//! engine does, so relays between two headless viewers exercise the same
//! re-entrancy as the real thing.
//!
//! [`tick`]: HeadlessViewer::tick

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::tile::{LayerCompletion, TiledImageSpec};

use super::options::ViewerOptions;
use super::{
    DeferredTask, EventHandler, Overlay, Point, RenderState, TiledImageHandle, Viewer,
    ViewerEventKind,
};

/// Load status of a registered layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerStatus {
    Pending,
    Loaded,
    Failed,
}

struct LayerRecord {
    handle: TiledImageHandle,
    spec: TiledImageSpec,
    completion: Option<LayerCompletion>,
    status: LayerStatus,
}

struct Inner {
    zoom: f64,
    center: Point,
    layers: Vec<LayerRecord>,
    overlays: Vec<Overlay>,
    handlers: Vec<(ViewerEventKind, EventHandler)>,
    deferred: VecDeque<DeferredTask>,
}

/// A viewer that renders nothing and records everything.
pub struct HeadlessViewer {
    options: ViewerOptions,
    inner: Mutex<Inner>,
}

impl HeadlessViewer {
    pub fn new() -> Self {
        Self::with_options(ViewerOptions::default())
    }

    pub fn with_options(options: ViewerOptions) -> Self {
        Self {
            options,
            inner: Mutex::new(Inner {
                zoom: 1.0,
                center: Point::new(0.5, 0.5),
                layers: Vec::new(),
                overlays: Vec::new(),
                handlers: Vec::new(),
                deferred: VecDeque::new(),
            }),
        }
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handles of all registered layers, in registration order.
    pub fn layers(&self) -> Vec<TiledImageHandle> {
        self.lock().layers.iter().map(|l| l.handle.clone()).collect()
    }

    /// Load status of layer `index`.
    pub fn layer_status(&self, index: usize) -> Option<LayerStatus> {
        self.lock().layers.get(index).map(|l| l.status)
    }

    /// Run `f` against the descriptor of layer `index`.
    pub fn with_layer<T>(&self, index: usize, f: impl FnOnce(&TiledImageSpec) -> T) -> Option<T> {
        self.lock().layers.get(index).map(|l| f(&l.spec))
    }

    /// Layers whose completion has not been resolved yet.
    pub fn pending_layers(&self) -> Vec<TiledImageHandle> {
        self.lock()
            .layers
            .iter()
            .filter(|l| l.status == LayerStatus::Pending)
            .map(|l| l.handle.clone())
            .collect()
    }

    /// Mark layer `index` as loaded. Returns `false` if it was already
    /// resolved or does not exist.
    pub fn complete_layer(&self, index: usize) -> bool {
        match self.take_completion(index, LayerStatus::Loaded) {
            Some((handle, completion)) => {
                completion.succeed(&handle);
                true
            }
            None => false,
        }
    }

    /// Mark layer `index` as failed. Returns `false` if it was already
    /// resolved or does not exist.
    pub fn fail_layer(&self, index: usize, reason: &str) -> bool {
        match self.take_completion(index, LayerStatus::Failed) {
            Some((_, completion)) => {
                completion.fail(reason);
                true
            }
            None => false,
        }
    }

    /// Mark every pending layer as loaded. Returns how many were resolved.
    pub fn complete_all(&self) -> usize {
        self.pending_layers()
            .into_iter()
            .filter(|handle| self.complete_layer(handle.index))
            .count()
    }

    fn take_completion(
        &self,
        index: usize,
        status: LayerStatus,
    ) -> Option<(TiledImageHandle, LayerCompletion)> {
        let mut inner = self.lock();
        let record = inner.layers.get_mut(index)?;
        let completion = record.completion.take()?;
        record.status = status;
        Some((record.handle.clone(), completion))
    }

    /// Dispatch `event` to its handlers.
    ///
    /// Viewport updates and animation frames first re-apply the engine's own
    /// transform to every overlay, the way the engine repositions overlay
    /// elements during pan and zoom.
    pub fn emit(&self, event: ViewerEventKind) {
        let handlers: Vec<EventHandler> = {
            let inner = self.lock();
            if matches!(
                event,
                ViewerEventKind::UpdateViewport | ViewerEventKind::Animation
            ) {
                let transform = format!("scale({})", inner.zoom);
                for overlay in &inner.overlays {
                    overlay.element.set_transform(transform.clone());
                }
            }
            inner
                .handlers
                .iter()
                .filter(|(kind, _)| *kind == event)
                .map(|(_, handler)| handler.clone())
                .collect()
        };

        trace!(?event, handlers = handlers.len(), "Dispatching viewer event");
        for handler in handlers {
            handler(event);
        }
    }

    /// Run the tasks deferred before this tick. Tasks deferred while the
    /// tick runs wait for the next one. Returns the number of tasks run.
    pub fn tick(&self) -> usize {
        let tasks: Vec<DeferredTask> = self.lock().deferred.drain(..).collect();
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }

    /// Number of tasks waiting for the next tick.
    pub fn pending_tasks(&self) -> usize {
        self.lock().deferred.len()
    }
}

impl Default for HeadlessViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewer for HeadlessViewer {
    fn add_tiled_image(&self, mut spec: TiledImageSpec) -> TiledImageHandle {
        let completion = spec.take_completion();
        let mut inner = self.lock();
        let handle = TiledImageHandle {
            index: inner.layers.len(),
            layer: spec.layer_name().to_string(),
        };
        debug!(layer = %handle.layer, index = handle.index, "Added tiled image");
        inner.layers.push(LayerRecord {
            handle: handle.clone(),
            spec,
            completion,
            status: LayerStatus::Pending,
        });
        handle
    }

    fn add_overlay(&self, overlay: Overlay) {
        self.lock().overlays.push(overlay);
    }

    fn current_overlays(&self) -> Vec<Overlay> {
        self.lock().overlays.clone()
    }

    fn add_handler(&self, event: ViewerEventKind, handler: EventHandler) {
        self.lock().handlers.push((event, handler));
    }

    fn defer(&self, task: DeferredTask) {
        self.lock().deferred.push_back(task);
    }

    fn zoom(&self) -> f64 {
        self.lock().zoom
    }

    fn zoom_to(&self, zoom: f64) {
        self.lock().zoom = zoom;
        self.emit(ViewerEventKind::Zoom);
    }

    fn center(&self) -> Point {
        self.lock().center
    }

    fn pan_to(&self, center: Point) {
        self.lock().center = center;
        self.emit(ViewerEventKind::Pan);
    }
}

/// Render state that records the calls it receives.
#[derive(Default)]
pub struct HeadlessRenderState {
    targets: Mutex<Vec<(TiledImageHandle, bool)>>,
    mask_refreshes: Mutex<usize>,
    lenses: Mutex<usize>,
}

impl HeadlessRenderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target images assigned so far, with their lens flag.
    pub fn targets(&self) -> Vec<(TiledImageHandle, bool)> {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn mask_refreshes(&self) -> usize {
        *self
            .mask_refreshes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lenses_created(&self) -> usize {
        *self.lenses.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RenderState for HeadlessRenderState {
    fn set_target_image(&self, item: &TiledImageHandle, is_lens: bool) {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((item.clone(), is_lens));
    }

    fn new_masks(&self, _viewer: &dyn Viewer) {
        *self
            .mask_refreshes
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn create_lens(&self, _viewer: &dyn Viewer) {
        *self.lenses.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }
}
