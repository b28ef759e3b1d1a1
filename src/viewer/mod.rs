//! Viewer abstraction.
//!
//! The tiled-image rendering engine is an external collaborator. This module
//! describes the contract the exhibit core relies on:
//!
//! - [`Viewer`]: layer registration, overlays, event subscription, deferred
//!   tasks and the viewport's pan/zoom accessors
//! - [`RenderState`]: the channel/render-state provider that binds
//!   placeholder layers to real images and refreshes mask state
//!
//! [`HeadlessViewer`] is an in-process implementation used by the CLI and
//! the test-suite.

mod headless;
mod options;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

pub use crate::geometry::Point;
use crate::tile::TiledImageSpec;

pub use headless::{HeadlessRenderState, HeadlessViewer, LayerStatus};
pub use options::{NavigatorPosition, ScalebarOptions, ViewerOptions, MAX_LENS_CHANNELS};

// =============================================================================
// Events
// =============================================================================

/// Viewer events the exhibit core subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerEventKind {
    Zoom,
    Pan,
    /// Emitted after the engine recomputed the viewport
    UpdateViewport,
    /// Emitted on every animation frame
    Animation,
}

/// Callback registered with [`Viewer::add_handler`].
pub type EventHandler = Arc<dyn Fn(ViewerEventKind) + Send + Sync>;

/// Work scheduled to run on the viewer's next tick.
pub type DeferredTask = Box<dyn FnOnce() + Send>;

// =============================================================================
// Tiled Images
// =============================================================================

/// Handle for a layer added to the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TiledImageHandle {
    /// Position of the layer in the viewer's world
    pub index: usize,

    /// Layer name (e.g. `render-layer-main`)
    pub layer: String,
}

// =============================================================================
// Overlays
// =============================================================================

/// Where an overlay element sits relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Placement {
    Center,
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

/// A DOM-like element displayed on top of the image.
pub struct OverlayElement {
    id: String,
    class: String,
    text: String,
    transform: Mutex<String>,
}

impl OverlayElement {
    pub fn new(id: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
            text: String::new(),
            transform: Mutex::new(String::new()),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current inline transform style.
    pub fn transform(&self) -> String {
        self.transform
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_transform(&self, transform: impl Into<String>) {
        *self.transform.lock().unwrap_or_else(PoisonError::into_inner) = transform.into();
    }
}

impl fmt::Debug for OverlayElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayElement")
            .field("id", &self.id)
            .field("class", &self.class)
            .field("text", &self.text)
            .field("transform", &self.transform())
            .finish()
    }
}

/// An overlay registered with the viewer.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub element: Arc<OverlayElement>,
    pub location: Point,
    pub placement: Placement,
    pub check_resize: bool,
}

// =============================================================================
// Collaborator Traits
// =============================================================================

/// The tiled-image rendering engine.
///
/// Implementations must not hold internal locks while invoking handlers or
/// deferred tasks: handlers routinely call back into the viewer (and into
/// other viewers), e.g. a pan/zoom relay reading this viewer's zoom while
/// it is dispatching a zoom event.
pub trait Viewer: Send + Sync {
    /// Register a tile layer. The viewer owns the descriptor from now on and
    /// must resolve its completion handle exactly once.
    fn add_tiled_image(&self, spec: TiledImageSpec) -> TiledImageHandle;

    fn add_overlay(&self, overlay: Overlay);

    /// Overlays currently registered.
    fn current_overlays(&self) -> Vec<Overlay>;

    fn add_handler(&self, event: ViewerEventKind, handler: EventHandler);

    /// Run `task` on the next tick, after the current layout pass.
    fn defer(&self, task: DeferredTask);

    fn zoom(&self) -> f64;

    fn zoom_to(&self, zoom: f64);

    fn center(&self) -> Point;

    fn pan_to(&self, center: Point);
}

/// The channel/render-state provider.
pub trait RenderState: Send + Sync {
    /// Bind a placeholder base layer to the image it should render.
    fn set_target_image(&self, item: &TiledImageHandle, is_lens: bool);

    /// Refresh mask state after a mask layer finished loading.
    fn new_masks(&self, viewer: &dyn Viewer);

    /// Create the lens once both base layers are registered.
    fn create_lens(&self, _viewer: &dyn Viewer) {}
}
