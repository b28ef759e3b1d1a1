//! Exhibit assembly.
//!
//! [`ExhibitBuilder`] drives one exhibit into a viewer:
//!
//! 1. resolve the layout grid and compute its shape
//! 2. create the load barrier for `2 + masks` layers
//! 3. install the arrow overlay corrector
//! 4. add a title overlay per grid cell and pan to the grid's home center
//! 5. register the main and lens layers, then create the lens
//! 6. register one layer per mask
//!
//! Layers go last: a layer served from cache may complete while it is being
//! registered, and the initializer must then see the finished layout.
//!
//! All fallible checks run before the first layer is registered, so a
//! rejected exhibit leaves the viewer untouched.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::barrier::{FailurePolicy, Initializer, LoadBarrier, BASE_LAYER_COUNT};
use crate::error::ExhibitError;
use crate::geometry::{CellPlacement, Grid, GridShape, ImageShape, Point};
use crate::overlay::{OverlayPositionCorrector, TITLE_OVERLAY_CLASS};
use crate::tile::{LayerKind, TileSourceDescriptor, TileSourceFactory};
use crate::viewer::{
    Overlay, OverlayElement, Placement, RenderState, TiledImageHandle, Viewer, ViewerOptions,
};

use super::loader::{load_exhibit, ExhibitFetcher, ExhibitSource};
use super::model::Exhibit;

/// Builds exhibits into viewers.
pub struct ExhibitBuilder {
    render_state: Arc<dyn RenderState>,
    factory: TileSourceFactory,
    policy: FailurePolicy,
    barrier_timeout: Option<Duration>,
}

impl ExhibitBuilder {
    pub fn new(render_state: Arc<dyn RenderState>) -> Self {
        Self {
            factory: TileSourceFactory::new(Arc::clone(&render_state)),
            render_state,
            policy: FailurePolicy::default(),
            barrier_timeout: None,
        }
    }

    /// Set how failed layer loads are counted by the barrier.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Release the barrier in degraded mode if layers are still loading
    /// after `timeout`. Only takes effect inside a Tokio runtime.
    pub fn with_barrier_timeout(mut self, timeout: Duration) -> Self {
        self.barrier_timeout = Some(timeout);
        self
    }

    /// Register `exhibit`'s layers and overlays with `viewer`.
    ///
    /// `initializer` runs once every layer has reported its completion.
    pub fn build(
        &self,
        exhibit: &Exhibit,
        viewer: &Arc<dyn Viewer>,
        initializer: Initializer,
    ) -> Result<BuiltExhibit, ExhibitError> {
        let grid = exhibit.resolve_grid()?;
        let shape = GridShape::compute(&grid);
        let image = grid.first().clone();
        TileSourceFactory::tile_dimensions(&image)?;

        let barrier = Arc::new(
            LoadBarrier::for_layers(exhibit.masks.len(), initializer)?.with_policy(self.policy),
        );

        // A cached layer may resolve inside `add_tiled_image`, so the
        // viewport and titles are in place before the first layer.
        OverlayPositionCorrector::new().install(viewer);

        let placements = shape.arrange(&grid);
        for placement in &placements {
            viewer.add_overlay(title_overlay(placement));
        }
        viewer.pan_to(shape.home_center());

        let mut layers = Vec::with_capacity(barrier.total());
        for is_lens in [false, true] {
            let spec = self.factory.image_layer(&image, &shape, is_lens, &barrier)?;
            layers.push(viewer.add_tiled_image(spec));
        }
        self.render_state.create_lens(viewer.as_ref());

        for mask in &exhibit.masks {
            let spec = self
                .factory
                .mask_layer(&image, &shape, mask, viewer, &barrier)?;
            layers.push(viewer.add_tiled_image(spec));
        }

        if let Some(timeout) = self.barrier_timeout {
            if tokio::runtime::Handle::try_current().is_ok() {
                barrier.arm_timeout(timeout);
            } else {
                warn!("No async runtime available, barrier timeout not armed");
            }
        }

        info!(
            rows = shape.num_rows,
            columns = shape.num_columns,
            layers = layers.len(),
            "Built exhibit '{}'",
            exhibit.display_name()
        );

        Ok(BuiltExhibit {
            display_name: exhibit.display_name().to_string(),
            grid,
            shape,
            placements,
            barrier,
            layers,
        })
    }

    /// Load an exhibit from `source` and build it into `viewer`.
    pub async fn build_from_source(
        &self,
        source: ExhibitSource,
        fetcher: &dyn ExhibitFetcher,
        viewer: &Arc<dyn Viewer>,
        initializer: Initializer,
    ) -> Result<BuiltExhibit, ExhibitError> {
        let exhibit = load_exhibit(source, fetcher).await?;
        self.build(&exhibit, viewer, initializer)
    }
}

fn title_overlay(placement: &CellPlacement) -> Overlay {
    let element = OverlayElement::new(
        format!("minerva-title-{}-{}", placement.row, placement.column),
        TITLE_OVERLAY_CLASS,
    )
    .with_text(placement.title.clone());

    Overlay {
        element: Arc::new(element),
        location: placement.title_anchor(),
        placement: Placement::Bottom,
        check_resize: false,
    }
}

/// An exhibit registered with a viewer.
#[derive(Debug)]
pub struct BuiltExhibit {
    /// Title shown for the exhibit
    pub display_name: String,
    pub grid: Grid,
    pub shape: GridShape,
    pub placements: Vec<CellPlacement>,

    /// Barrier gating the downstream initializer
    pub barrier: Arc<LoadBarrier>,

    /// Registered layers: main, lens, then one per mask
    pub layers: Vec<TiledImageHandle>,
}

// =============================================================================
// Layout Report
// =============================================================================

/// Planned layer, as reported by [`LayoutReport`].
#[derive(Debug, Clone, Serialize)]
pub struct LayerPlan {
    pub kind: LayerKind,
    pub tile_source: TileSourceDescriptor,
    pub display_width: f64,

    /// URL of the top-left tile at full resolution
    pub first_tile_url: String,
}

/// Everything the builder would register, without a viewer.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutReport {
    pub name: String,
    pub shape: GridShape,
    pub aspect_ratio: f64,
    pub home_center: Point,
    pub placements: Vec<CellPlacement>,
    pub layers: Vec<LayerPlan>,
    pub barrier_total: usize,
    pub viewer: ViewerOptions,
}

impl LayoutReport {
    /// Plan the layout of `exhibit` on a renderer with `texture_units`
    /// texture slots.
    pub fn plan(exhibit: &Exhibit, texture_units: usize) -> Result<Self, ExhibitError> {
        let grid = exhibit.resolve_grid()?;
        let shape = GridShape::compute(&grid);
        let image = grid.first();
        let display_width = ImageShape::compute(image, &shape).display_width;

        let mut layers = Vec::with_capacity(BASE_LAYER_COUNT + exhibit.masks.len());
        for is_lens in [false, true] {
            let source = TileSourceFactory::image_source(image, is_lens)?;
            layers.push(LayerPlan::new(LayerKind::base(is_lens), source, display_width)?);
        }
        for mask in &exhibit.masks {
            let source = TileSourceFactory::mask_source(image, mask)?;
            let kind = LayerKind::Mask {
                name: mask.name.clone(),
            };
            layers.push(LayerPlan::new(kind, source, display_width)?);
        }
        debug!(layers = layers.len(), "Planned exhibit layout");

        Ok(Self {
            name: exhibit.display_name().to_string(),
            aspect_ratio: shape.aspect_ratio(),
            home_center: shape.home_center(),
            placements: shape.arrange(&grid),
            barrier_total: layers.len(),
            layers,
            shape,
            viewer: ViewerOptions::for_exhibit(exhibit, texture_units),
        })
    }
}

impl LayerPlan {
    fn new(
        kind: LayerKind,
        tile_source: TileSourceDescriptor,
        display_width: f64,
    ) -> Result<Self, ExhibitError> {
        let first_tile_url = tile_source.tile_url(tile_source.max_level, 0, 0)?;
        Ok(Self {
            kind,
            tile_source,
            display_width,
            first_tile_url,
        })
    }
}
