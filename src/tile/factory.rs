//! Tile-source factory.
//!
//! Builds the layers of an exhibit:
//!
//! - two base layers (`render-layer-main`, `render-layer-lens`) whose URLs
//!   point at a placeholder target until the render state binds them to a
//!   real image
//! - one layer per mask, addressed directly through the image path
//!
//! Every layer is sized from the grid's display geometry and carries a
//! completion handle wired to the shared [`LoadBarrier`].

use std::sync::Arc;

use tracing::debug;

use crate::barrier::LoadBarrier;
use crate::error::TileSourceError;
use crate::exhibit::{ImageDescriptor, MaskLayer};
use crate::geometry::{GridShape, ImageShape};
use crate::viewer::{RenderState, Viewer};

use super::completion::LayerCompletion;
use super::descriptor::{
    LayerKind, TileSourceDescriptor, TiledImageSpec, LENS_LAYER_NAME, MAIN_LAYER_NAME,
};
use super::url::{TileUrlTemplate, DEFAULT_TILE_FORMAT};

/// Builds tile layers bound to a render-state provider.
pub struct TileSourceFactory {
    render_state: Arc<dyn RenderState>,
}

impl TileSourceFactory {
    pub fn new(render_state: Arc<dyn RenderState>) -> Self {
        Self { render_state }
    }

    /// Split an image's `TileSize` into `(width, height)`.
    ///
    /// `TileSize` must hold exactly two non-zero entries.
    pub fn tile_dimensions(image: &ImageDescriptor) -> Result<(u32, u32), TileSourceError> {
        match image.tile_size.as_slice() {
            [0, _] | [_, 0] => Err(TileSourceError::ZeroTileSize {
                image: image.name.clone(),
            }),
            [width, height] => Ok((*width, *height)),
            other => Err(TileSourceError::InvalidTileSize {
                image: image.name.clone(),
                len: other.len(),
            }),
        }
    }

    /// Tile source for a base layer, pointing at the placeholder target.
    pub fn image_source(
        image: &ImageDescriptor,
        is_lens: bool,
    ) -> Result<TileSourceDescriptor, TileSourceError> {
        let (tile_width, tile_height) = Self::tile_dimensions(image)?;
        let name = if is_lens {
            LENS_LAYER_NAME
        } else {
            MAIN_LAYER_NAME
        };

        Ok(TileSourceDescriptor {
            tile_width,
            tile_height,
            width: image.width,
            height: image.height,
            max_level: image.max_level,
            path: String::new(),
            name: name.to_string(),
            urls: TileUrlTemplate::placeholder(name, image.max_level, Some(DEFAULT_TILE_FORMAT)),
            is_mask: false,
            colorize: true,
        })
    }

    /// Tile source for a mask, addressed under the image's path.
    pub fn mask_source(
        image: &ImageDescriptor,
        mask: &MaskLayer,
    ) -> Result<TileSourceDescriptor, TileSourceError> {
        let (tile_width, tile_height) = Self::tile_dimensions(image)?;

        Ok(TileSourceDescriptor {
            tile_width,
            tile_height,
            width: image.width,
            height: image.height,
            max_level: image.max_level,
            path: mask.path.clone(),
            name: mask.path.clone(),
            urls: TileUrlTemplate::new(
                image.path.clone(),
                mask.path.clone(),
                image.max_level,
                Some(&mask.format),
            ),
            is_mask: true,
            colorize: mask.colorize,
        })
    }

    /// Build a base layer. On load, the render state binds it to its image.
    pub fn image_layer(
        &self,
        image: &ImageDescriptor,
        shape: &GridShape,
        is_lens: bool,
        barrier: &Arc<LoadBarrier>,
    ) -> Result<TiledImageSpec, TileSourceError> {
        let source = Self::image_source(image, is_lens)?;
        let width = ImageShape::compute(image, shape).display_width;

        let render_state = Arc::clone(&self.render_state);
        let completion = LayerCompletion::new(source.name.clone(), Arc::clone(barrier))
            .with_success_hook(Box::new(move |item| {
                render_state.set_target_image(item, is_lens);
            }));

        debug!(layer = %source.name, width, "Built base layer");
        Ok(TiledImageSpec::new(
            source,
            LayerKind::base(is_lens),
            width,
            completion,
        ))
    }

    /// Build a mask layer. On load, the render state refreshes its masks
    /// before the barrier is notified.
    pub fn mask_layer(
        &self,
        image: &ImageDescriptor,
        shape: &GridShape,
        mask: &MaskLayer,
        viewer: &Arc<dyn Viewer>,
        barrier: &Arc<LoadBarrier>,
    ) -> Result<TiledImageSpec, TileSourceError> {
        let source = Self::mask_source(image, mask)?;
        let width = ImageShape::compute(image, shape).display_width;

        let render_state = Arc::clone(&self.render_state);
        let viewer = Arc::downgrade(viewer);
        let completion = LayerCompletion::new(source.name.clone(), Arc::clone(barrier))
            .with_success_hook(Box::new(move |_| {
                if let Some(viewer) = viewer.upgrade() {
                    render_state.new_masks(viewer.as_ref());
                }
            }));

        debug!(layer = %source.name, mask = %mask.name, "Built mask layer");
        Ok(TiledImageSpec::new(
            source,
            LayerKind::Mask {
                name: mask.name.clone(),
            },
            width,
            completion,
        ))
    }
}
