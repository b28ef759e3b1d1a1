//! Tile-source descriptors handed to the rendering engine.

use serde::Serialize;

use crate::error::TileSourceError;

use super::completion::LayerCompletion;
use super::url::TileUrlTemplate;

/// Name of the main base layer.
pub const MAIN_LAYER_NAME: &str = "render-layer-main";

/// Name of the lens base layer.
pub const LENS_LAYER_NAME: &str = "render-layer-lens";

/// Which kind of layer a descriptor describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerKind {
    Main,
    Lens,
    Mask { name: String },
}

impl LayerKind {
    /// Base layer kind for the main view or the lens.
    pub fn base(is_lens: bool) -> Self {
        if is_lens {
            LayerKind::Lens
        } else {
            LayerKind::Main
        }
    }

    pub fn is_lens(&self) -> bool {
        matches!(self, LayerKind::Lens)
    }

    pub fn is_mask(&self) -> bool {
        matches!(self, LayerKind::Mask { .. })
    }
}

/// How a layer is blended over the layers below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CompositeOperation {
    /// Standard alpha-over blending
    #[default]
    #[serde(rename = "source-over")]
    SourceOver,
}

impl CompositeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeOperation::SourceOver => "source-over",
        }
    }
}

/// How to fetch the tiles of one pyramid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileSourceDescriptor {
    pub tile_width: u32,
    pub tile_height: u32,

    /// Full-resolution size in pixels
    pub width: u32,
    pub height: u32,

    pub max_level: u32,

    /// Mask path, empty for base layers
    pub path: String,

    /// Pyramid name used in tile URLs
    pub name: String,

    pub urls: TileUrlTemplate,
    pub is_mask: bool,
    pub colorize: bool,
}

impl TileSourceDescriptor {
    /// URL of tile `(x, y)` at renderer level `level`.
    pub fn tile_url(&self, level: u32, x: u32, y: u32) -> Result<String, TileSourceError> {
        self.urls.tile_url(level, x, y)
    }
}

/// A tile layer ready to be added to the viewer.
///
/// The descriptor is built fresh for each layer and owned by the viewer
/// once added.
#[derive(Debug, Serialize)]
pub struct TiledImageSpec {
    pub tile_source: TileSourceDescriptor,
    pub kind: LayerKind,
    pub composite_operation: CompositeOperation,
    pub load_tiles_with_ajax: bool,
    pub x: f64,
    pub y: f64,
    pub opacity: f64,

    /// Display width in normalized viewer units
    pub width: f64,

    #[serde(skip)]
    completion: Option<LayerCompletion>,
}

impl TiledImageSpec {
    /// Place a tile source at the origin, fully opaque.
    pub fn new(
        tile_source: TileSourceDescriptor,
        kind: LayerKind,
        width: f64,
        completion: LayerCompletion,
    ) -> Self {
        Self {
            tile_source,
            kind,
            composite_operation: CompositeOperation::SourceOver,
            load_tiles_with_ajax: false,
            x: 0.0,
            y: 0.0,
            opacity: 1.0,
            width,
            completion: Some(completion),
        }
    }

    /// Layer name as registered with the viewer.
    pub fn layer_name(&self) -> &str {
        &self.tile_source.name
    }

    /// Take the completion handle. Returns `None` after the first call.
    pub fn take_completion(&mut self) -> Option<LayerCompletion> {
        self.completion.take()
    }
}
