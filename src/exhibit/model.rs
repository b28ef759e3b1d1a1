//! Exhibit configuration model.
//!
//! Exhibits are JSON documents with PascalCase keys:
//!
//! ```json
//! {
//!   "Name": "Tonsil",
//!   "Rotation": 0,
//!   "PixelsPerMicron": 1.5,
//!   "Images": [
//!     {
//!       "Name": "i0",
//!       "Description": "Tonsil section",
//!       "Path": "https://example.org/tonsil",
//!       "Width": 24000, "Height": 18000,
//!       "MaxLevel": 5,
//!       "TileSize": [1024, 1024]
//!     }
//!   ],
//!   "Layout": { "Grid": [["i0"]] },
//!   "Masks": [
//!     { "Name": "Cells", "Path": "mask-cells", "Format": "png", "Colorize": true }
//!   ]
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ExhibitError;
use crate::geometry::Grid;

/// Default image format for mask tiles.
pub const DEFAULT_MASK_FORMAT: &str = "png";

/// One pyramidal image of an exhibit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageDescriptor {
    /// Identifier referenced by the layout grid
    #[serde(default)]
    pub name: String,

    /// Human-readable title
    #[serde(default)]
    pub description: String,

    /// Base path or URL of the image's tile pyramid
    pub path: String,

    /// Full-resolution width in pixels
    pub width: u32,

    /// Full-resolution height in pixels
    pub height: u32,

    /// Highest pyramid level (full resolution)
    pub max_level: u32,

    /// Tile `[width, height]` in pixels
    pub tile_size: Vec<u32>,
}

/// An auxiliary per-pixel data layer (e.g. segmentation masks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MaskLayer {
    #[serde(default)]
    pub name: String,

    /// Tile pyramid name, relative to the image path
    pub path: String,

    /// Tile image format
    #[serde(default = "default_mask_format")]
    pub format: String,

    /// Whether the renderer should colorize the mask
    #[serde(default)]
    pub colorize: bool,
}

fn default_mask_format() -> String {
    DEFAULT_MASK_FORMAT.to_string()
}

/// Image arrangement, as grid rows of image names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Layout {
    #[serde(default)]
    pub grid: Vec<Vec<String>>,
}

/// Top-level exhibit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Exhibit {
    #[serde(default)]
    pub name: String,

    /// Viewer rotation in degrees
    #[serde(default)]
    pub rotation: f64,

    /// Physical resolution, used for the scalebar
    #[serde(default)]
    pub pixels_per_micron: Option<f64>,

    pub images: Vec<ImageDescriptor>,

    #[serde(default)]
    pub layout: Layout,

    #[serde(default)]
    pub masks: Vec<MaskLayer>,
}

impl Exhibit {
    /// Parse an exhibit from JSON bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, ExhibitError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Resolve the layout's image names into a validated [`Grid`].
    ///
    /// An exhibit without a layout grid shows its first image alone.
    pub fn resolve_grid(&self) -> Result<Grid, ExhibitError> {
        if self.layout.grid.is_empty() {
            let rows = match self.images.first() {
                Some(image) => vec![vec![image.clone()]],
                None => Vec::new(),
            };
            return Ok(Grid::new(rows)?);
        }

        let by_name: HashMap<&str, &ImageDescriptor> = self
            .images
            .iter()
            .map(|image| (image.name.as_str(), image))
            .collect();

        let rows = self
            .layout
            .grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|name| {
                        by_name
                            .get(name.as_str())
                            .map(|image| (*image).clone())
                            .ok_or_else(|| ExhibitError::UnknownImage(name.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Grid::new(rows)?)
    }

    /// Title shown for the exhibit: the image description when there is a
    /// single image, the exhibit name otherwise.
    pub fn display_name(&self) -> &str {
        match self.images.as_slice() {
            [only] => &only.description,
            _ => &self.name,
        }
    }
}
