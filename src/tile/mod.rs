//! Tile-source synthesis.
//!
//! This module turns exhibit images and masks into layers the rendering
//! engine can consume.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            ExhibitBuilder               │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          TileSourceFactory              │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ TileUrl      │  │ LayerCompletion │  │
//! │  │ Template     │  │ (one-shot →     │  │
//! │  │              │  │  LoadBarrier)   │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │ TiledImageSpec
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          Viewer (external)              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileSourceFactory`]: builds base (main/lens) and mask layers
//! - [`TileSourceDescriptor`]: tile geometry and URL template of one pyramid
//! - [`TiledImageSpec`]: a descriptor placed in the viewer with its completion handle
//! - [`LayerCompletion`]: reports a layer's load outcome to the barrier exactly once
//! - [`TileUrlTemplate`]: `{base}/{name}/{level}_{x}_{y}.{format}` URL generator
//!
//! # Example
//!
//! ```
//! use wsi_exhibit::tile::TileUrlTemplate;
//!
//! let urls = TileUrlTemplate::new("https://tiles.example/slide", "mask-cells", 5, Some("png"));
//! assert_eq!(
//!     urls.tile_url(5, 3, 4).unwrap(),
//!     "https://tiles.example/slide/mask-cells/0_3_4.png"
//! );
//! ```

mod completion;
mod descriptor;
mod factory;
mod url;

pub use completion::{LayerCompletion, SuccessHook};
pub use descriptor::{
    CompositeOperation, LayerKind, TileSourceDescriptor, TiledImageSpec, LENS_LAYER_NAME,
    MAIN_LAYER_NAME,
};
pub use factory::TileSourceFactory;
pub use url::{TileUrlTemplate, DEFAULT_TILE_FORMAT, PLACEHOLDER_BASE_PATH};
