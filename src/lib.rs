//! # WSI Exhibit
//!
//! Layout and load synchronization for multi-channel whole slide image
//! exhibits.
//!
//! An exhibit arranges pyramidal images in a grid and overlays per-pixel
//! masks on them. This library computes where everything goes, builds the
//! tile layers a tiled-image viewer needs, and coordinates the moment all
//! of them have loaded.
//!
//! ## Architecture
//!
//! - [`geometry`] - grid shape and per-image display size in normalized units
//! - [`tile`] - tile-source descriptors for the main, lens and mask layers
//! - [`barrier`] - one-shot barrier fired once every layer has reported
//! - [`overlay`] - keeps arrow annotations free of the engine's transform
//! - [`linker`] - leader/follower pan-zoom relay between two viewers
//! - [`exhibit`] - exhibit model, loading and assembly into a viewer
//! - [`viewer`] - the viewer contract and an in-process headless viewer
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use wsi_exhibit::{Exhibit, ExhibitBuilder, HeadlessRenderState, HeadlessViewer, Viewer};
//!
//! let exhibit = Exhibit::from_slice(br#"{
//!     "Name": "Tonsil",
//!     "Images": [{"Name": "i0", "Description": "Tonsil", "Path": "https://tiles.example/tonsil",
//!                 "Width": 2048, "Height": 1024, "MaxLevel": 3, "TileSize": [256, 256]}]
//! }"#).unwrap();
//!
//! let headless = Arc::new(HeadlessViewer::new());
//! let viewer: Arc<dyn Viewer> = headless.clone();
//! let built = ExhibitBuilder::new(Arc::new(HeadlessRenderState::new()))
//!     .build(&exhibit, &viewer, Box::new(|report| println!("ready: {:?}", report)))
//!     .unwrap();
//!
//! headless.complete_all();
//! assert!(built.barrier.is_fired());
//! ```

pub mod barrier;
pub mod config;
pub mod error;
pub mod exhibit;
pub mod geometry;
pub mod linker;
pub mod overlay;
pub mod tile;
pub mod viewer;

// Re-export commonly used types
pub use barrier::{BarrierReport, BarrierState, FailurePolicy, Initializer, LoadBarrier};
pub use config::{Cli, Command, LayoutConfig, SimulateConfig};
pub use error::{BarrierError, ExhibitError, GridError, LinkError, TileSourceError};
pub use exhibit::{
    load_exhibit, BuiltExhibit, Exhibit, ExhibitBuilder, ExhibitFetcher, ExhibitSource,
    HttpFetcher, ImageDescriptor, LayoutReport, MaskLayer,
};
pub use geometry::{CellPlacement, Grid, GridShape, ImageShape, Point, SPACING_FRACTION};
pub use linker::{LinkState, LinkedPair, PendingLink, ViewerLinker, ViewerOffer};
pub use overlay::OverlayPositionCorrector;
pub use tile::{LayerCompletion, TileSourceDescriptor, TileSourceFactory, TiledImageSpec};
pub use viewer::{HeadlessRenderState, HeadlessViewer, RenderState, Viewer, ViewerEventKind};
