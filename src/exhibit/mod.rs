//! Exhibits: configuration model, loading and assembly into a viewer.
//!
//! - [`Exhibit`]: the parsed exhibit document
//! - [`load_exhibit`]: resolve an [`ExhibitSource`] (value, file or URL)
//! - [`ExhibitBuilder`]: register an exhibit's layers and overlays with a
//!   viewer behind a [`LoadBarrier`](crate::barrier::LoadBarrier)
//! - [`LayoutReport`]: the same plan, computed without a viewer

mod builder;
mod loader;
mod model;

pub use builder::{BuiltExhibit, ExhibitBuilder, LayerPlan, LayoutReport};
pub use loader::{load_exhibit, ExhibitFetcher, ExhibitSource, HttpFetcher};
pub use model::{Exhibit, ImageDescriptor, Layout, MaskLayer, DEFAULT_MASK_FORMAT};
