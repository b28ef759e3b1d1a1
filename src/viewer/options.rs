//! Engine options derived from an exhibit.

use serde::Serialize;

use crate::exhibit::Exhibit;
use crate::tile::CompositeOperation;

/// Channels rendered through the lens at once.
pub const MAX_LENS_CHANNELS: usize = 1;

/// Lower bound on the engine's tile cache.
const MIN_IMAGE_CACHE_COUNT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavigatorPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Scalebar settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalebarOptions {
    pub min_width: String,
    pub stay_inside_image: bool,
    pub pixels_per_meter: f64,
    pub background_color: String,
    pub font_color: String,
    pub color: String,
}

/// Options the rendering engine is created with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerOptions {
    pub max_image_cache_count: usize,
    pub composite_operation: CompositeOperation,
    pub navigator_position: NavigatorPosition,
    pub max_zoom_pixel_ratio: f64,
    pub visibility_ratio: f64,
    pub immediate_render: bool,
    pub degrees: f64,
    pub scalebar: ScalebarOptions,
}

impl ViewerOptions {
    /// Options for an exhibit on a renderer with `texture_units` texture slots.
    pub fn for_exhibit(exhibit: &Exhibit, texture_units: usize) -> Self {
        let per_lens = (texture_units as f64 / MAX_LENS_CHANNELS as f64).round() as usize;
        let mut options = Self {
            max_image_cache_count: per_lens.max(MIN_IMAGE_CACHE_COUNT),
            degrees: exhibit.rotation,
            ..Self::default()
        };
        options.scalebar.pixels_per_meter = exhibit.pixels_per_micron.unwrap_or(0.0) * 1_000_000.0;
        options
    }
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            max_image_cache_count: MIN_IMAGE_CACHE_COUNT,
            composite_operation: CompositeOperation::SourceOver,
            navigator_position: NavigatorPosition::BottomRight,
            max_zoom_pixel_ratio: 10.0,
            visibility_ratio: 0.9,
            immediate_render: false,
            degrees: 0.0,
            scalebar: ScalebarOptions {
                min_width: "100px".to_string(),
                stay_inside_image: false,
                pixels_per_meter: 0.0,
                background_color: "rgba(0, 0, 0, 0.8)".to_string(),
                font_color: "rgb(255, 255, 255)".to_string(),
                color: "rgb(255, 255, 255)".to_string(),
            },
        }
    }
}
