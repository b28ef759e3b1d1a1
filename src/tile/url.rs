//! Tile URL construction.
//!
//! Tile pyramids are addressed as
//! `{base}/{name}/{max_level - level}_{x}_{y}.{format}`: the renderer counts
//! levels from the lowest resolution upwards, while pyramids on disk are
//! numbered from full resolution downwards.

use serde::Serialize;

use crate::error::TileSourceError;

/// Base path used by layers that have not been assigned a real image yet.
pub const PLACEHOLDER_BASE_PATH: &str = "target";

/// Tile format used when none is given.
pub const DEFAULT_TILE_FORMAT: &str = "jpg";

/// URL generator for the tiles of one pyramid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileUrlTemplate {
    base_path: String,
    name: String,
    max_level: u32,
    format: String,
}

impl TileUrlTemplate {
    /// Create a template for a pyramid named `name` under `base_path`.
    pub fn new(
        base_path: impl Into<String>,
        name: impl Into<String>,
        max_level: u32,
        format: Option<&str>,
    ) -> Self {
        let format = match format {
            Some(f) if !f.is_empty() => f.trim_start_matches('.').to_string(),
            _ => DEFAULT_TILE_FORMAT.to_string(),
        };
        Self {
            base_path: base_path.into(),
            name: name.into(),
            max_level,
            format,
        }
    }

    /// Create a template pointing at the placeholder target.
    pub fn placeholder(name: impl Into<String>, max_level: u32, format: Option<&str>) -> Self {
        Self::new(PLACEHOLDER_BASE_PATH, name, max_level, format)
    }

    /// Whether this template still points at the placeholder target.
    pub fn is_placeholder(&self) -> bool {
        self.base_path == PLACEHOLDER_BASE_PATH
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Build the URL of tile `(x, y)` at renderer level `level`.
    pub fn tile_url(&self, level: u32, x: u32, y: u32) -> Result<String, TileSourceError> {
        if level > self.max_level {
            return Err(TileSourceError::LevelOutOfRange {
                level,
                max_level: self.max_level,
            });
        }

        let pyramid_level = self.max_level - level;
        let name = encode_path(&self.name);
        let file = format!("{}_{}_{}.{}", pyramid_level, x, y, self.format);

        let base = self.base_path.trim_end_matches('/');
        if base.is_empty() {
            Ok(format!("{}/{}", name, file))
        } else {
            Ok(format!("{}/{}/{}", base, name, file))
        }
    }
}

/// Percent-encode each segment of a relative path, keeping separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
