//! Grid and image geometry in normalized viewer units.
//!
//! An exhibit arranges its images in a rectangular grid. The whole grid is
//! laid out in a coordinate space whose height is normalized to 1: rows are
//! stacked top to bottom and separated by a fixed gap of
//! [`SPACING_FRACTION`] units.
//!
//! ```text
//!  y = 0      ┌──────────┐     ┌──────────┐
//!             │  (0, 0)  │ gap │  (0, 1)  │      cell_height
//!             └──────────┘     └──────────┘
//!                  gap
//!             ┌──────────┐     ┌──────────┐
//!             │  (1, 0)  │     │  (1, 1)  │
//!  y = 1      └──────────┘     └──────────┘
//! ```
//!
//! Every function here is pure: identical inputs always produce identical
//! shapes.

use serde::Serialize;

use crate::error::GridError;
use crate::exhibit::ImageDescriptor;

/// Gap between grid cells as a fraction of the normalized unit height.
pub const SPACING_FRACTION: f64 = 0.05;

// =============================================================================
// Point
// =============================================================================

/// A point in normalized viewer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// Grid
// =============================================================================

/// A validated, rectangular, row-major arrangement of images.
///
/// Construction rejects empty grids, empty rows, ragged rows and images with
/// a zero width or height, so every `Grid` can be handed to
/// [`GridShape::compute`] without further checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<ImageDescriptor>>,
}

impl Grid {
    /// Validate and wrap a row-major list of images.
    pub fn new(rows: Vec<Vec<ImageDescriptor>>) -> Result<Self, GridError> {
        let expected = match rows.first() {
            Some(first) => first.len(),
            None => return Err(GridError::Empty),
        };

        for (row, images) in rows.iter().enumerate() {
            if images.is_empty() {
                return Err(GridError::EmptyRow { row });
            }
            if images.len() != expected {
                return Err(GridError::Ragged {
                    row,
                    expected,
                    actual: images.len(),
                });
            }
            for image in images {
                if image.width == 0 || image.height == 0 {
                    return Err(GridError::ZeroDimension {
                        name: image.name.clone(),
                        width: image.width,
                        height: image.height,
                    });
                }
            }
        }

        Ok(Self { rows })
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (identical for every row).
    pub fn num_columns(&self) -> usize {
        self.rows[0].len()
    }

    /// The image at `(row, column)`, if in range.
    pub fn get(&self, row: usize, column: usize) -> Option<&ImageDescriptor> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// The top-left image. Base layers are sized from this image.
    pub fn first(&self) -> &ImageDescriptor {
        &self.rows[0][0]
    }

    /// Rows in order.
    pub fn rows(&self) -> &[Vec<ImageDescriptor>] {
        &self.rows
    }

    /// All images in row-major order.
    pub fn images(&self) -> impl Iterator<Item = &ImageDescriptor> {
        self.rows.iter().flatten()
    }
}

// =============================================================================
// Grid Shape
// =============================================================================

/// Height available to one row once the inter-row gaps are removed.
///
/// Equivalent to `(1 + s) / rows - s`, so that
/// `rows * height + (rows - 1) * s == 1`.
fn row_height(num_rows: usize, spacing_fraction: f64) -> f64 {
    let rows = num_rows as f64;
    (1.0 - (rows - 1.0) * spacing_fraction) / rows
}

/// Derived layout of a grid in normalized viewer units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridShape {
    pub num_rows: usize,
    pub num_columns: usize,
    pub cell_width: f64,
    pub cell_height: f64,
    pub max_image_width: u32,
    pub max_image_height: u32,
    pub spacing_fraction: f64,
}

impl GridShape {
    /// Compute the shape of a grid.
    ///
    /// The cell height splits the unit height evenly between rows; the cell
    /// width follows the aspect ratio of the widest and tallest images.
    pub fn compute(grid: &Grid) -> Self {
        let num_rows = grid.num_rows();
        let num_columns = grid.num_columns();
        let spacing_fraction = SPACING_FRACTION;

        let max_image_width = grid.images().map(|img| img.width).max().unwrap_or(0);
        let max_image_height = grid.images().map(|img| img.height).max().unwrap_or(0);

        let cell_height = row_height(num_rows, spacing_fraction);
        let cell_width = cell_height * max_image_width as f64 / max_image_height as f64;

        Self {
            num_rows,
            num_columns,
            cell_width,
            cell_height,
            max_image_width,
            max_image_height,
            spacing_fraction,
        }
    }

    /// Width-to-height ratio of the whole grid.
    pub fn aspect_ratio(&self) -> f64 {
        (self.cell_width * self.num_columns as f64) / (self.cell_height * self.num_rows as f64)
    }

    /// Initial viewport center for the grid.
    pub fn home_center(&self) -> Point {
        Point::new(0.5 * self.aspect_ratio(), 0.5)
    }

    /// Position every image of the grid inside its cell.
    ///
    /// Images are centered horizontally in their cell and aligned to the
    /// top of their row.
    pub fn arrange(&self, grid: &Grid) -> Vec<CellPlacement> {
        let mut placements = Vec::with_capacity(self.num_rows * self.num_columns);

        for (row, images) in grid.rows().iter().enumerate() {
            let y = row as f64 * (self.cell_height + self.spacing_fraction);
            for (column, image) in images.iter().enumerate() {
                let shape = ImageShape::compute(image, self);
                let x = column as f64 * (self.cell_width + self.spacing_fraction)
                    + (self.cell_width - shape.display_width) / 2.0;
                placements.push(CellPlacement {
                    row,
                    column,
                    x,
                    y,
                    display_width: shape.display_width,
                    display_height: shape.display_height,
                    title: image.description.clone(),
                });
            }
        }

        placements
    }
}

// =============================================================================
// Image Shape
// =============================================================================

/// Display size of one image in normalized viewer units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageShape {
    pub display_width: f64,
    pub display_height: f64,
}

impl ImageShape {
    /// Size an image to fit its row, preserving its aspect ratio.
    ///
    /// The display height scales with the image's height relative to the
    /// tallest image, so images of equal height share the same vertical band.
    pub fn compute(image: &ImageDescriptor, shape: &GridShape) -> Self {
        let display_height = row_height(shape.num_rows, shape.spacing_fraction)
            * image.height as f64
            / shape.max_image_height as f64;
        let display_width = display_height * image.width as f64 / image.height as f64;
        Self {
            display_width,
            display_height,
        }
    }
}

/// Where one grid cell's image sits in the viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellPlacement {
    pub row: usize,
    pub column: usize,
    pub x: f64,
    pub y: f64,
    pub display_width: f64,
    pub display_height: f64,
    pub title: String,
}

impl CellPlacement {
    /// Anchor for the cell's title overlay: centered above the image.
    pub fn title_anchor(&self) -> Point {
        Point::new(self.x + self.display_width / 2.0, self.y)
    }
}
