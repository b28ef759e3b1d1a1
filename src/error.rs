use thiserror::Error;

/// Errors raised when a grid arrangement is malformed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// Grid has no rows
    #[error("Grid is empty: at least one row is required")]
    Empty,

    /// A row has no images
    #[error("Grid row {row} is empty")]
    EmptyRow { row: usize },

    /// Rows have different lengths
    #[error("Grid is ragged: row {row} has {actual} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// An image in the grid has a zero width or height
    #[error("Image '{name}' has zero-sized dimensions ({width}x{height})")]
    ZeroDimension {
        name: String,
        width: u32,
        height: u32,
    },
}

/// Errors raised while building tile-source descriptors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileSourceError {
    /// TileSize must contain exactly a width and a height
    #[error("Invalid TileSize for '{image}': expected 2 entries, got {len}")]
    InvalidTileSize { image: String, len: usize },

    /// Tile dimensions must be positive
    #[error("Invalid TileSize for '{image}': tile dimensions must be non-zero")]
    ZeroTileSize { image: String },

    /// Requested pyramid level is above the maximum level
    #[error("Level {level} exceeds max level {max_level}")]
    LevelOutOfRange { level: u32, max_level: u32 },
}

/// Errors from the layer-load barrier
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarrierError {
    /// A barrier must wait for at least one layer
    #[error("Load barrier requires at least one layer")]
    ZeroLayers,

    /// Waiting for the barrier exceeded the caller's deadline
    #[error("Timed out waiting for layers: {loaded} of {total} loaded")]
    TimedOut { loaded: usize, total: usize },

    /// The barrier was dropped before it fired
    #[error("Load barrier was dropped before firing")]
    Closed,
}

/// Errors from linking two viewer instances
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinkError {
    /// The second viewer went away before it became ready
    #[error("Peer viewer closed before it became ready")]
    PeerClosed,

    /// The second viewer did not become ready in time
    #[error("Timed out waiting for peer viewer after {0} ms")]
    TimedOut(u64),
}

/// Errors that can occur when loading or building an exhibit
#[derive(Debug, Clone, Error)]
pub enum ExhibitError {
    /// Reading an exhibit from the local filesystem failed
    #[error("I/O error: {0}")]
    Io(String),

    /// Fetching an exhibit over HTTP failed
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Exhibit JSON could not be parsed
    #[error("Invalid exhibit JSON: {0}")]
    Parse(String),

    /// A grid cell names an image that is not declared
    #[error("Grid references unknown image: {0}")]
    UnknownImage(String),

    /// Grid arrangement is malformed
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// A tile source could not be built
    #[error("Tile source error: {0}")]
    TileSource(#[from] TileSourceError),

    /// The load barrier could not be created
    #[error("Barrier error: {0}")]
    Barrier(#[from] BarrierError),
}

impl From<serde_json::Error> for ExhibitError {
    fn from(err: serde_json::Error) -> Self {
        ExhibitError::Parse(err.to_string())
    }
}
