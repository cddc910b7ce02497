//! Error types for constellation.

use thiserror::Error;

/// Result alias for constellation operations.
pub type ConstellationResult<T> = std::result::Result<T, ConstellationError>;

/// Errors that can occur when extracting, comparing, or storing fingerprints.
///
/// Every error is scoped to the single operation that produced it; none of
/// them leave shared state behind.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConstellationError {
    /// Width or height is zero, or their product overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride (in bytes) is shorter than one row of pixels.
    #[error("invalid stride: {stride} bytes for width {width} at {channels} channels")]
    InvalidStride {
        width: usize,
        channels: usize,
        stride: usize,
    },
    /// Only interleaved RGB and RGBA rasters are supported.
    #[error("unsupported channel count: {channels} (expected 3 or 4)")]
    UnsupportedChannels { channels: usize },
    /// The backing buffer is shorter than the declared geometry.
    #[error("buffer too small: needed {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The raster cannot hold at least one pixel per grid cell or band row.
    #[error("raster {width}x{height} too small (minimum {min_width}x{min_height})")]
    RasterTooSmall {
        width: usize,
        height: usize,
        min_width: usize,
        min_height: usize,
    },
    /// Grid size must be at least 1.
    #[error("invalid grid size: {grid_size}")]
    InvalidGridSize { grid_size: usize },
    /// A signature must hold a non-zero perfect square number of keypoints.
    #[error("invalid keypoint count: {count} is not a non-zero perfect square")]
    InvalidKeypointCount { count: usize },
    /// Two keypoints claim the same grid cell.
    #[error("duplicate keypoint for cell ({row}, {col})")]
    DuplicateCell { row: usize, col: usize },
    /// Two signatures were built on different grids and cannot be compared.
    #[error("grid size mismatch: query {query}x{query}, reference {reference}x{reference}")]
    GridSizeMismatch { query: usize, reference: usize },
    /// A keypoint's cell lies outside the grid.
    #[error("cell ({row}, {col}) outside {grid_size}x{grid_size} grid")]
    CellOutOfGrid {
        row: usize,
        col: usize,
        grid_size: usize,
    },
    /// A keypoint's coordinates or brightness are not finite values in [0, 1].
    #[error("keypoint ({row}, {col}) out of range: {field} = {value}")]
    CoordinateOutOfRange {
        row: usize,
        col: usize,
        field: &'static str,
        value: f64,
    },
    /// A strand violates the scan-line invariants.
    #[error("malformed strand {id}: {reason}")]
    MalformedStrand { id: u32, reason: &'static str },
    /// Band height must be in `1..=height`.
    #[error("invalid band height {band_height} for raster height {height}")]
    InvalidBandHeight { band_height: usize, height: usize },
    /// The reference pixel-data text could not be parsed.
    #[error("malformed reference data at line {line}: {reason}")]
    MalformedReference { line: usize, reason: String },
    /// A registration request was rejected.
    #[error("malformed registration request: {reason}")]
    MalformedRequest { reason: String },
    /// Failed to load or decode an image.
    #[error("image I/O failed: {reason}")]
    ImageIo { reason: String },
    /// The signature store backend failed to read or write.
    #[error("signature store I/O failed: {reason}")]
    StoreIo { reason: String },
    /// The signature store contains a record that does not parse.
    #[error("signature store corrupt at record {line}: {reason}")]
    StoreCorrupt { line: usize, reason: String },
    /// The store was used after `close`.
    #[error("signature store is closed")]
    StoreClosed,
}
