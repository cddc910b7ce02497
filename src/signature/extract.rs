//! Grid keypoint extraction.
//!
//! The raster is split into `grid_size x grid_size` cells. Cell origins and
//! extents are truncated toward zero; the extent is clamped so the last row
//! and column never read past the raster. Within each cell the pixel with
//! strictly greatest luminance wins, so ties keep the first pixel in
//! row-major order.

use crate::image::RasterView;
use crate::signature::{Keypoint, Signature};
use crate::trace::{trace_event, trace_span};
use crate::util::math::{luma_mean, luma_weighted};
use crate::util::{ConstellationError, ConstellationResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Grid side length shared with previously registered signatures.
pub const DEFAULT_GRID_SIZE: usize = 8;

/// Luminance formula used to rank pixels inside a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Luminance {
    /// `0.299 R + 0.587 G + 0.114 B`.
    #[default]
    Weighted,
    /// `(R + G + B) / 3`.
    Mean,
}

impl Luminance {
    #[inline]
    fn eval(self, r: u8, g: u8, b: u8) -> f64 {
        match self {
            Luminance::Weighted => luma_weighted(r, g, b),
            Luminance::Mean => luma_mean(r, g, b),
        }
    }
}

/// Configuration for signature extraction.
#[derive(Clone, Debug)]
pub struct ExtractConfig {
    /// Cells per side. Changing it breaks comparability with stored records.
    pub grid_size: usize,
    pub luminance: Luminance,
    /// Process grid rows in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            luminance: Luminance::Weighted,
            parallel: false,
        }
    }
}

/// Pixel bounds of one grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub start_x: usize,
    pub start_y: usize,
    pub width: usize,
    pub height: usize,
}

impl GridCell {
    /// Computes the bounds of cell `(row, col)` for a `width x height` raster.
    pub fn bounds(row: usize, col: usize, width: usize, height: usize, grid_size: usize) -> Self {
        let cell_w = width as f64 / grid_size as f64;
        let cell_h = height as f64 / grid_size as f64;
        let start_x = (col as f64 * cell_w) as usize;
        let start_y = (row as f64 * cell_h) as usize;
        // Rows or columns past the grid yield an empty cell.
        let w = (cell_w as usize).min(width.saturating_sub(start_x));
        let h = (cell_h as usize).min(height.saturating_sub(start_y));
        Self {
            row,
            col,
            start_x,
            start_y,
            width: w,
            height: h,
        }
    }
}

/// Extracts a signature with the default 8x8 grid and weighted luminance.
pub fn extract_signature(raster: RasterView<'_>) -> ConstellationResult<Signature> {
    extract_signature_with(raster, &ExtractConfig::default())
}

/// Extracts a signature using `cfg`.
///
/// The result is a pure function of the raster bytes and the config.
pub fn extract_signature_with(
    raster: RasterView<'_>,
    cfg: &ExtractConfig,
) -> ConstellationResult<Signature> {
    let grid = cfg.grid_size;
    if grid == 0 {
        return Err(ConstellationError::InvalidGridSize { grid_size: grid });
    }
    let (width, height) = (raster.width(), raster.height());
    if width < grid || height < grid {
        return Err(ConstellationError::RasterTooSmall {
            width,
            height,
            min_width: grid,
            min_height: grid,
        });
    }

    let _span = trace_span!("extract_signature", width = width, height = height, grid = grid)
        .entered();

    let rows = extract_rows(raster, cfg);
    let keypoints: Vec<Keypoint> = rows.into_iter().flatten().collect();

    trace_event!("signature_extracted", cells = keypoints.len());
    Ok(Signature::from_parts_unchecked(grid, keypoints))
}

#[cfg(feature = "rayon")]
fn extract_rows(raster: RasterView<'_>, cfg: &ExtractConfig) -> Vec<Vec<Keypoint>> {
    let grid = cfg.grid_size;
    if cfg.parallel {
        (0..grid)
            .into_par_iter()
            .map(|row| extract_grid_row(raster, row, cfg))
            .collect()
    } else {
        (0..grid)
            .map(|row| extract_grid_row(raster, row, cfg))
            .collect()
    }
}

#[cfg(not(feature = "rayon"))]
fn extract_rows(raster: RasterView<'_>, cfg: &ExtractConfig) -> Vec<Vec<Keypoint>> {
    (0..cfg.grid_size)
        .map(|row| extract_grid_row(raster, row, cfg))
        .collect()
}

fn extract_grid_row(raster: RasterView<'_>, row: usize, cfg: &ExtractConfig) -> Vec<Keypoint> {
    (0..cfg.grid_size)
        .map(|col| {
            let cell = GridCell::bounds(row, col, raster.width(), raster.height(), cfg.grid_size);
            brightest_in_cell(raster, cell, cfg.luminance)
        })
        .collect()
}

fn brightest_in_cell(raster: RasterView<'_>, cell: GridCell, luminance: Luminance) -> Keypoint {
    let channels = raster.channels();
    let mut best = f64::NEG_INFINITY;
    let mut best_x = 0usize;
    let mut best_y = 0usize;

    for ly in 0..cell.height {
        // Cell bounds are clamped to the raster, so the row always exists.
        let Some(row) = raster.row(cell.start_y + ly) else {
            break;
        };
        let start = cell.start_x * channels;
        let span = &row[start..start + cell.width * channels];
        for (lx, px) in span.chunks_exact(channels).enumerate() {
            let value = luminance.eval(px[0], px[1], px[2]);
            if value > best {
                best = value;
                best_x = lx;
                best_y = ly;
            }
        }
    }

    Keypoint {
        row: cell.row,
        col: cell.col,
        x: (cell.start_x + best_x) as f64 / raster.width() as f64,
        y: (cell.start_y + best_y) as f64 / raster.height() as f64,
        brightness: Some((best / 255.0).clamp(0.0, 1.0)),
    }
}
