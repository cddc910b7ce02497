//! Convenience helpers for decoding images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Decoding and resizing
//! stay outside the fingerprint core; these helpers only hand it RGBA bytes.

use crate::image::{OwnedRaster, RasterView};
use crate::util::{ConstellationError, ConstellationResult};
use std::path::Path;

/// Creates a borrowed view over an RGBA image buffer.
pub fn view_from_rgba_image(img: &image::RgbaImage) -> ConstellationResult<RasterView<'_>> {
    RasterView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize, 4)
}

/// Converts a decoded image of any colour type into an owned RGBA raster.
pub fn owned_from_dynamic_image(img: &image::DynamicImage) -> ConstellationResult<OwnedRaster> {
    let rgba = img.to_rgba8();
    let width = rgba.width() as usize;
    let height = rgba.height() as usize;
    OwnedRaster::new(rgba.into_raw(), width, height, 4)
}

/// Loads an image from disk and converts it to an owned RGBA raster.
pub fn load_raster<P: AsRef<Path>>(path: P) -> ConstellationResult<OwnedRaster> {
    let img = image::open(path).map_err(|err| ConstellationError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_dynamic_image(&img)
}
