//! Raster views over decoded RGB(A) pixel buffers.
//!
//! `RasterView` is a borrowed 2D view into interleaved 8-bit pixels with an
//! explicit stride. The stride counts bytes between the starts of
//! consecutive rows, so a stride larger than `width * channels` represents
//! padded rows. Alpha, when present, is carried but never read.

use crate::util::{ConstellationError, ConstellationResult};

#[cfg(feature = "image-io")]
pub mod io;

/// One 8-bit RGB sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Borrowed interleaved RGB or RGBA raster with an explicit row stride.
#[derive(Copy, Clone, Debug)]
pub struct RasterView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
    channels: usize,
}

impl<'a> RasterView<'a> {
    /// Creates a contiguous view with `stride == width * channels`.
    pub fn from_slice(
        data: &'a [u8],
        width: usize,
        height: usize,
        channels: usize,
    ) -> ConstellationResult<Self> {
        let stride = width
            .checked_mul(channels)
            .ok_or(ConstellationError::InvalidDimensions { width, height })?;
        Self::new(data, width, height, stride, channels)
    }

    /// Creates a view with an explicit byte stride.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
        channels: usize,
    ) -> ConstellationResult<Self> {
        let needed = required_len(width, height, stride, channels)?;
        if data.len() < needed {
            return Err(ConstellationError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            channels,
        })
    }

    /// Returns the raster width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the raster height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in bytes between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the number of interleaved channels (3 or 4).
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the interleaved bytes of row `y` (`width * channels` long).
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * self.channels)?;
        self.data.get(start..end)
    }

    /// Returns the RGB sample at `(x, y)` if it is within bounds.
    pub fn rgb(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let idx = x * self.channels;
        Some(Rgb::new(row[idx], row[idx + 1], row[idx + 2]))
    }
}

/// Owned contiguous RGB or RGBA raster.
#[derive(Clone, Debug)]
pub struct OwnedRaster {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl OwnedRaster {
    /// Wraps a tightly packed buffer; its length must match the geometry exactly.
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> ConstellationResult<Self> {
        let stride = width
            .checked_mul(channels)
            .ok_or(ConstellationError::InvalidDimensions { width, height })?;
        let needed = required_len(width, height, stride, channels)?;
        if data.len() < needed {
            return Err(ConstellationError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(ConstellationError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Builds an RGB raster by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> ConstellationResult<Self>
    where
        F: FnMut(usize, usize) -> Rgb,
    {
        let len = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(3))
            .ok_or(ConstellationError::InvalidDimensions { width, height })?;
        let mut data = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                let px = f(x, y);
                data.extend_from_slice(&[px.r, px.g, px.b]);
            }
        }
        Self::new(data, width, height, 3)
    }

    /// Returns the raster width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the raster height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the underlying interleaved bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a borrowed view of the raster.
    pub fn view(&self) -> RasterView<'_> {
        RasterView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width * self.channels,
            channels: self.channels,
        }
    }
}

fn required_len(
    width: usize,
    height: usize,
    stride: usize,
    channels: usize,
) -> ConstellationResult<usize> {
    if channels != 3 && channels != 4 {
        return Err(ConstellationError::UnsupportedChannels { channels });
    }
    if width == 0 || height == 0 {
        return Err(ConstellationError::InvalidDimensions { width, height });
    }
    let row_bytes = width
        .checked_mul(channels)
        .ok_or(ConstellationError::InvalidDimensions { width, height })?;
    if stride < row_bytes {
        return Err(ConstellationError::InvalidStride {
            width,
            channels,
            stride,
        });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_bytes))
        .ok_or(ConstellationError::InvalidDimensions { width, height })
}
