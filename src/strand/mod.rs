//! Fixed vertical pixel strands for strict verification.
//!
//! Three columns are sampled at 15%, 50% and 80% of the width, each covering
//! one band of `band_height` rows: the bottom band, the vertically centred
//! band, and the top band. The geometry is fixed; no alignment search is
//! performed, so the reference capture must have used the same layout.

pub mod compare;
pub mod export;

use crate::image::RasterView;
use crate::trace::{trace_event, trace_span};
use crate::util::{ConstellationError, ConstellationResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use compare::{
    compare_strands, compare_strands_with, ChannelDelta, CompareConfig, ComparisonReport,
    MismatchSample, StrandReport, Verdict,
};
pub use export::{parse_reference, DimensionCheck, ReferenceCapture, ReferenceMetadata};

/// One sampled pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub fn new(x: u32, y: u32, r: u8, g: u8, b: u8) -> Self {
        Self { x, y, r, g, b }
    }

    /// Uppercase `#RRGGBB` colour, for display only.
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Vertical region a strand covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrandRegion {
    Bottom,
    Middle,
    Top,
}

impl StrandRegion {
    /// Regions in extraction order.
    pub const ALL: [StrandRegion; 3] = [StrandRegion::Bottom, StrandRegion::Middle, StrandRegion::Top];

    /// Horizontal position of the column as a fraction of the width.
    pub fn x_fraction(self) -> f64 {
        match self {
            StrandRegion::Bottom => 0.15,
            StrandRegion::Middle => 0.50,
            StrandRegion::Top => 0.80,
        }
    }

    /// Whole-percent label used by the export format.
    pub fn x_percent(self) -> u32 {
        match self {
            StrandRegion::Bottom => 15,
            StrandRegion::Middle => 50,
            StrandRegion::Top => 80,
        }
    }

    /// First row of the band.
    pub fn start_y(self, height: usize, band_height: usize) -> usize {
        match self {
            StrandRegion::Bottom => height - band_height,
            StrandRegion::Middle => (height - band_height) / 2,
            StrandRegion::Top => 0,
        }
    }

    /// Column sampled for a raster of `width` pixels.
    pub fn column(self, width: usize) -> usize {
        (width as f64 * self.x_fraction()) as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            StrandRegion::Bottom => "Bottom",
            StrandRegion::Middle => "Middle",
            StrandRegion::Top => "Top",
        }
    }

    /// Parses the capitalised or uppercase region name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bottom" => Some(StrandRegion::Bottom),
            "middle" => Some(StrandRegion::Middle),
            "top" => Some(StrandRegion::Top),
            _ => None,
        }
    }
}

impl fmt::Display for StrandRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single vertical scan line sampled top to bottom.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Strand {
    id: u32,
    name: String,
    start_x: u32,
    start_y: u32,
    pixels: Vec<Pixel>,
}

impl Strand {
    /// Validates that pixels sit in column `start_x` at rows
    /// `start_y, start_y + 1, ...` with no gaps.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        start_x: u32,
        start_y: u32,
        pixels: Vec<Pixel>,
    ) -> ConstellationResult<Self> {
        for (offset, px) in pixels.iter().enumerate() {
            if px.x != start_x {
                return Err(ConstellationError::MalformedStrand {
                    id,
                    reason: "pixel outside the strand column",
                });
            }
            let expected = start_y as u64 + offset as u64;
            if px.y as u64 != expected {
                return Err(ConstellationError::MalformedStrand {
                    id,
                    reason: "rows not contiguous from start",
                });
            }
        }
        Ok(Self {
            id,
            name: name.into(),
            start_x,
            start_y,
            pixels,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Region label, e.g. `Bottom`. May be empty for strands built by hand.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_x(&self) -> u32 {
        self.start_x
    }

    pub fn start_y(&self) -> u32 {
        self.start_y
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Last sampled row, if any.
    pub fn end_y(&self) -> Option<u32> {
        self.pixels.last().map(|px| px.y)
    }
}

/// Samples the three strands with the default band height of `height / 3`.
pub fn extract_strands(raster: RasterView<'_>) -> ConstellationResult<[Strand; 3]> {
    let height = raster.height();
    if height < 3 {
        return Err(ConstellationError::RasterTooSmall {
            width: raster.width(),
            height,
            min_width: 1,
            min_height: 3,
        });
    }
    extract_strands_with(raster, height / 3)
}

/// Samples the three strands with an explicit band height.
pub fn extract_strands_with(
    raster: RasterView<'_>,
    band_height: usize,
) -> ConstellationResult<[Strand; 3]> {
    let height = raster.height();
    if band_height == 0 || band_height > height {
        return Err(ConstellationError::InvalidBandHeight {
            band_height,
            height,
        });
    }

    let _span = trace_span!(
        "extract_strands",
        width = raster.width(),
        height = height,
        band = band_height
    )
    .entered();

    let [bottom, middle, top] = StrandRegion::ALL;
    let strands = [
        sample_strand(raster, 1, bottom, band_height),
        sample_strand(raster, 2, middle, band_height),
        sample_strand(raster, 3, top, band_height),
    ];

    trace_event!(
        "strands_extracted",
        bottom = strands[0].len(),
        middle = strands[1].len(),
        top = strands[2].len()
    );
    Ok(strands)
}

fn sample_strand(raster: RasterView<'_>, id: u32, region: StrandRegion, band_height: usize) -> Strand {
    let x = region.column(raster.width());
    let start_y = region.start_y(raster.height(), band_height);
    let end_y = (start_y + band_height).min(raster.height());
    let pixels = (start_y..end_y)
        .filter_map(|y| {
            raster
                .rgb(x, y)
                .map(|px| Pixel::new(x as u32, y as u32, px.r, px.g, px.b))
        })
        .collect();
    Strand {
        id,
        name: region.name().to_string(),
        start_x: x as u32,
        start_y: start_y as u32,
        pixels,
    }
}
