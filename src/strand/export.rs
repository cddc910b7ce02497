//! Reference pixel-data text format.
//!
//! The capture device writes its strands as a plain text report: a metadata
//! block, one block per strand with its start/end coordinates and one
//! `X=..,Y=..,RGB(r,g,b),#RRGGBB` line per pixel, and a summary footer. The
//! writer reproduces that layout and the parser reads it back into
//! [`Strand`]s that compare field for field with freshly extracted ones.

use crate::image::RasterView;
use crate::strand::{extract_strands, Pixel, Strand, StrandRegion};
use crate::util::{ConstellationError, ConstellationResult};
use serde::Serialize;
use std::fmt;

const RULE: &str = "==============================================";

/// Capture metadata recorded alongside the strands.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReferenceMetadata {
    pub image_id: String,
    pub file_name: String,
    pub width: usize,
    pub height: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_mb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub captured_at: String,
    pub captured_by: String,
}

impl ReferenceMetadata {
    /// Compares the recorded dimensions with a candidate's.
    pub fn check_dimensions(&self, width: usize, height: usize) -> DimensionCheck {
        DimensionCheck::of((self.width, self.height), (width, height))
    }
}

/// Relationship between recorded and observed raster dimensions.
///
/// This is a reported condition; comparison proceeds regardless.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionCheck {
    Exact,
    /// Width and height are swapped.
    Rotated,
    Mismatch,
}

impl DimensionCheck {
    pub fn of(expected: (usize, usize), actual: (usize, usize)) -> Self {
        if expected == actual {
            DimensionCheck::Exact
        } else if expected == (actual.1, actual.0) {
            DimensionCheck::Rotated
        } else {
            DimensionCheck::Mismatch
        }
    }
}

/// A reference capture: metadata plus its strands.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReferenceCapture {
    pub metadata: ReferenceMetadata,
    pub strands: Vec<Strand>,
}

impl ReferenceCapture {
    /// Samples strands from `raster`; the recorded dimensions are taken from it.
    pub fn capture(raster: RasterView<'_>, mut metadata: ReferenceMetadata) -> ConstellationResult<Self> {
        metadata.width = raster.width();
        metadata.height = raster.height();
        let strands = extract_strands(raster)?.into();
        Ok(Self { metadata, strands })
    }

    /// Renders the text report.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    pub fn total_pixels(&self) -> usize {
        self.strands.iter().map(Strand::len).sum()
    }
}

impl fmt::Display for ReferenceCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = &self.metadata;
        writeln!(f, "{RULE}")?;
        writeln!(f, "3 VERTICAL PIXEL STRANDS")?;
        writeln!(f, "{RULE}")?;
        writeln!(f)?;
        writeln!(f, "Image ID: {}", meta.image_id)?;
        writeln!(f, "File Name: {}", meta.file_name)?;
        writeln!(f, "Image Dimensions: {} x {} pixels", meta.width, meta.height)?;
        if let Some(size) = meta.file_size_mb {
            writeln!(f, "File Size: {size:.2} MB")?;
        }
        if let Some(uri) = &meta.uri {
            writeln!(f, "URI: {uri}")?;
        }
        writeln!(f, "Captured At: {}", meta.captured_at)?;
        writeln!(f, "Captured By: {}", meta.captured_by)?;
        writeln!(f, "Total Strands: {} (Vertical)", self.strands.len())?;
        writeln!(f, "Strand Height: {} pixels each", meta.height / 3)?;
        writeln!(f, "Format: X,Y,RGB,HEX")?;
        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f)?;

        for strand in &self.strands {
            let percent = StrandRegion::from_name(strand.name())
                .map(StrandRegion::x_percent)
                .unwrap_or_else(|| {
                    if meta.width == 0 {
                        0
                    } else {
                        (strand.start_x() as usize * 100 / meta.width) as u32
                    }
                });
            writeln!(
                f,
                "--- STRAND {}: {} (X={}, {}% from left) ---",
                strand.id(),
                strand.name().to_ascii_uppercase(),
                strand.start_x(),
                percent
            )?;
            let end_y = strand.end_y().unwrap_or(strand.start_y());
            writeln!(
                f,
                "Start: ({},{}) | End: ({},{})",
                strand.start_x(),
                strand.start_y(),
                strand.start_x(),
                end_y
            )?;
            writeln!(f)?;
            for px in strand.pixels() {
                writeln!(
                    f,
                    "X={},Y={},RGB({},{},{}),{}",
                    px.x,
                    px.y,
                    px.r,
                    px.g,
                    px.b,
                    px.hex()
                )?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{RULE}")?;
        writeln!(f, "EXTRACTION SUMMARY")?;
        writeln!(f, "{RULE}")?;
        for strand in &self.strands {
            writeln!(f, "Strand {} pixels: {}", strand.id(), strand.len())?;
        }
        writeln!(f, "Total pixels extracted: {}", self.total_pixels())?;
        writeln!(f, "{RULE}")
    }
}

struct PendingStrand {
    id: u32,
    name: String,
    header_x: Option<u32>,
    start: Option<(u32, u32)>,
    header_line: usize,
    pixels: Vec<Pixel>,
}

impl PendingStrand {
    fn finish(self) -> ConstellationResult<Strand> {
        let (start_x, start_y) = match (self.start, self.header_x) {
            (Some(start), _) => start,
            (None, Some(x)) => (x, self.pixels.first().map(|px| px.y).unwrap_or(0)),
            (None, None) => {
                return Err(malformed(self.header_line, "strand has no start coordinates"));
            }
        };
        Strand::new(self.id, self.name, start_x, start_y, self.pixels)
            .map_err(|err| malformed(self.header_line, err.to_string()))
    }
}

/// Parses a reference text report.
///
/// Image dimensions and at least one strand are required. Pixel lines that
/// do not parse, or whose hex field disagrees with the RGB triple, are
/// rejected with their line number. The summary footer is not read.
pub fn parse_reference(text: &str) -> ConstellationResult<ReferenceCapture> {
    let mut metadata = ReferenceMetadata::default();
    let mut have_dimensions = false;
    let mut strands = Vec::new();
    let mut current: Option<PendingStrand> = None;
    let mut in_pixels = false;
    let mut last_line = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;
        let line = raw.trim();

        if let Some(rest) = line.strip_prefix("Image ID:") {
            metadata.image_id = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("File Name:") {
            metadata.file_name = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Image Dimensions:") {
            let (width, height) = parse_dimensions(rest)
                .ok_or_else(|| malformed(line_no, "expected `W x H pixels`"))?;
            metadata.width = width;
            metadata.height = height;
            have_dimensions = true;
        } else if let Some(rest) = line.strip_prefix("File Size:") {
            let value = rest.trim().trim_end_matches("MB").trim();
            metadata.file_size_mb = Some(
                value
                    .parse()
                    .map_err(|_| malformed(line_no, "expected `N.NN MB`"))?,
            );
        } else if let Some(rest) = line.strip_prefix("URI:") {
            metadata.uri = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Captured At:") {
            metadata.captured_at = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Captured By:") {
            metadata.captured_by = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("--- STRAND") {
            if let Some(done) = current.take() {
                strands.push(done.finish()?);
            }
            current = Some(parse_strand_header(rest, line_no)?);
            in_pixels = false;
        } else if let Some(rest) = line.strip_prefix("Start:") {
            let pending = current
                .as_mut()
                .ok_or_else(|| malformed(line_no, "start coordinates outside a strand"))?;
            pending.start = Some(
                parse_start(rest).ok_or_else(|| malformed(line_no, "expected `Start: (x,y)`"))?,
            );
            in_pixels = true;
        } else if line.starts_with("X=") {
            let pending = current
                .as_mut()
                .filter(|_| in_pixels)
                .ok_or_else(|| malformed(line_no, "pixel line outside strand data"))?;
            pending.pixels.push(parse_pixel_line(line, line_no)?);
        } else if line.starts_with("===") {
            in_pixels = false;
        }
    }

    if let Some(done) = current.take() {
        strands.push(done.finish()?);
    }
    if !have_dimensions {
        return Err(malformed(last_line, "missing `Image Dimensions` line"));
    }
    if strands.is_empty() {
        return Err(malformed(last_line, "no strands found"));
    }
    Ok(ReferenceCapture { metadata, strands })
}

fn malformed(line: usize, reason: impl Into<String>) -> ConstellationError {
    ConstellationError::MalformedReference {
        line,
        reason: reason.into(),
    }
}

fn parse_dimensions(text: &str) -> Option<(usize, usize)> {
    let mut parts = text.split_whitespace();
    let width = parts.next()?.parse().ok()?;
    if parts.next()? != "x" {
        return None;
    }
    let height = parts.next()?.parse().ok()?;
    Some((width, height))
}

/// Parses ` 1: BOTTOM (X=162, 15% from left) ---`.
fn parse_strand_header(rest: &str, line_no: usize) -> ConstellationResult<PendingStrand> {
    let (id_text, tail) = rest
        .split_once(':')
        .ok_or_else(|| malformed(line_no, "strand header missing `:`"))?;
    let id = id_text
        .trim()
        .parse()
        .map_err(|_| malformed(line_no, "strand id is not a number"))?;
    let tail = tail.trim();
    let label = tail.split(" (").next().unwrap_or(tail).trim();
    let name = StrandRegion::from_name(label)
        .map(|region| region.name().to_string())
        .unwrap_or_else(|| label.to_string());
    let header_x = tail
        .split_once("X=")
        .and_then(|(_, after)| after.split(|c: char| !c.is_ascii_digit()).next())
        .and_then(|digits| digits.parse().ok());
    Ok(PendingStrand {
        id,
        name,
        header_x,
        start: None,
        header_line: line_no,
        pixels: Vec::new(),
    })
}

/// Parses ` (162,400) | End: (162,599)`, keeping the start pair.
fn parse_start(rest: &str) -> Option<(u32, u32)> {
    let inner = rest.trim().strip_prefix('(')?;
    let (coords, _) = inner.split_once(')')?;
    let (x, y) = coords.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Parses `X=162,Y=400,RGB(12,34,56),#0C2238`.
fn parse_pixel_line(line: &str, line_no: usize) -> ConstellationResult<Pixel> {
    let bad = || malformed(line_no, format!("unparseable pixel line `{line}`"));

    let rest = line.strip_prefix("X=").ok_or_else(bad)?;
    let (x, rest) = rest.split_once(",Y=").ok_or_else(bad)?;
    let (y, rest) = rest.split_once(",RGB(").ok_or_else(bad)?;
    let (rgb, hex) = rest.split_once("),").ok_or_else(bad)?;

    let mut channels = rgb.split(',').map(|c| c.trim().parse::<u8>());
    let (Some(Ok(r)), Some(Ok(g)), Some(Ok(b)), None) =
        (channels.next(), channels.next(), channels.next(), channels.next())
    else {
        return Err(bad());
    };

    let pixel = Pixel::new(
        x.parse().map_err(|_| bad())?,
        y.parse().map_err(|_| bad())?,
        r,
        g,
        b,
    );
    if !hex.trim().eq_ignore_ascii_case(&pixel.hex()) {
        return Err(malformed(
            line_no,
            format!("hex {} disagrees with RGB({r},{g},{b})", hex.trim()),
        ));
    }
    Ok(pixel)
}
