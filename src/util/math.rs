//! Numeric helpers shared by the extraction and comparison paths.

/// Rec. 601 luma weights applied to 8-bit channels.
pub(crate) fn luma_weighted(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

/// Unweighted channel mean.
pub(crate) fn luma_mean(r: u8, g: u8, b: u8) -> f64 {
    (r as f64 + g as f64 + b as f64) / 3.0
}

/// Euclidean distance between two points in relative image space.
pub(crate) fn planar_distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    (ax - bx).hypot(ay - by)
}

/// Returns `part / whole * 100`, or zero for an empty whole.
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
