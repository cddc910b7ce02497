//! Constellation signatures: one brightest-pixel keypoint per grid cell.
//!
//! A `Signature` always covers a full square grid. Its wire form is a bare
//! JSON array of `{row, col, x, y, b?}` objects; deserialization runs the same
//! validation as [`Signature::from_keypoints`], so a signature that exists
//! is well-formed.

pub mod extract;

use crate::util::{ConstellationError, ConstellationResult};
use serde::{Deserialize, Serialize};

pub use extract::{extract_signature, ExtractConfig, GridCell, Luminance, DEFAULT_GRID_SIZE};

/// Brightest-pixel record for one grid cell.
///
/// `x` and `y` are image-relative (`[0, 1]`). `brightness` is display
/// metadata and never participates in distance scoring.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub row: usize,
    pub col: usize,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "b", default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
}

impl Keypoint {
    pub fn new(row: usize, col: usize, x: f64, y: f64, brightness: Option<f64>) -> Self {
        Self {
            row,
            col,
            x,
            y,
            brightness,
        }
    }

    /// Checks that coordinates (and brightness, if any) are finite values in `[0, 1]`.
    pub fn validate_range(&self) -> ConstellationResult<()> {
        let fields = [("x", Some(self.x)), ("y", Some(self.y)), ("b", self.brightness)];
        for (field, value) in fields {
            if let Some(value) = value {
                if !(0.0..=1.0).contains(&value) {
                    return Err(ConstellationError::CoordinateOutOfRange {
                        row: self.row,
                        col: self.col,
                        field,
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Complete grid signature in the order it was produced or received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Keypoint>", into = "Vec<Keypoint>")]
pub struct Signature {
    grid_size: usize,
    keypoints: Vec<Keypoint>,
}

impl Signature {
    /// Validates keypoints and infers the grid size from their count.
    ///
    /// Rejects empty or non-square counts, cells outside the grid,
    /// duplicate cells, and coordinates outside `[0, 1]`. With `n²` keypoints
    /// and no duplicates inside an `n x n` grid, every cell is covered.
    pub fn from_keypoints(keypoints: Vec<Keypoint>) -> ConstellationResult<Self> {
        let count = keypoints.len();
        let grid_size = exact_sqrt(count).ok_or(ConstellationError::InvalidKeypointCount { count })?;
        let mut seen = vec![false; count];
        for kp in &keypoints {
            if kp.row >= grid_size || kp.col >= grid_size {
                return Err(ConstellationError::CellOutOfGrid {
                    row: kp.row,
                    col: kp.col,
                    grid_size,
                });
            }
            let slot = &mut seen[kp.row * grid_size + kp.col];
            if *slot {
                return Err(ConstellationError::DuplicateCell {
                    row: kp.row,
                    col: kp.col,
                });
            }
            *slot = true;
            kp.validate_range()?;
        }
        Ok(Self {
            grid_size,
            keypoints,
        })
    }

    pub(crate) fn from_parts_unchecked(grid_size: usize, keypoints: Vec<Keypoint>) -> Self {
        debug_assert_eq!(keypoints.len(), grid_size * grid_size);
        Self {
            grid_size,
            keypoints,
        }
    }

    /// Parses the JSON wire format.
    pub fn from_json(text: &str) -> ConstellationResult<Self> {
        let keypoints: Vec<Keypoint> =
            serde_json::from_str(text).map_err(|err| ConstellationError::MalformedRequest {
                reason: err.to_string(),
            })?;
        Self::from_keypoints(keypoints)
    }

    /// Renders the JSON wire format.
    pub fn to_json_pretty(&self) -> String {
        // A Vec of plain numeric structs cannot fail to serialize.
        serde_json::to_string_pretty(&self.keypoints).unwrap_or_default()
    }

    /// Grid side length; the signature holds `grid_size²` keypoints.
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Number of grid cells.
    pub fn cell_count(&self) -> usize {
        self.keypoints.len()
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    /// Looks up a keypoint by cell identity rather than position.
    pub fn keypoint(&self, row: usize, col: usize) -> Option<&Keypoint> {
        self.keypoints
            .iter()
            .find(|kp| kp.row == row && kp.col == col)
    }

    pub fn into_keypoints(self) -> Vec<Keypoint> {
        self.keypoints
    }
}

impl AsRef<Signature> for Signature {
    fn as_ref(&self) -> &Signature {
        self
    }
}

impl TryFrom<Vec<Keypoint>> for Signature {
    type Error = ConstellationError;

    fn try_from(keypoints: Vec<Keypoint>) -> Result<Self, Self::Error> {
        Self::from_keypoints(keypoints)
    }
}

impl From<Signature> for Vec<Keypoint> {
    fn from(signature: Signature) -> Self {
        signature.keypoints
    }
}

fn exact_sqrt(count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let root = (count as f64).sqrt().round() as usize;
    (root * root == count).then_some(root)
}

#[cfg(test)]
mod tests {
    use super::exact_sqrt;

    #[test]
    fn exact_sqrt_accepts_squares_only() {
        assert_eq!(exact_sqrt(64), Some(8));
        assert_eq!(exact_sqrt(1), Some(1));
        assert_eq!(exact_sqrt(0), None);
        assert_eq!(exact_sqrt(63), None);
    }
}
