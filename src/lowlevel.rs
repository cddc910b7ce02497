//! Building blocks for custom verification pipelines.
//!
//! Most users should prefer the top-level `extract_signature`, `score`, and
//! `compare_strands` functions. These items expose the cell geometry, the
//! tolerant keypoint scorer, and the ranking primitives they are built on.

pub use crate::candidate::topk::{RankedMatch, TopK};
pub use crate::score::{score_keypoints, DISTANCE_WEIGHT, MISSING_CELL_PENALTY};
pub use crate::signature::extract::{GridCell, DEFAULT_GRID_SIZE};
pub use crate::store::{JsonFileStore, MatchMetadata, MemoryStore};
pub use crate::strand::{ChannelDelta, MismatchSample, StrandRegion, StrandReport};
