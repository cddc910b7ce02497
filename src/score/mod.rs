//! Constellation scoring: positional drift between two signatures.
//!
//! Keypoints are paired by explicit `(row, col)` identity. Each cell
//! contributes the Euclidean distance between its two keypoints, or a fixed
//! penalty when either side lacks the cell. The sum is divided by the number
//! of grid cells and mapped to a score with `max(0, 100 - avg * 500)`.
//!
//! Brightness is carried by keypoints but never enters the distance.

use crate::candidate::topk::{RankedMatch, TopK};
use crate::signature::{Keypoint, Signature};
use crate::trace::{trace_event, trace_span};
use crate::util::math::planar_distance;
use crate::util::{ConstellationError, ConstellationResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::Serialize;

/// Distance charged for a grid cell with no counterpart.
pub const MISSING_CELL_PENALTY: f64 = 0.5;

/// Score lost per unit of average relative drift.
pub const DISTANCE_WEIGHT: f64 = 500.0;

/// Thresholds and execution switches for constellation matching.
#[derive(Clone, Debug)]
pub struct ConstellationConfig {
    /// Minimum score (exclusive) for a store-wide best match.
    pub global_threshold: f64,
    /// Minimum score (exclusive) when checking against one supplied reference.
    pub local_threshold: f64,
    /// Cells closer than this count as tight matches in the report.
    pub tight_radius: f64,
    /// Scan candidates in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for ConstellationConfig {
    fn default() -> Self {
        Self {
            global_threshold: 75.0,
            local_threshold: 80.0,
            tight_radius: 0.05,
            parallel: false,
        }
    }
}

/// Outcome of comparing one signature against one reference.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoreReport {
    /// Similarity in `[0, 100]`.
    pub score: f64,
    /// Accumulated distance divided by the grid cell count.
    pub avg_distance: f64,
    /// Cells whose keypoints lie within the tight radius.
    pub tight_matches: usize,
    /// Cells missing from either side.
    pub missing_cells: usize,
    /// Divisor used for `avg_distance`.
    pub cell_count: usize,
}

impl ScoreReport {
    /// Returns `true` when the score strictly exceeds `threshold`.
    pub fn is_match(&self, threshold: f64) -> bool {
        self.score > threshold
    }
}

/// Scores `query` against `reference` by cell identity.
pub fn score(query: &Signature, reference: &Signature) -> ConstellationResult<ScoreReport> {
    score_with(query, reference, &ConstellationConfig::default())
}

/// Scores `query` against `reference` using the tight radius from `cfg`.
///
/// Both signatures must share a grid size.
pub fn score_with(
    query: &Signature,
    reference: &Signature,
    cfg: &ConstellationConfig,
) -> ConstellationResult<ScoreReport> {
    if query.grid_size() != reference.grid_size() {
        return Err(ConstellationError::GridSizeMismatch {
            query: query.grid_size(),
            reference: reference.grid_size(),
        });
    }
    score_keypoints(
        query.keypoints(),
        reference.keypoints(),
        query.grid_size(),
        cfg.tight_radius,
    )
}

/// Tolerant scoring over raw keypoint slices.
///
/// Every cell of the `grid_size x grid_size` grid is visited; cells absent
/// from either slice add [`MISSING_CELL_PENALTY`]. Duplicate cells, cells
/// outside the grid on either side, and out-of-range coordinates are
/// malformed input.
pub fn score_keypoints(
    query: &[Keypoint],
    reference: &[Keypoint],
    grid_size: usize,
    tight_radius: f64,
) -> ConstellationResult<ScoreReport> {
    if grid_size == 0 {
        return Err(ConstellationError::InvalidGridSize { grid_size });
    }
    let _span = trace_span!("score_signature", grid = grid_size).entered();

    let query_cells = index_cells(query, grid_size)?;
    let reference_cells = index_cells(reference, grid_size)?;

    let mut total = 0.0f64;
    let mut tight_matches = 0usize;
    let mut missing_cells = 0usize;
    for (q, r) in query_cells.iter().zip(reference_cells.iter()) {
        match (q, r) {
            (Some(q), Some(r)) => {
                let dist = planar_distance(q.x, q.y, r.x, r.y);
                if dist < tight_radius {
                    tight_matches += 1;
                }
                total += dist;
            }
            _ => {
                missing_cells += 1;
                total += MISSING_CELL_PENALTY;
            }
        }
    }

    let report = report_from_total(total, grid_size * grid_size, tight_matches, missing_cells);
    trace_event!(
        "signature_scored",
        score = report.score,
        avg_distance = report.avg_distance,
        missing = report.missing_cells
    );
    Ok(report)
}

/// Legacy comparator that pairs keypoints by position in the sequence.
///
/// Only meaningful when both signatures were produced in the same cell order.
/// Indices present on one side only take the missing-cell penalty; the
/// divisor is still the query's cell count.
pub fn score_aligned(query: &Signature, reference: &Signature) -> ScoreReport {
    let cfg = ConstellationConfig::default();
    let cell_count = query.cell_count();
    let q = query.keypoints();
    let r = reference.keypoints();

    let mut total = 0.0f64;
    let mut tight_matches = 0usize;
    let mut missing_cells = 0usize;
    for idx in 0..cell_count {
        match r.get(idx) {
            Some(rk) => {
                let qk = &q[idx];
                let dist = planar_distance(qk.x, qk.y, rk.x, rk.y);
                if dist < cfg.tight_radius {
                    tight_matches += 1;
                }
                total += dist;
            }
            None => {
                missing_cells += 1;
                total += MISSING_CELL_PENALTY;
            }
        }
    }
    report_from_total(total, cell_count, tight_matches, missing_cells)
}

/// Returns the highest scoring candidate, ties going to the earliest index.
///
/// `None` only when `candidates` is empty.
pub fn best_match<S>(
    query: &Signature,
    candidates: &[S],
    cfg: &ConstellationConfig,
) -> ConstellationResult<Option<RankedMatch>>
where
    S: AsRef<Signature> + Sync,
{
    Ok(rank_matches(query, candidates, 1, cfg)?.into_iter().next())
}

/// Returns up to `k` candidates ordered by descending score.
pub fn rank_matches<S>(
    query: &Signature,
    candidates: &[S],
    k: usize,
    cfg: &ConstellationConfig,
) -> ConstellationResult<Vec<RankedMatch>>
where
    S: AsRef<Signature> + Sync,
{
    let _span = trace_span!("best_match", candidates = candidates.len(), k = k).entered();
    let top = if cfg.parallel {
        rank_parallel(query, candidates, k, cfg)?
    } else {
        rank_sequential(query, candidates, k, cfg)?
    };
    let ranked = top.into_sorted_desc();
    if let Some(best) = ranked.first() {
        trace_event!("best_match_found", index = best.index, score = best.score);
    }
    Ok(ranked)
}

fn rank_sequential<S>(
    query: &Signature,
    candidates: &[S],
    k: usize,
    cfg: &ConstellationConfig,
) -> ConstellationResult<TopK>
where
    S: AsRef<Signature>,
{
    let mut top = TopK::new(k);
    for (index, candidate) in candidates.iter().enumerate() {
        top.push(rank_one(query, candidate.as_ref(), index, cfg)?);
    }
    Ok(top)
}

#[cfg(feature = "rayon")]
fn rank_parallel<S>(
    query: &Signature,
    candidates: &[S],
    k: usize,
    cfg: &ConstellationConfig,
) -> ConstellationResult<TopK>
where
    S: AsRef<Signature> + Sync,
{
    candidates
        .par_iter()
        .enumerate()
        .map(|(index, candidate)| rank_one(query, candidate.as_ref(), index, cfg))
        .try_fold(
            || TopK::new(k),
            |mut top, item: ConstellationResult<RankedMatch>| -> ConstellationResult<TopK> {
                top.push(item?);
                Ok(top)
            },
        )
        .try_reduce(|| TopK::new(k), |a, b| Ok(a.merge(b)))
}

#[cfg(not(feature = "rayon"))]
fn rank_parallel<S>(
    query: &Signature,
    candidates: &[S],
    k: usize,
    cfg: &ConstellationConfig,
) -> ConstellationResult<TopK>
where
    S: AsRef<Signature> + Sync,
{
    rank_sequential(query, candidates, k, cfg)
}

fn rank_one(
    query: &Signature,
    candidate: &Signature,
    index: usize,
    cfg: &ConstellationConfig,
) -> ConstellationResult<RankedMatch> {
    let report = score_with(query, candidate, cfg)?;
    Ok(RankedMatch {
        index,
        score: report.score,
        avg_distance: report.avg_distance,
    })
}

fn report_from_total(
    total: f64,
    cell_count: usize,
    tight_matches: usize,
    missing_cells: usize,
) -> ScoreReport {
    let avg_distance = total / cell_count as f64;
    ScoreReport {
        score: (100.0 - avg_distance * DISTANCE_WEIGHT).max(0.0),
        avg_distance,
        tight_matches,
        missing_cells,
        cell_count,
    }
}

/// Places keypoints into a dense `row * grid + col` table.
fn index_cells(
    keypoints: &[Keypoint],
    grid_size: usize,
) -> ConstellationResult<Vec<Option<&Keypoint>>> {
    let mut cells = vec![None; grid_size * grid_size];
    for kp in keypoints {
        if kp.row >= grid_size || kp.col >= grid_size {
            return Err(ConstellationError::CellOutOfGrid {
                row: kp.row,
                col: kp.col,
                grid_size,
            });
        }
        kp.validate_range()?;
        let slot = &mut cells[kp.row * grid_size + kp.col];
        if slot.is_some() {
            return Err(ConstellationError::DuplicateCell {
                row: kp.row,
                col: kp.col,
            });
        }
        *slot = Some(kp);
    }
    Ok(cells)
}
