//! Pixel-tolerant comparison of reference and candidate strands.
//!
//! Strands pair by position, not by name. Within a pair, pixels pair by row
//! offset up to the shorter strand. A pixel matches when no channel differs
//! by more than the tolerance.

use crate::strand::{Pixel, Strand};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::math::percentage;
use serde::Serialize;

/// Thresholds for strict pixel verification.
#[derive(Clone, Debug)]
pub struct CompareConfig {
    /// Largest per-channel absolute difference still counted as a match.
    pub tolerance: u8,
    /// A strand matches when its percentage strictly exceeds this.
    pub strand_match_threshold: f64,
    /// Mismatches kept per strand for diagnostics.
    pub max_samples: usize,
    /// Pixel-count difference above which dimensions are flagged.
    pub dimension_slack: usize,
    /// Overall percentage at or above which the capture is authentic.
    pub authentic_threshold: f64,
    /// Overall percentage at or above which the capture is merely modified.
    pub modified_threshold: f64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            tolerance: 5,
            strand_match_threshold: 90.0,
            max_samples: 5,
            dimension_slack: 10,
            authentic_threshold: 95.0,
            modified_threshold: 80.0,
        }
    }
}

/// Signed per-channel difference, `candidate - reference`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelDelta {
    pub r: i16,
    pub g: i16,
    pub b: i16,
}

impl ChannelDelta {
    fn between(reference: &Pixel, candidate: &Pixel) -> Self {
        Self {
            r: candidate.r as i16 - reference.r as i16,
            g: candidate.g as i16 - reference.g as i16,
            b: candidate.b as i16 - reference.b as i16,
        }
    }

    fn within(&self, tolerance: u8) -> bool {
        let tol = tolerance as i16;
        self.r.abs() <= tol && self.g.abs() <= tol && self.b.abs() <= tol
    }
}

/// One recorded pixel mismatch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MismatchSample {
    /// Offset within the strand.
    pub position: usize,
    pub x: u32,
    pub y: u32,
    pub reference: Pixel,
    pub candidate: Pixel,
    pub delta: ChannelDelta,
}

/// Per-strand statistics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StrandReport {
    pub id: u32,
    pub name: String,
    /// Pixel count of the reference strand.
    pub total_pixels: usize,
    pub matching_pixels: usize,
    pub mismatching_pixels: usize,
    pub match_percentage: f64,
    pub is_match: bool,
    pub sample_mismatches: Vec<MismatchSample>,
}

/// Overall outcome bucket for strict verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Authentic,
    Modified,
    Failed,
}

/// Aggregate result of comparing two strand sets.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub strands: Vec<StrandReport>,
    /// Matching pixels over compared pixels across all strand pairs.
    pub overall_match_percentage: f64,
    /// Some strand pair differed in length by more than the slack.
    pub dimension_mismatch: bool,
    pub all_strands_match: bool,
}

impl ComparisonReport {
    /// Buckets the overall percentage with the thresholds in `cfg`.
    pub fn verdict(&self, cfg: &CompareConfig) -> Verdict {
        if self.overall_match_percentage >= cfg.authentic_threshold {
            Verdict::Authentic
        } else if self.overall_match_percentage >= cfg.modified_threshold {
            Verdict::Modified
        } else {
            Verdict::Failed
        }
    }
}

/// Compares strands with the default tolerance and thresholds.
pub fn compare_strands(reference: &[Strand], candidate: &[Strand]) -> ComparisonReport {
    compare_strands_with(reference, candidate, &CompareConfig::default())
}

/// Compares strands pairwise by position.
pub fn compare_strands_with(
    reference: &[Strand],
    candidate: &[Strand],
    cfg: &CompareConfig,
) -> ComparisonReport {
    let _span = trace_span!(
        "compare_strands",
        reference = reference.len(),
        candidate = candidate.len()
    )
    .entered();

    let mut strands = Vec::with_capacity(reference.len().min(candidate.len()));
    let mut compared = 0usize;
    let mut matched = 0usize;
    let mut dimension_mismatch = false;

    for (reference, candidate) in reference.iter().zip(candidate.iter()) {
        if reference.len().abs_diff(candidate.len()) > cfg.dimension_slack {
            trace_warn!(
                "strand_length_mismatch",
                id = reference.id(),
                reference = reference.len(),
                candidate = candidate.len()
            );
            dimension_mismatch = true;
        }
        let report = compare_pair(reference, candidate, cfg);
        compared += reference.len().min(candidate.len());
        matched += report.matching_pixels;
        strands.push(report);
    }

    let report = ComparisonReport {
        all_strands_match: strands.iter().all(|s| s.is_match),
        overall_match_percentage: percentage(matched, compared),
        dimension_mismatch,
        strands,
    };
    trace_event!(
        "strands_compared",
        overall = report.overall_match_percentage,
        dimension_mismatch = report.dimension_mismatch
    );
    report
}

fn compare_pair(reference: &Strand, candidate: &Strand, cfg: &CompareConfig) -> StrandReport {
    let mut matching = 0usize;
    let mut mismatching = 0usize;
    let mut samples = Vec::new();

    let pairs = reference.pixels().iter().zip(candidate.pixels().iter());
    for (position, (ref_px, cand_px)) in pairs.enumerate() {
        let delta = ChannelDelta::between(ref_px, cand_px);
        if delta.within(cfg.tolerance) {
            matching += 1;
            continue;
        }
        mismatching += 1;
        if samples.len() < cfg.max_samples {
            samples.push(MismatchSample {
                position,
                x: cand_px.x,
                y: cand_px.y,
                reference: *ref_px,
                candidate: *cand_px,
                delta,
            });
        }
    }

    let match_percentage = percentage(matching, reference.len());
    StrandReport {
        id: reference.id(),
        name: if candidate.name().is_empty() {
            format!("Strand {}", reference.id())
        } else {
            candidate.name().to_string()
        },
        total_pixels: reference.len(),
        matching_pixels: matching,
        mismatching_pixels: mismatching,
        match_percentage,
        is_match: match_percentage > cfg.strand_match_threshold,
        sample_mismatches: samples,
    }
}
