//! Constellation builds compact geometric fingerprints of captured images and
//! verifies later copies against them.
//!
//! Two independent checks are provided:
//!
//! - **Resilient**: an 8x8 grid [`Signature`] of brightest-pixel positions,
//!   scored by positional drift. Tolerates recompression and resizing.
//! - **Strict**: three fixed vertical pixel [`Strand`]s compared pixel by
//!   pixel with a small per-channel tolerance.
//!
//! All extraction and comparison functions are pure and synchronous.
//! Optional features add parallel scans (`rayon`), image decoding
//! (`image-io`), and spans/events (`tracing`).

mod candidate;
pub mod image;
pub mod lowlevel;
pub mod score;
pub mod signature;
pub mod store;
pub mod strand;
pub(crate) mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use crate::image::io;

pub use candidate::topk::RankedMatch;
pub use crate::image::{OwnedRaster, RasterView, Rgb};
pub use score::{
    best_match, rank_matches, score, score_aligned, score_with, ConstellationConfig, ScoreReport,
};
pub use signature::extract::extract_signature_with;
pub use signature::{extract_signature, ExtractConfig, Keypoint, Luminance, Signature};
pub use store::{
    open_store, verify_signature, RegistrationRequest, SignatureRecord, SignatureStore,
    StoreBackend, StoreConfig, VerificationResponse,
};
pub use strand::{
    compare_strands, compare_strands_with, extract_strands, extract_strands_with, parse_reference,
    CompareConfig, ComparisonReport, DimensionCheck, Pixel, ReferenceCapture, ReferenceMetadata,
    Strand, Verdict,
};
pub use util::{ConstellationError, ConstellationResult};
