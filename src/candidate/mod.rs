//! Candidate ranking for linear-scan matching.

pub(crate) mod topk;
