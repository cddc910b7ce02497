//! Top-K tracking for ranked signature matches.

use std::cmp::Ordering;

/// One scored candidate from a linear scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankedMatch {
    /// Index of the candidate in the scanned set.
    pub index: usize,
    /// Similarity score in `[0, 100]`.
    pub score: f64,
    /// Mean positional drift across grid cells.
    pub avg_distance: f64,
}

/// Orders by descending score, then ascending index, so the first
/// encountered candidate wins ties.
pub(crate) fn ranked_cmp_desc(a: &RankedMatch, b: &RankedMatch) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.index.cmp(&b.index))
}

pub(crate) fn sort_ranked_desc(items: &mut [RankedMatch]) {
    items.sort_by(ranked_cmp_desc);
}

/// Top-K container with O(k) insertion cost.
pub struct TopK {
    k: usize,
    items: Vec<RankedMatch>,
}

impl TopK {
    /// Creates a new Top-K collector.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k),
        }
    }

    /// Pushes a match, evicting the lowest ranked one if at capacity.
    pub fn push(&mut self, item: RankedMatch) {
        if self.k == 0 {
            return;
        }
        if self.items.len() < self.k {
            self.items.push(item);
            return;
        }

        let mut worst_idx = 0usize;
        for (idx, existing) in self.items.iter().enumerate().skip(1) {
            if ranked_cmp_desc(existing, &self.items[worst_idx]) == Ordering::Greater {
                worst_idx = idx;
            }
        }

        if ranked_cmp_desc(&item, &self.items[worst_idx]) == Ordering::Less {
            self.items[worst_idx] = item;
        }
    }

    /// Folds another collector into this one.
    pub fn merge(mut self, other: TopK) -> TopK {
        for item in other.items {
            self.push(item);
        }
        self
    }

    /// Returns matches sorted best first.
    pub fn into_sorted_desc(mut self) -> Vec<RankedMatch> {
        sort_ranked_desc(&mut self.items);
        self.items
    }
}
