use super::DistanceFunction;
use crate::changes::Changes;
use crate::error::Result;
use crate::hasher::{ChangeHasher, Fingerprint};
use crate::model::{Identified, Solution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multiset of change fingerprints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintBag {
    counts: BTreeMap<Fingerprint, u32>,
}

impl FingerprintBag {
    pub fn from_changes(changes: &Changes, hasher: &ChangeHasher) -> Self {
        changes.iter().map(|change| hasher.hash(change)).collect()
    }

    pub fn count(&self, fingerprint: &Fingerprint) -> u32 {
        self.counts.get(fingerprint).copied().unwrap_or(0)
    }

    /// Total number of fingerprints, with multiplicity.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Fingerprint, u32)> {
        self.counts.iter().map(|(f, c)| (f, *c))
    }

    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> {
        self.counts.keys()
    }
}

impl FromIterator<Fingerprint> for FingerprintBag {
    fn from_iter<T: IntoIterator<Item = Fingerprint>>(iter: T) -> Self {
        let mut counts = BTreeMap::new();
        for fingerprint in iter {
            *counts.entry(fingerprint).or_insert(0) += 1;
        }
        Self { counts }
    }
}

/// Tunable weighting of the fingerprint distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceWeights {
    /// Multiplier of the normalized mismatch.
    pub mismatch_weight: f64,
    /// Constant added to every distance, including a bag with itself.
    pub floor: f64,
}

impl Default for DistanceWeights {
    fn default() -> Self {
        Self {
            mismatch_weight: 1.0,
            floor: 0.0,
        }
    }
}

/// `floor + mismatch_weight * Σ|a - b| / Σ max(a, b)` over fingerprint counts.
///
/// Shared fingerprints contribute nothing to the numerator; two empty bags
/// are at the floor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintDistance {
    weights: DistanceWeights,
}

impl FingerprintDistance {
    pub fn new(weights: DistanceWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &DistanceWeights {
        &self.weights
    }

    pub fn between(&self, first: &FingerprintBag, second: &FingerprintBag) -> f64 {
        let mut mismatch = 0u64;
        let mut union = 0u64;
        let mut left = first.counts.iter().peekable();
        let mut right = second.counts.iter().peekable();
        // Merge walk over the two sorted maps.
        loop {
            let (a, b) = match (left.peek(), right.peek()) {
                (None, None) => break,
                (Some((_, &a)), None) => {
                    left.next();
                    (a, 0)
                }
                (None, Some((_, &b))) => {
                    right.next();
                    (0, b)
                }
                (Some((ka, &a)), Some((kb, &b))) => match ka.cmp(kb) {
                    std::cmp::Ordering::Less => {
                        left.next();
                        (a, 0)
                    }
                    std::cmp::Ordering::Greater => {
                        right.next();
                        (0, b)
                    }
                    std::cmp::Ordering::Equal => {
                        left.next();
                        right.next();
                        (a, b)
                    }
                },
            };
            mismatch += u64::from(a.abs_diff(b));
            union += u64::from(a.max(b));
        }

        if union == 0 {
            return self.weights.floor;
        }
        self.weights.floor + self.weights.mismatch_weight * mismatch as f64 / union as f64
    }
}

impl DistanceFunction<FingerprintBag> for FingerprintDistance {
    fn distance(&self, first: &FingerprintBag, second: &FingerprintBag) -> Result<f64> {
        Ok(self.between(first, second))
    }
}

/// An incorrect solution together with its edit script to the nearest
/// reference and the fingerprints of that script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturedSolution {
    pub solution: Solution,
    pub changes: Changes,
    pub bag: FingerprintBag,
}

impl FeaturedSolution {
    pub fn new(solution: Solution, changes: Changes, hasher: &ChangeHasher) -> Self {
        let bag = FingerprintBag::from_changes(&changes, hasher);
        Self {
            solution,
            changes,
            bag,
        }
    }
}

impl Identified for FeaturedSolution {
    fn identifier(&self) -> i64 {
        self.solution.solution_id
    }
}

/// Fingerprint distance lifted to featured solutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureDistance {
    inner: FingerprintDistance,
}

impl FeatureDistance {
    pub fn new(weights: DistanceWeights) -> Self {
        Self {
            inner: FingerprintDistance::new(weights),
        }
    }
}

impl DistanceFunction<FeaturedSolution> for FeatureDistance {
    fn distance(&self, first: &FeaturedSolution, second: &FeaturedSolution) -> Result<f64> {
        Ok(self.inner.between(&first.bag, &second.bag))
    }
}
