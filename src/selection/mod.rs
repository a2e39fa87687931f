//! Nearest-reference selection over pools of correct solutions.

pub mod cache;
pub mod closest;
pub mod unifier;

pub use cache::CachedSelector;
pub use closest::ClosestSelector;
pub use unifier::Unifier;

use crate::error::Result;
use crate::model::Solution;
use ahash::AHashMap;
use std::sync::Arc;

/// Candidate references with a key that is stable across runs for the same
/// set of solutions.
#[derive(Debug, Clone)]
pub struct ReferencePool {
    key: String,
    solutions: Vec<Solution>,
    index: AHashMap<i64, usize>,
}

impl ReferencePool {
    /// Keyed by a blake3 digest of the sorted solution ids.
    pub fn new(solutions: Vec<Solution>) -> Self {
        let mut hasher = blake3::Hasher::new();
        let mut ids: Vec<i64> = solutions.iter().map(|s| s.solution_id).collect();
        ids.sort_unstable();
        ids.dedup();
        for id in &ids {
            hasher.update(&id.to_le_bytes());
        }
        let key = hasher.finalize().to_hex().as_str()[..16].to_string();
        Self::with_key(key, solutions)
    }

    pub fn with_key(key: impl Into<String>, mut solutions: Vec<Solution>) -> Self {
        solutions.sort_by_key(|s| s.solution_id);
        solutions.dedup_by_key(|s| s.solution_id);
        let index = solutions
            .iter()
            .enumerate()
            .map(|(i, s)| (s.solution_id, i))
            .collect();
        Self {
            key: key.into(),
            solutions,
            index,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Members in ascending id order.
    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    pub fn get(&self, solution_id: i64) -> Option<&Solution> {
        self.index.get(&solution_id).map(|&i| &self.solutions[i])
    }

    pub fn contains(&self, solution_id: i64) -> bool {
        self.index.contains_key(&solution_id)
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }
}

/// Picks the reference a query solution is compared against.
pub trait ReferenceSelector: Send + Sync {
    fn select(&self, pool: &ReferencePool, query: &Solution) -> Result<Solution>;

    /// Forgets any remembered choice for `query`.
    fn invalidate(&self, _pool: &ReferencePool, _query: &Solution) -> Result<()> {
        Ok(())
    }
}

impl<S: ReferenceSelector + ?Sized> ReferenceSelector for Arc<S> {
    fn select(&self, pool: &ReferencePool, query: &Solution) -> Result<Solution> {
        (**self).select(pool, query)
    }

    fn invalidate(&self, pool: &ReferencePool, query: &Solution) -> Result<()> {
        (**self).invalidate(pool, query)
    }
}
