use super::{ChangeGenerator, Changes};
use crate::error::{Error, Result};
use crate::hasher::ChangeHasher;
use crate::metrics::FeaturedSolution;
use crate::model::Solution;
use crate::selection::{ReferencePool, ReferenceSelector};
use std::sync::Arc;
use tracing::warn;

/// Edit script from a solution's nearest reference to the solution itself.
pub struct ChangesExtractor {
    generator: Arc<dyn ChangeGenerator>,
    selector: Arc<dyn ReferenceSelector>,
    pool: ReferencePool,
}

impl ChangesExtractor {
    pub fn new(
        generator: Arc<dyn ChangeGenerator>,
        selector: Arc<dyn ReferenceSelector>,
        pool: ReferencePool,
    ) -> Self {
        Self {
            generator,
            selector,
            pool,
        }
    }

    pub fn pool(&self) -> &ReferencePool {
        &self.pool
    }

    /// A stale remembered reference is dropped and selected again once.
    pub fn reference(&self, solution: &Solution) -> Result<Solution> {
        match self.selector.select(&self.pool, solution) {
            Err(Error::StaleCacheEntry {
                query_id,
                cached_id,
                pool_key,
            }) => {
                warn!(
                    "Cached reference {} for solution {} is not in pool {}, reselecting",
                    cached_id, query_id, pool_key
                );
                self.selector.invalidate(&self.pool, solution)?;
                self.selector.select(&self.pool, solution)
            }
            other => other,
        }
    }

    pub fn extract(&self, solution: &Solution) -> Result<Changes> {
        let reference = self.reference(solution)?;
        self.generator.changes(&reference, solution)
    }

    pub fn featurize(
        &self,
        solution: &Solution,
        hasher: &ChangeHasher,
    ) -> Result<FeaturedSolution> {
        let changes = self.extract(solution)?;
        Ok(FeaturedSolution::new(solution.clone(), changes, hasher))
    }
}
