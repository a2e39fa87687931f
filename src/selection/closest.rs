use super::{ReferencePool, ReferenceSelector};
use crate::error::{Error, Result};
use crate::metrics::DistanceFunction;
use crate::model::Solution;
use rayon::prelude::*;
use tracing::trace;

/// Selects the pool member with the smallest distance to the query.
/// Ties go to the lowest solution id.
pub struct ClosestSelector<D> {
    metric: D,
}

impl<D: DistanceFunction<Solution>> ClosestSelector<D> {
    pub fn new(metric: D) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> &D {
        &self.metric
    }
}

impl<D: DistanceFunction<Solution>> ReferenceSelector for ClosestSelector<D> {
    fn select(&self, pool: &ReferencePool, query: &Solution) -> Result<Solution> {
        if pool.is_empty() {
            return Err(Error::EmptyPool {
                pool_key: pool.key().to_string(),
            });
        }

        let distances = pool
            .solutions()
            .par_iter()
            .map(|candidate| self.metric.distance(query, candidate))
            .collect::<Result<Vec<f64>>>()?;

        // Pool order is ascending by id, so strict comparison keeps the lowest id.
        let mut best = 0;
        for (i, distance) in distances.iter().enumerate().skip(1) {
            if *distance < distances[best] {
                best = i;
            }
        }

        let chosen = &pool.solutions()[best];
        trace!(
            "Solution {} -> reference {} (distance {:.4})",
            query.solution_id,
            chosen.solution_id,
            distances[best]
        );
        Ok(chosen.clone())
    }
}
