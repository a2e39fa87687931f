pub mod edit;
pub mod fingerprint;

pub use edit::{EditDistance, EditScale};
pub use fingerprint::{
    DistanceWeights, FeatureDistance, FeaturedSolution, FingerprintBag, FingerprintDistance,
};

use crate::error::Result;

/// Heuristic dissimilarity between two values. Implementations must be
/// symmetric and non-negative; the triangle inequality is not required.
pub trait DistanceFunction<V: ?Sized>: Send + Sync {
    fn distance(&self, first: &V, second: &V) -> Result<f64>;
}

impl<V: ?Sized, D: DistanceFunction<V> + ?Sized> DistanceFunction<V> for std::sync::Arc<D> {
    fn distance(&self, first: &V, second: &V) -> Result<f64> {
        (**self).distance(first, second)
    }
}

impl<V: ?Sized, D: DistanceFunction<V> + ?Sized> DistanceFunction<V> for &D {
    fn distance(&self, first: &V, second: &V) -> Result<f64> {
        (**self).distance(first, second)
    }
}
