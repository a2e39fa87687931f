use super::{Cluster, Clusterer, Clusters};
use crate::error::Result;
use crate::metrics::DistanceFunction;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Instant;
use tracing::debug;

/// How the distance between two clusters follows from member distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    Single,
    Complete,
    #[default]
    Average,
}

impl Linkage {
    /// Lance-Williams update for the distance from `k` to the union of `a` and `b`.
    fn combine(self, to_a: f64, to_b: f64, size_a: usize, size_b: usize) -> f64 {
        match self {
            Linkage::Single => to_a.min(to_b),
            Linkage::Complete => to_a.max(to_b),
            Linkage::Average => {
                (size_a as f64 * to_a + size_b as f64 * to_b) / (size_a + size_b) as f64
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    first: usize,
    second: usize,
    versions: (u32, u32),
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.first.cmp(&other.first))
            .then(self.second.cmp(&other.second))
    }
}

/// Upper triangle of a symmetric distance matrix.
struct Distances {
    rows: Vec<Vec<f64>>,
}

impl Distances {
    fn get(&self, a: usize, b: usize) -> f64 {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        self.rows[low][high - low - 1]
    }

    fn set(&mut self, a: usize, b: usize, value: f64) {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        self.rows[low][high - low - 1] = value;
    }
}

/// Agglomerative clustering that never merges two clusters farther apart
/// than `threshold` or whose union would exceed `max_cluster_size`.
///
/// Merges always pick the closest eligible pair; ties go to the pair with
/// the lowest cluster indices, where a merged cluster keeps the lower index
/// of its parts. Members keep their input order within a cluster.
pub struct SizeLimitedHac<D> {
    threshold: f64,
    max_cluster_size: usize,
    linkage: Linkage,
    metric: D,
}

impl<D> SizeLimitedHac<D> {
    pub fn new(threshold: f64, max_cluster_size: usize, metric: D) -> Self {
        Self {
            threshold,
            max_cluster_size: max_cluster_size.max(1),
            linkage: Linkage::default(),
            metric,
        }
    }

    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn max_cluster_size(&self) -> usize {
        self.max_cluster_size
    }

    fn eligible(&self, distance: f64, size: usize) -> bool {
        distance <= self.threshold && size <= self.max_cluster_size
    }
}

impl<V, D> Clusterer<V> for SizeLimitedHac<D>
where
    V: Send + Sync,
    D: DistanceFunction<V>,
{
    fn build_clusters(&self, values: Vec<V>) -> Result<Clusters<V>> {
        let n = values.len();
        if n == 0 {
            return Ok(Clusters::default());
        }

        let start = Instant::now();
        let rows = (0..n)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..n)
                    .map(|j| self.metric.distance(&values[i], &values[j]))
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        let mut distances = Distances { rows };
        debug!(
            "Computed {} pairwise distances in {:?}",
            n * (n - 1) / 2,
            start.elapsed()
        );

        let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        let mut active = vec![true; n];
        let mut versions = vec![0u32; n];
        let mut heap = BinaryHeap::new();

        for first in 0..n {
            for second in (first + 1)..n {
                let distance = distances.get(first, second);
                if self.eligible(distance, 2) {
                    heap.push(Reverse(Candidate {
                        distance,
                        first,
                        second,
                        versions: (0, 0),
                    }));
                }
            }
        }

        let mut merges = 0usize;
        while let Some(Reverse(candidate)) = heap.pop() {
            let (a, b) = (candidate.first, candidate.second);
            if !active[a] || !active[b] || candidate.versions != (versions[a], versions[b]) {
                continue;
            }
            let (size_a, size_b) = (members[a].len(), members[b].len());
            // Sizes only grow, so an oversized pair never becomes eligible again.
            if size_a + size_b > self.max_cluster_size {
                continue;
            }

            for k in 0..n {
                if k == a || k == b || !active[k] {
                    continue;
                }
                let merged =
                    self.linkage
                        .combine(distances.get(a, k), distances.get(b, k), size_a, size_b);
                distances.set(a, k, merged);
            }

            let absorbed = std::mem::take(&mut members[b]);
            members[a].extend(absorbed);
            members[a].sort_unstable();
            active[b] = false;
            versions[a] += 1;
            merges += 1;

            for k in 0..n {
                if k == a || !active[k] {
                    continue;
                }
                let distance = distances.get(a, k);
                if self.eligible(distance, members[a].len() + members[k].len()) {
                    let (first, second) = if a < k { (a, k) } else { (k, a) };
                    heap.push(Reverse(Candidate {
                        distance,
                        first,
                        second,
                        versions: (versions[first], versions[second]),
                    }));
                }
            }
        }

        let mut slots: Vec<Option<V>> = values.into_iter().map(Some).collect();
        let clusters: Vec<Cluster<V>> = (0..n)
            .filter(|&i| active[i])
            .map(|i| Cluster::new(members[i].iter().filter_map(|&m| slots[m].take()).collect()))
            .collect();

        debug!(
            "Built {} clusters from {} values with {} merges in {:?}",
            clusters.len(),
            n,
            merges,
            start.elapsed()
        );
        Ok(Clusters::new(clusters))
    }
}
