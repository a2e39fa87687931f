//! Clusters of values and the clustering algorithms producing them.

pub mod hac;

pub use hac::{Linkage, SizeLimitedHac};

use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster<V> {
    elements: Vec<V>,
}

impl<V> Cluster<V> {
    pub fn new(elements: Vec<V>) -> Self {
        Self { elements }
    }

    pub fn elements(&self) -> &[V] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<V> {
        self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.elements.iter()
    }

    pub fn map<W>(&self, f: impl FnMut(&V) -> W) -> Cluster<W> {
        Cluster::new(self.elements.iter().map(f).collect())
    }
}

/// Disjoint clusters covering every clustered value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clusters<V> {
    clusters: Vec<Cluster<V>>,
}

impl<V> Default for Clusters<V> {
    fn default() -> Self {
        Self {
            clusters: Vec::new(),
        }
    }
}

impl<V> Clusters<V> {
    pub fn new(clusters: Vec<Cluster<V>>) -> Self {
        Self { clusters }
    }

    pub fn clusters(&self) -> &[Cluster<V>] {
        &self.clusters
    }

    pub fn into_clusters(self) -> Vec<Cluster<V>> {
        self.clusters
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cluster<V>> {
        self.clusters.iter()
    }

    /// Number of clustered values.
    pub fn population(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }

    pub fn map<W>(&self, mut f: impl FnMut(&V) -> W) -> Clusters<W> {
        Clusters::new(self.clusters.iter().map(|c| c.map(&mut f)).collect())
    }

    /// Largest first; equal sizes keep their order.
    pub fn sorted_by_size(&self) -> Vec<&Cluster<V>> {
        let mut sorted: Vec<&Cluster<V>> = self.clusters.iter().collect();
        sorted.sort_by_key(|c| std::cmp::Reverse(c.len()));
        sorted
    }
}

/// Clusters paired with an optional label each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkedClusters<V, L> {
    marks: Vec<(Cluster<V>, Option<L>)>,
}

impl<V, L> Default for MarkedClusters<V, L> {
    fn default() -> Self {
        Self { marks: Vec::new() }
    }
}

impl<V, L> MarkedClusters<V, L> {
    pub fn new(marks: Vec<(Cluster<V>, Option<L>)>) -> Self {
        Self { marks }
    }

    pub fn push(&mut self, cluster: Cluster<V>, mark: Option<L>) {
        self.marks.push((cluster, mark));
    }

    pub fn marks(&self) -> &[(Cluster<V>, Option<L>)] {
        &self.marks
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn labeled(&self) -> impl Iterator<Item = (&Cluster<V>, &L)> {
        self.marks
            .iter()
            .filter_map(|(cluster, mark)| mark.as_ref().map(|m| (cluster, m)))
    }

    pub fn clusters(&self) -> Clusters<V>
    where
        V: Clone,
    {
        Clusters::new(self.marks.iter().map(|(c, _)| c.clone()).collect())
    }
}

/// Partitions values into clusters.
pub trait Clusterer<V>: Send + Sync {
    fn build_clusters(&self, values: Vec<V>) -> Result<Clusters<V>>;
}
