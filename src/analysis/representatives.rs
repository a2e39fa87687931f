use crate::clustering::Cluster;
use crate::error::{Error, Result};
use crate::hasher::Fingerprint;
use crate::metrics::{DistanceFunction, FeaturedSolution, FingerprintBag};
use crate::model::Identified;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::hash::Hash;

/// Candidate values a cluster member offers as representatives.
/// `None` means the member has nothing to offer.
pub trait ManyOptionsSelector<V, O>: Send + Sync {
    fn select_options(&self, value: &V) -> Option<Vec<O>>;
}

pub trait RepresentativesPicker<V, O>: Send + Sync {
    fn representatives(&self, cluster: &Cluster<V>) -> Result<Vec<O>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepresentativeStrategy {
    Centroid,
    #[default]
    KMostFrequent,
}

/// A member's whole fingerprint bag as its single option.
#[derive(Debug, Clone, Copy, Default)]
pub struct BagOption;

impl ManyOptionsSelector<FeaturedSolution, FingerprintBag> for BagOption {
    fn select_options(&self, value: &FeaturedSolution) -> Option<Vec<FingerprintBag>> {
        Some(vec![value.bag.clone()])
    }
}

/// Each distinct fingerprint of a member, in fingerprint order. Members
/// whose edit script is empty have no options.
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintOptions;

impl ManyOptionsSelector<FeaturedSolution, Fingerprint> for FingerprintOptions {
    fn select_options(&self, value: &FeaturedSolution) -> Option<Vec<Fingerprint>> {
        if value.bag.is_empty() {
            return None;
        }
        Some(value.bag.fingerprints().cloned().collect())
    }
}

fn collect_options<V, O, S>(selector: &S, cluster: &Cluster<V>) -> Result<Vec<O>>
where
    V: Identified,
    S: ManyOptionsSelector<V, O> + ?Sized,
{
    let mut options = Vec::new();
    for member in cluster.iter() {
        let selected = selector.select_options(member).ok_or(Error::NoOptions {
            member_id: member.identifier(),
        })?;
        options.extend(selected);
    }
    Ok(options)
}

/// The option with the smallest total distance to all distinct options of
/// the cluster. Ties go to the option seen first.
pub struct CentroidPicker<S, D> {
    selector: S,
    metric: D,
}

impl<S, D> CentroidPicker<S, D> {
    pub fn new(metric: D, selector: S) -> Self {
        Self { selector, metric }
    }
}

impl<V, O, S, D> RepresentativesPicker<V, O> for CentroidPicker<S, D>
where
    V: Identified,
    O: Clone + PartialEq,
    S: ManyOptionsSelector<V, O>,
    D: DistanceFunction<O>,
{
    fn representatives(&self, cluster: &Cluster<V>) -> Result<Vec<O>> {
        let mut options: Vec<O> = Vec::new();
        for option in collect_options(&self.selector, cluster)? {
            if !options.contains(&option) {
                options.push(option);
            }
        }

        let mut best: Option<(usize, f64)> = None;
        for (i, current) in options.iter().enumerate() {
            let mut total = 0.0;
            for other in &options {
                total += self.metric.distance(current, other)?;
            }
            if best.map_or(true, |(_, minimal)| total < minimal) {
                best = Some((i, total));
            }
        }
        Ok(best.map(|(i, _)| options[i].clone()).into_iter().collect())
    }
}

/// Up to `k` options with the most occurrences across members, most
/// frequent first; equal counts keep first-seen order.
pub struct KMostFrequentPicker<S> {
    selector: S,
    k: usize,
}

impl<S> KMostFrequentPicker<S> {
    pub fn new(selector: S, k: usize) -> Self {
        Self { selector, k }
    }
}

impl<V, O, S> RepresentativesPicker<V, O> for KMostFrequentPicker<S>
where
    V: Identified,
    O: Clone + Eq + Hash,
    S: ManyOptionsSelector<V, O>,
{
    fn representatives(&self, cluster: &Cluster<V>) -> Result<Vec<O>> {
        let mut first_seen: Vec<O> = Vec::new();
        let mut counts: AHashMap<O, (usize, u64)> = AHashMap::new();
        for option in collect_options(&self.selector, cluster)? {
            let order = first_seen.len();
            let entry = counts.entry(option.clone()).or_insert_with(|| {
                first_seen.push(option);
                (order, 0)
            });
            entry.1 += 1;
        }

        // Min-heap on (count, -order): the root is the weakest kept option.
        let mut heap = BinaryHeap::with_capacity(self.k + 1);
        for (order, option) in first_seen.iter().enumerate() {
            let count = counts.get(option).map_or(0, |&(_, c)| c);
            heap.push(Reverse((count, Reverse(order))));
            if heap.len() > self.k {
                heap.pop();
            }
        }

        let mut kept: Vec<(u64, usize)> = heap
            .into_iter()
            .map(|Reverse((count, Reverse(order)))| (count, order))
            .collect();
        kept.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        Ok(kept
            .into_iter()
            .map(|(_, order)| first_seen[order].clone())
            .collect())
    }
}
