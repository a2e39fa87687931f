use crate::clustering::{Cluster, Clusters, MarkedClusters};
use crate::model::Identified;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_AGREEMENT: f64 = 0.6;
pub const DEFAULT_TOP_CLUSTERS: usize = 51;

/// Human-assigned mistake labels per solution id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionMarksHolder {
    marks: BTreeMap<i64, Vec<String>>,
}

impl SolutionMarksHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mark(&mut self, solution_id: i64, mark: impl Into<String>) {
        self.marks.entry(solution_id).or_default().push(mark.into());
    }

    pub fn marks(&self, solution_id: i64) -> &[String] {
        self.marks.get(&solution_id).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &[String])> {
        self.marks.iter().map(|(id, marks)| (*id, marks.as_slice()))
    }
}

/// The most common mark of a cluster, when its count exceeds `agreement`
/// of all marks tallied over its members. Unmarked members abstain.
pub fn majority_mark<V: Identified>(
    cluster: &Cluster<V>,
    holder: &SolutionMarksHolder,
    agreement: f64,
) -> Option<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut tally: AHashMap<&str, usize> = AHashMap::new();
    let mut total = 0usize;
    for member in cluster.iter() {
        for mark in holder.marks(member.identifier()) {
            let count = tally.entry(mark.as_str()).or_insert(0);
            if *count == 0 {
                order.push(mark.as_str());
            }
            *count += 1;
            total += 1;
        }
    }

    let (mark, count) = order
        .iter()
        .map(|m| (*m, tally[m]))
        .fold(None, |best: Option<(&str, usize)>, (m, c)| match best {
            Some((_, bc)) if bc >= c => best,
            _ => Some((m, c)),
        })?;

    if count as f64 > agreement * total as f64 {
        Some(mark.to_string())
    } else {
        None
    }
}

/// Labels the `top` largest clusters by majority vote, largest first.
pub fn mark_clusters<V: Identified + Clone>(
    clusters: &Clusters<V>,
    holder: &SolutionMarksHolder,
    agreement: f64,
    top: usize,
) -> MarkedClusters<V, String> {
    let mut marked = MarkedClusters::default();
    for cluster in clusters.sorted_by_size().into_iter().take(top) {
        let mark = majority_mark(cluster, holder, agreement);
        marked.push(cluster.clone(), mark);
    }
    debug!(
        "Marked {} of {} clusters ({} labeled)",
        marked.len(),
        clusters.len(),
        marked.labeled().count()
    );
    marked
}
