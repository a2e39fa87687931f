use mistake_clusters::clustering::{Clusterer, Clusters, Linkage, SizeLimitedHac};
use mistake_clusters::hasher::Fingerprint;
use mistake_clusters::metrics::{DistanceWeights, FingerprintBag, FingerprintDistance};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

fn fingerprint(token: &str) -> Fingerprint {
    serde_json::from_value(serde_json::json!(token)).unwrap()
}

fn bag(tokens: &[&str]) -> FingerprintBag {
    tokens.iter().map(|t| fingerprint(t)).collect()
}

/// Bags drawn from a small vocabulary so that some of them overlap.
fn random_bags(count: usize, seed: u64) -> Vec<FingerprintBag> {
    const VOCABULARY: [&str; 5] = [
        "update-cond",
        "delete-call",
        "insert-return",
        "move-block",
        "update-name",
    ];
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.gen_range(0..5);
            (0..len)
                .map(|_| fingerprint(VOCABULARY[rng.gen_range(0..VOCABULARY.len())]))
                .collect()
        })
        .collect()
}

fn ids(clusters: &Clusters<(usize, FingerprintBag)>) -> Vec<Vec<usize>> {
    clusters
        .iter()
        .map(|cluster| cluster.iter().map(|(id, _)| *id).collect())
        .collect()
}

struct Indexed(FingerprintDistance);

impl mistake_clusters::metrics::DistanceFunction<(usize, FingerprintBag)> for Indexed {
    fn distance(
        &self,
        first: &(usize, FingerprintBag),
        second: &(usize, FingerprintBag),
    ) -> mistake_clusters::Result<f64> {
        Ok(self.0.between(&first.1, &second.1))
    }
}

#[test]
fn test_distance_is_symmetric_and_bounded_below_by_floor() {
    let metric = FingerprintDistance::new(DistanceWeights {
        mismatch_weight: 1.5,
        floor: 0.1,
    });
    let bags = random_bags(20, 7);
    for a in &bags {
        assert_eq!(metric.between(a, a), 0.1);
        for b in &bags {
            let d = metric.between(a, b);
            assert_eq!(d, metric.between(b, a));
            assert!(d >= 0.1);
            assert!(d <= 0.1 + 1.5 + 1e-12);
        }
    }
}

#[test]
fn test_every_value_lands_in_exactly_one_cluster() {
    let values: Vec<(usize, FingerprintBag)> =
        random_bags(40, 11).into_iter().enumerate().collect();
    for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average] {
        let hac = SizeLimitedHac::new(0.4, 6, Indexed(FingerprintDistance::default()))
            .with_linkage(linkage);
        let clusters = hac.build_clusters(values.clone()).unwrap();

        let mut seen = BTreeSet::new();
        for cluster in ids(&clusters) {
            assert!(!cluster.is_empty());
            assert!(cluster.len() <= 6);
            assert!(cluster.windows(2).all(|w| w[0] < w[1]));
            for id in cluster {
                assert!(seen.insert(id), "{} clustered twice", id);
            }
        }
        assert_eq!(seen.len(), values.len());
    }
}

#[test]
fn test_identical_bags_merge_at_zero_threshold() {
    let values: Vec<(usize, FingerprintBag)> = (0..5)
        .map(|i| (i, bag(&["update-cond", "update-cond", "delete-call"])))
        .collect();
    let hac = SizeLimitedHac::new(0.0, 10, Indexed(FingerprintDistance::default()));
    let clusters = hac.build_clusters(values).unwrap();
    assert_eq!(ids(&clusters), vec![vec![0, 1, 2, 3, 4]]);
}

#[test]
fn test_floor_above_threshold_keeps_singletons() {
    let values: Vec<(usize, FingerprintBag)> = (0..3).map(|i| (i, bag(&["update-cond"]))).collect();
    let metric = FingerprintDistance::new(DistanceWeights {
        mismatch_weight: 1.0,
        floor: 0.5,
    });
    let clusters = SizeLimitedHac::new(0.3, 10, Indexed(metric))
        .build_clusters(values)
        .unwrap();
    assert_eq!(ids(&clusters), vec![vec![0], vec![1], vec![2]]);
}

#[test]
fn test_size_bound_splits_equal_values() {
    let values: Vec<(usize, FingerprintBag)> = (0..3).map(|i| (i, bag(&["move-block"]))).collect();
    let hac = SizeLimitedHac::new(0.3, 2, Indexed(FingerprintDistance::default()));
    let clusters = hac.build_clusters(values).unwrap();
    assert_eq!(ids(&clusters), vec![vec![0, 1], vec![2]]);
}

#[test]
fn test_disjoint_groups_stay_apart() {
    let mut values = Vec::new();
    for i in 0..4 {
        values.push((2 * i, bag(&["insert-return"])));
        values.push((2 * i + 1, bag(&["delete-call", "update-name"])));
    }
    let hac = SizeLimitedHac::new(0.3, 10, Indexed(FingerprintDistance::default()));
    let clusters = hac.build_clusters(values).unwrap();
    assert_eq!(ids(&clusters), vec![vec![0, 2, 4, 6], vec![1, 3, 5, 7]]);
}
