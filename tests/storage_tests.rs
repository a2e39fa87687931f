use mistake_clusters::analysis::SolutionMarksHolder;
use mistake_clusters::clustering::{Cluster, Clusters, MarkedClusters};
use mistake_clusters::model::{Dataset, Solution, Verdict};
use mistake_clusters::storage::{serialization, CacheStore};
use tempfile::TempDir;

#[test]
fn test_buffered_writes_reach_disk_on_drop() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("cache.db");

    {
        let store = CacheStore::open(&path).unwrap().with_flush_every(100);
        for i in 0..10 {
            store.put("refs", &format!("pool|{}", i), vec![i as u8]).unwrap();
        }
        assert_eq!(store.get("refs", "pool|3").unwrap(), Some(vec![3]));
    }

    let store = CacheStore::open(&path).unwrap();
    assert_eq!(store.count(Some("refs")).unwrap(), 10);
    assert_eq!(store.get("refs", "pool|7").unwrap(), Some(vec![7]));
    assert_eq!(store.get("refs", "pool|10").unwrap(), None);
}

#[test]
fn test_indexes_are_independent() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::open(dir.path().join("cache.db")).unwrap().with_flush_every(2);
    store.put("a", "k", vec![1]).unwrap();
    store.put("b", "k", vec![2]).unwrap();
    store.put("b", "j", vec![3]).unwrap();

    assert_eq!(store.get("a", "k").unwrap(), Some(vec![1]));
    assert_eq!(store.get("b", "k").unwrap(), Some(vec![2]));
    assert_eq!(store.drop_index("b").unwrap(), 2);
    assert_eq!(store.count(Some("b")).unwrap(), 0);
    assert_eq!(store.count(None).unwrap(), 1);
    store.close().unwrap();
}

#[test]
fn test_overwrite_and_remove() {
    let store = CacheStore::in_memory().unwrap().with_flush_every(1);
    store.put("refs", "q", vec![1]).unwrap();
    store.put("refs", "q", vec![2]).unwrap();
    assert_eq!(store.get("refs", "q").unwrap(), Some(vec![2]));
    assert_eq!(store.count(Some("refs")).unwrap(), 1);
    assert!(store.remove("refs", "q").unwrap());
    assert!(!store.remove("refs", "q").unwrap());
    assert_eq!(store.get("refs", "q").unwrap(), None);
}

fn solution(id: i64, verdict: Verdict) -> Solution {
    Solution::new(format!("code {}", id), 5, id / 10, id, verdict)
}

#[test]
fn test_dataset_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out").join("dataset.json");
    let dataset = Dataset::new(vec![solution(10, Verdict::Fail), solution(11, Verdict::Ok)]);

    serialization::store_dataset(&dataset, &path).unwrap();
    let loaded = serialization::load_dataset(&path).unwrap();

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.values()[0].code, "code 10");
    assert_eq!(loaded.values()[0].verdict, Verdict::Fail);
    assert_eq!(loaded.values()[1].session_id, 1);
    assert_eq!(loaded.correct().len(), 1);
}

#[test]
fn test_marked_clusters_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let clusters = Clusters::new(vec![
        Cluster::new(vec![solution(1, Verdict::Fail), solution(2, Verdict::Fail)]),
        Cluster::new(vec![solution(3, Verdict::Fail)]),
    ]);
    let mut marked: MarkedClusters<Solution, String> = MarkedClusters::default();
    for (cluster, mark) in clusters.iter().zip([Some("loop bound".to_string()), None]) {
        marked.push(cluster.clone(), mark);
    }

    let clusters_path = dir.path().join("clusters.json");
    serialization::store_clusters(&clusters, &clusters_path).unwrap();
    let loaded: Clusters<Solution> = serialization::load_clusters(&clusters_path).unwrap();
    assert_eq!(loaded, clusters);

    let marked_path = dir.path().join("marked.json");
    serialization::store_marked_clusters(&marked, &marked_path).unwrap();
    let loaded: MarkedClusters<Solution, String> =
        serialization::load_marked_clusters(&marked_path).unwrap();
    assert_eq!(loaded.labeled().count(), 1);
    assert_eq!(loaded.marks()[0].1.as_deref(), Some("loop bound"));
    assert_eq!(loaded.marks()[1].0.len(), 1);
}

#[test]
fn test_marks_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("marks.json");
    let mut marks = SolutionMarksHolder::new();
    marks.add_mark(1, "off-by-one");
    marks.add_mark(1, "wrong output");
    marks.add_mark(4, "off-by-one");

    serialization::store_marks(&marks, &path).unwrap();
    let loaded = serialization::load_marks(&path).unwrap();
    assert_eq!(loaded, marks);
    assert_eq!(loaded.marks(1).len(), 2);
    assert!(loaded.marks(2).is_empty());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(serialization::load_dataset(dir.path().join("absent.json")).is_err());
}
