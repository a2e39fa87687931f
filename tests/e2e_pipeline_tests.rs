use mistake_clusters::analysis::SolutionMarksHolder;
use mistake_clusters::ast::{JsonTreeBuilder, NodeType, SyntaxNode, TreeBuilder};
use mistake_clusters::clustering::Clusters;
use mistake_clusters::ingest::{ParseMode, SubmissionParser, TreeValidator};
use mistake_clusters::metrics::FeaturedSolution;
use mistake_clusters::storage::{serialization, CacheStore};
use mistake_clusters::{AppConfig, ClusteringEngine, Dataset, SilentReporter, Verdict};
use std::sync::Arc;
use tempfile::TempDir;

const BAD_CODE: &str = "public static void main(String[] args) {";

fn name(label: &str) -> SyntaxNode {
    SyntaxNode::new(NodeType::SimpleName).label(label)
}

/// `for (i <op> 10) { <call>(i); }`
fn counting_loop(operator: &str, call: &str) -> String {
    let condition = SyntaxNode::new(NodeType::InfixExpression)
        .label(operator)
        .child(name("i"))
        .child(SyntaxNode::new(NodeType::NumberLiteral).label("10"));
    let body = SyntaxNode::new(NodeType::Block).child(
        SyntaxNode::new(NodeType::ExpressionStatement).child(
            SyntaxNode::new(NodeType::MethodInvocation)
                .label(call)
                .child(name("i")),
        ),
    );
    let program = SyntaxNode::new(NodeType::Block).child(
        SyntaxNode::new(NodeType::ForStatement)
            .child(condition)
            .child(body),
    );
    serde_json::to_string(&program).unwrap()
}

/// Ten users get the bound wrong, three call the wrong method and one
/// submission does not parse. Every user except the last fixes it.
fn submissions_csv() -> Vec<u8> {
    let correct = counting_loop("<", "println");
    let off_by_one = counting_loop("<=", "println");
    let wrong_call = counting_loop("<", "print");

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["user_id", "step_id", "is_passed", "submission_code", "timestamp"])
        .unwrap();
    for user in 1..=13i64 {
        let mistake = if user <= 10 { &off_by_one } else { &wrong_call };
        let time = 1000 + user * 100;
        let (user, failed_at, passed_at) = (
            user.to_string(),
            time.to_string(),
            (time + 10).to_string(),
        );
        writer
            .write_record([user.as_str(), "7", "false", mistake.as_str(), failed_at.as_str()])
            .unwrap();
        writer
            .write_record([user.as_str(), "7", "true", correct.as_str(), passed_at.as_str()])
            .unwrap();
    }
    writer
        .write_record(["14", "7", "false", BAD_CODE, "5000"])
        .unwrap();
    writer.into_inner().unwrap()
}

fn parse_dataset() -> Dataset {
    let builder: Arc<dyn TreeBuilder> = Arc::new(JsonTreeBuilder);
    let validator = TreeValidator::new(builder);
    let dataset = SubmissionParser::new(&validator)
        .parse(submissions_csv().as_slice(), ParseMode::Last)
        .unwrap();
    dataset
}

fn sizes<V>(clusters: &Clusters<V>) -> Vec<usize> {
    clusters.iter().map(|c| c.len()).collect()
}

fn off_by_one_ids(clusters: &Clusters<FeaturedSolution>) -> Vec<i64> {
    clusters
        .iter()
        .find(|c| c.len() == 10)
        .map(|c| c.iter().map(|s| s.solution.solution_id).collect())
        .unwrap_or_default()
}

#[test]
fn test_parsing_keeps_one_failure_and_one_pass_per_session() {
    let dataset = parse_dataset();
    assert_eq!(dataset.len(), 26);
    assert_eq!(dataset.incorrect().len(), 13);
    assert_eq!(dataset.correct().len(), 13);
    assert!(dataset.values().iter().all(|s| s.code != BAD_CODE));
    assert!(dataset
        .values()
        .iter()
        .all(|s| s.solution_id % 10 == s.verdict.ordinal() && s.problem_id == 7));
}

#[test]
fn test_pipeline_groups_shared_mistakes() {
    let dir = TempDir::new().unwrap();
    let dataset = parse_dataset();
    let store = Arc::new(CacheStore::open(dir.path().join("cache").join("mc.db")).unwrap());
    let engine = ClusteringEngine::new(AppConfig::default()).with_cache(store.clone());

    let result = engine.cluster_problem(&dataset, &SilentReporter).unwrap();
    assert!(result.failures.is_empty());
    assert_eq!(sizes(&result.clusters), vec![10, 3]);
    for cluster in result.clusters.iter() {
        assert!(cluster.iter().all(|s| s.solution.verdict == Verdict::Fail));
        assert!(cluster.iter().all(|s| s.changes.len() == 1));
    }
    assert_eq!(store.count(Some("references")).unwrap(), 13);

    for cluster in result.clusters.iter() {
        let representatives = engine.representatives(cluster).unwrap();
        assert_eq!(representatives.len(), 1);
        assert!(representatives[0].to_string().starts_with("CCE,CT3,"));
    }

    let path = dir.path().join("out").join("clusters.json");
    serialization::store_clusters(&result.clusters, &path).unwrap();
    let loaded: Clusters<FeaturedSolution> = serialization::load_clusters(&path).unwrap();
    assert_eq!(sizes(&loaded), vec![10, 3]);
}

#[test]
fn test_second_run_reads_references_from_cache() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mc.db");
    let dataset = parse_dataset();

    let first = {
        let store = Arc::new(CacheStore::open(&path).unwrap());
        let engine = ClusteringEngine::new(AppConfig::default()).with_cache(store);
        engine.cluster_problem(&dataset, &SilentReporter).unwrap()
    };

    let store = Arc::new(CacheStore::open(&path).unwrap());
    let engine = ClusteringEngine::new(AppConfig::default()).with_cache(store.clone());
    let (pool, rejected) = engine.reference_pool(&dataset, &SilentReporter);
    assert!(rejected.is_empty());
    assert_eq!(pool.len(), 1);
    let reference = pool.solutions()[0].solution_id;
    for solution in dataset.incorrect() {
        let key = format!("{}|{}", pool.key(), solution.solution_id);
        let cached = store.get("references", &key).unwrap().unwrap();
        assert_eq!(bincode::deserialize::<i64>(&cached).unwrap(), reference);
    }

    let second = engine.cluster_problem(&dataset, &SilentReporter).unwrap();
    assert_eq!(store.count(None).unwrap(), 13);
    assert_eq!(sizes(&second.clusters), sizes(&first.clusters));
    assert_eq!(off_by_one_ids(&second.clusters), off_by_one_ids(&first.clusters));
}

#[test]
fn test_majority_label_needs_more_than_sixty_percent() {
    let dataset = parse_dataset();
    let engine = ClusteringEngine::new(AppConfig::default());
    let result = engine.cluster_problem(&dataset, &SilentReporter).unwrap();
    let ids = off_by_one_ids(&result.clusters);
    assert_eq!(ids.len(), 10);

    let mut agreeing = SolutionMarksHolder::new();
    for (i, id) in ids.iter().enumerate() {
        agreeing.add_mark(*id, if i < 7 { "off-by-one" } else { "wrong output" });
    }
    let marked = engine.mark(&result.clusters, &agreeing);
    assert_eq!(marked.len(), 2);
    let labels: Vec<&String> = marked.labeled().map(|(_, label)| label).collect();
    assert_eq!(labels, vec!["off-by-one"]);

    let mut split = SolutionMarksHolder::new();
    for (i, id) in ids.iter().enumerate() {
        split.add_mark(*id, if i < 5 { "off-by-one" } else { "wrong output" });
    }
    assert_eq!(engine.mark(&result.clusters, &split).labeled().count(), 0);
}

#[test]
fn test_correct_solutions_collapse_to_one_reference() {
    let dataset = parse_dataset();
    let engine = ClusteringEngine::new(AppConfig::default());
    let result = engine.cluster_correct(&dataset, &SilentReporter).unwrap();
    assert_eq!(sizes(&result.clusters), vec![1]);
    assert_eq!(result.clusters.clusters()[0].elements()[0].solution_id, 0);
}
