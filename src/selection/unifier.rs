use crate::ast::{Tree, TreeBuilder};
use crate::error::Error;
use crate::model::Solution;
use ahash::AHashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Collapses solutions with identical syntax trees, keeping the lowest id
/// of each group.
pub struct Unifier {
    builder: Arc<dyn TreeBuilder>,
}

impl Unifier {
    pub fn new(builder: Arc<dyn TreeBuilder>) -> Self {
        Self { builder }
    }

    /// Returns one solution per distinct tree, in ascending id order, and
    /// the ids of solutions whose code could not be parsed.
    pub fn unify(&self, solutions: &[Solution]) -> (Vec<Solution>, Vec<(i64, Error)>) {
        let mut buckets: AHashMap<u64, Vec<(Arc<Tree>, Solution)>> = AHashMap::new();
        let mut rejected = Vec::new();

        for solution in solutions {
            let tree = match self.builder.build_tree(&solution.code) {
                Ok(tree) => tree,
                Err(e) => {
                    warn!("Skipping solution {} during unification: {}", solution.solution_id, e);
                    rejected.push((solution.solution_id, e));
                    continue;
                }
            };
            let bucket = buckets.entry(tree.structure_hash()).or_default();
            match bucket.iter_mut().find(|(kept, _)| kept.deep_equals(&tree)) {
                Some((_, kept)) => {
                    if solution.solution_id < kept.solution_id {
                        *kept = solution.clone();
                    }
                }
                None => bucket.push((tree, solution.clone())),
            }
        }

        let mut unified: Vec<Solution> = buckets
            .into_values()
            .flat_map(|bucket| bucket.into_iter().map(|(_, s)| s))
            .collect();
        unified.sort_by_key(|s| s.solution_id);
        debug!(
            "Unified {} solutions into {} ({} unparsable)",
            solutions.len(),
            unified.len(),
            rejected.len()
        );
        (unified, rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::JsonTreeBuilder;
    use crate::model::Verdict;

    #[test]
    fn test_identical_trees_keep_lowest_id() {
        let unifier = Unifier::new(Arc::new(JsonTreeBuilder));
        let a = r#"{"type":"BLOCK","children":[{"type":"BREAK_STATEMENT"}]}"#;
        let b = r#"{"type":"BLOCK","children":[{"type":"CONTINUE_STATEMENT"}]}"#;
        let solutions = vec![
            Solution::new(a, 1, 3, 30, Verdict::Ok),
            Solution::new(b, 1, 4, 40, Verdict::Ok),
            Solution::new(a, 1, 1, 10, Verdict::Ok),
            Solution::new("garbage", 1, 2, 20, Verdict::Ok),
        ];
        let (unified, rejected) = unifier.unify(&solutions);
        let ids: Vec<i64> = unified.iter().map(|s| s.solution_id).collect();
        assert_eq!(ids, vec![10, 40]);
        let rejected_ids: Vec<i64> = rejected.iter().map(|(id, _)| *id).collect();
        assert_eq!(rejected_ids, vec![20]);
    }
}
