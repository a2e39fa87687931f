use super::matcher::{self, MappingStore, MatcherOptions};
use super::{ChangeType, Changes, CodeChange, NodeContext};
use crate::ast::{NodeId, Tree, TreeBuilder};
use crate::error::{Error, Result};
use crate::model::Solution;
use std::sync::Arc;

/// Computes the edit script that turns one solution into another.
pub trait ChangeGenerator: Send + Sync {
    fn changes(&self, origin: &Solution, target: &Solution) -> Result<Changes>;
}

pub struct BasicChangeGenerator {
    builder: Arc<dyn TreeBuilder>,
    options: MatcherOptions,
}

impl BasicChangeGenerator {
    pub fn new(builder: Arc<dyn TreeBuilder>) -> Self {
        Self {
            builder,
            options: MatcherOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MatcherOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &MatcherOptions {
        &self.options
    }

    pub fn tree(&self, solution: &Solution) -> Result<Arc<Tree>> {
        self.builder
            .build_tree(&solution.code)
            .map_err(|err| Error::InvalidInput {
                solution_id: solution.solution_id,
                reason: err.to_string(),
            })
    }
}

impl ChangeGenerator for BasicChangeGenerator {
    fn changes(&self, origin: &Solution, target: &Solution) -> Result<Changes> {
        let before = self.tree(origin)?;
        let after = self.tree(target)?;
        Ok(Changes {
            origin_id: origin.solution_id,
            target_id: target.solution_id,
            changes: diff(&before, &after, &self.options),
        })
    }
}

/// Edit script turning `reference` into `target`.
///
/// Order: deletions (reference preorder), then updates and moves (reference
/// preorder), then insertions (target preorder).
pub fn diff(reference: &Tree, target: &Tree, options: &MatcherOptions) -> Vec<CodeChange> {
    let mappings = matcher::match_trees(reference, target, options);
    edit_script(reference, target, &mappings)
}

fn edit_script(src: &Tree, dst: &Tree, mappings: &MappingStore) -> Vec<CodeChange> {
    let moved = moved_nodes(src, dst, mappings);
    let mut deletions = Vec::new();
    let mut updates = Vec::new();
    let mut insertions = Vec::new();

    for s in src.preorder() {
        match mappings.dst(s) {
            None => {
                let partner_parent = src.parent(s).and_then(|p| mappings.dst(p));
                deletions.push(CodeChange::new(
                    ChangeType::Delete,
                    NodeContext::of(src, s),
                    NodeContext::missing_under(dst, partner_parent),
                ));
            }
            Some(d) => {
                let (before, after) = (src.state(s), dst.state(d));
                if before.label != after.label || before.declared_type != after.declared_type {
                    updates.push(CodeChange::new(
                        ChangeType::Update,
                        NodeContext::of(src, s),
                        NodeContext::of(dst, d),
                    ));
                }
                if moved[s] {
                    updates.push(CodeChange::new(
                        ChangeType::Move,
                        NodeContext::of(src, s),
                        NodeContext::of(dst, d),
                    ));
                }
            }
        }
    }

    for d in dst.preorder() {
        if mappings.has_dst(d) {
            continue;
        }
        let partner_parent = dst.parent(d).and_then(|p| mappings.src(p));
        insertions.push(CodeChange::new(
            ChangeType::Insert,
            NodeContext::missing_under(src, partner_parent),
            NodeContext::of(dst, d),
        ));
    }

    deletions.extend(updates);
    deletions.extend(insertions);
    deletions
}

/// A matched node moved when its parent is not matched to its partner's
/// parent, or when it falls outside the longest order-preserving alignment
/// of its matched siblings.
fn moved_nodes(src: &Tree, dst: &Tree, mappings: &MappingStore) -> Vec<bool> {
    let mut moved = vec![false; src.len()];

    for (s, d) in mappings.pairs() {
        match (src.parent(s), dst.parent(d)) {
            (Some(ps), Some(pd)) => moved[s] = mappings.dst(ps) != Some(pd),
            (None, None) => {}
            _ => moved[s] = true,
        }
    }

    for (s, d) in mappings.pairs() {
        let src_seq: Vec<NodeId> = src
            .children(s)
            .iter()
            .copied()
            .filter(|&c| mappings.dst(c).map_or(false, |e| dst.parent(e) == Some(d)))
            .collect();
        let dst_seq: Vec<NodeId> = dst
            .children(d)
            .iter()
            .copied()
            .filter(|&e| mappings.src(e).map_or(false, |c| src.parent(c) == Some(s)))
            .collect();
        let aligned = lcs(&src_seq, &dst_seq, |c, e| mappings.dst(c) == Some(e));
        for c in src_seq {
            if !aligned.contains(&c) {
                moved[c] = true;
            }
        }
    }

    moved
}

/// Elements of `left` that belong to a longest common subsequence.
fn lcs(left: &[NodeId], right: &[NodeId], same: impl Fn(NodeId, NodeId) -> bool) -> Vec<NodeId> {
    let (n, m) = (left.len(), right.len());
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if same(left[i], right[j]) {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut result = Vec::with_capacity(table[0][0]);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if same(left[i], right[j]) {
            result.push(left[i]);
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    result
}
