//! Node matching between a reference tree and a target tree.
//!
//! Three passes, each only ever pairing nodes of the same type:
//! 1. top-down: isomorphic subtrees (equal structural hash), tallest first;
//! 2. bottom-up: inner nodes whose matched descendants overlap enough (dice);
//! 3. recovery: leftover children of matched parents, by state then by position.

use crate::ast::{NodeId, Tree};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherOptions {
    /// Subtrees lower than this are left to the later passes.
    pub min_height: usize,
    /// Minimum dice coefficient for a bottom-up match.
    pub min_dice: f64,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            min_height: 2,
            min_dice: 0.5,
        }
    }
}

/// One-to-one mapping between reference (src) and target (dst) node ids.
#[derive(Debug, Clone)]
pub struct MappingStore {
    src_to_dst: Vec<Option<NodeId>>,
    dst_to_src: Vec<Option<NodeId>>,
}

impl MappingStore {
    fn new(src_len: usize, dst_len: usize) -> Self {
        Self {
            src_to_dst: vec![None; src_len],
            dst_to_src: vec![None; dst_len],
        }
    }

    fn link(&mut self, src: NodeId, dst: NodeId) {
        self.src_to_dst[src] = Some(dst);
        self.dst_to_src[dst] = Some(src);
    }

    pub fn dst(&self, src: NodeId) -> Option<NodeId> {
        self.src_to_dst[src]
    }

    pub fn src(&self, dst: NodeId) -> Option<NodeId> {
        self.dst_to_src[dst]
    }

    pub fn has_src(&self, src: NodeId) -> bool {
        self.src_to_dst[src].is_some()
    }

    pub fn has_dst(&self, dst: NodeId) -> bool {
        self.dst_to_src[dst].is_some()
    }

    pub fn len(&self) -> usize {
        self.src_to_dst.iter().filter(|d| d.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matched pairs in reference preorder.
    pub fn pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.src_to_dst
            .iter()
            .enumerate()
            .filter_map(|(s, d)| d.map(|d| (s, d)))
    }
}

pub fn match_trees(src: &Tree, dst: &Tree, options: &MatcherOptions) -> MappingStore {
    let mut mappings = MappingStore::new(src.len(), dst.len());
    if src.is_empty() || dst.is_empty() {
        return mappings;
    }
    top_down(src, dst, options, &mut mappings);
    bottom_up(src, dst, options, &mut mappings);
    recover(src, dst, &mut mappings);
    mappings
}

fn top_down(src: &Tree, dst: &Tree, options: &MatcherOptions, mappings: &mut MappingStore) {
    let mut dst_by_hash: AHashMap<u64, Vec<NodeId>> = AHashMap::new();
    for d in dst.preorder() {
        if dst.node(d).height >= options.min_height {
            dst_by_hash.entry(dst.node(d).hash).or_default().push(d);
        }
    }

    let mut candidates: Vec<NodeId> = src
        .preorder()
        .filter(|&s| src.node(s).height >= options.min_height)
        .collect();
    candidates.sort_by(|&a, &b| {
        src.node(b)
            .height
            .cmp(&src.node(a).height)
            .then(a.cmp(&b))
    });

    for s in candidates {
        if mappings.has_src(s) {
            continue;
        }
        let Some(same_hash) = dst_by_hash.get(&src.node(s).hash) else {
            continue;
        };
        let free: Vec<NodeId> = same_hash
            .iter()
            .copied()
            .filter(|&d| !mappings.has_dst(d))
            .collect();
        // Several isomorphic candidates: prefer the one sitting in the same spot.
        let chosen = free
            .iter()
            .copied()
            .find(|&d| same_surroundings(src, s, dst, d))
            .or_else(|| free.first().copied());
        if let Some(d) = chosen {
            link_subtrees(src, s, dst, d, mappings);
        }
    }
}

fn same_surroundings(src: &Tree, s: NodeId, dst: &Tree, d: NodeId) -> bool {
    match (src.parent(s), dst.parent(d)) {
        (Some(ps), Some(pd)) => {
            src.state(ps).node_type == dst.state(pd).node_type
                && src.child_position(s) == dst.child_position(d)
        }
        (None, None) => true,
        _ => false,
    }
}

/// Maps two isomorphic subtrees node by node. Both are contiguous preorder
/// ranges of the same shape.
fn link_subtrees(src: &Tree, s: NodeId, dst: &Tree, d: NodeId, mappings: &mut MappingStore) {
    let size = src.node(s).size;
    if size != dst.node(d).size {
        // hash collision
        return;
    }
    let same_states = (0..size).all(|i| src.state(s + i) == dst.state(d + i));
    if !same_states {
        return;
    }
    for i in 0..size {
        mappings.link(s + i, d + i);
    }
}

fn bottom_up(src: &Tree, dst: &Tree, options: &MatcherOptions, mappings: &mut MappingStore) {
    // Children have larger ids, so reverse preorder visits them before parents.
    for s in src.preorder().rev() {
        if mappings.has_src(s) || src.is_leaf(s) {
            continue;
        }
        let mut best: Option<(NodeId, f64)> = None;
        for d in bottom_up_candidates(src, s, dst, mappings) {
            let similarity = dice(src, s, dst, d, mappings);
            if best.map_or(true, |(_, current)| similarity > current) {
                best = Some((d, similarity));
            }
        }
        if let Some((d, similarity)) = best {
            if similarity >= options.min_dice {
                mappings.link(s, d);
            }
        }
    }

    let (src_root, dst_root) = (src.root(), dst.root());
    if !mappings.has_src(src_root)
        && !mappings.has_dst(dst_root)
        && src.state(src_root).node_type == dst.state(dst_root).node_type
    {
        mappings.link(src_root, dst_root);
    }
}

/// Unmatched target ancestors (of the right type) of the partners of `s`'s
/// matched descendants.
fn bottom_up_candidates(
    src: &Tree,
    s: NodeId,
    dst: &Tree,
    mappings: &MappingStore,
) -> BTreeSet<NodeId> {
    let node_type = src.state(s).node_type;
    let mut candidates = BTreeSet::new();
    for x in src.descendants(s) {
        let Some(mut d) = mappings.dst(x) else {
            continue;
        };
        while let Some(parent) = dst.parent(d) {
            if !mappings.has_dst(parent) && dst.state(parent).node_type == node_type {
                candidates.insert(parent);
            }
            d = parent;
        }
    }
    candidates
}

fn dice(src: &Tree, s: NodeId, dst: &Tree, d: NodeId, mappings: &MappingStore) -> f64 {
    let src_count = src.descendants(s).len();
    let dst_range = dst.descendants(d);
    let total = src_count + dst_range.len();
    if total == 0 {
        return 0.0;
    }
    let common = src
        .descendants(s)
        .filter(|&x| mappings.dst(x).map_or(false, |y| dst_range.contains(&y)))
        .count();
    2.0 * common as f64 / total as f64
}

fn recover(src: &Tree, dst: &Tree, mappings: &mut MappingStore) {
    let mut queue: VecDeque<(NodeId, NodeId)> = mappings.pairs().collect();
    while let Some((s, d)) = queue.pop_front() {
        let free_src: Vec<NodeId> = src
            .children(s)
            .iter()
            .copied()
            .filter(|&c| !mappings.has_src(c))
            .collect();
        if free_src.is_empty() {
            continue;
        }
        let mut free_dst: Vec<NodeId> = dst
            .children(d)
            .iter()
            .copied()
            .filter(|&e| !mappings.has_dst(e))
            .collect();

        for exact in [true, false] {
            for &c in &free_src {
                if mappings.has_src(c) {
                    continue;
                }
                let position = free_dst.iter().position(|&e| {
                    if exact {
                        src.state(c) == dst.state(e)
                    } else {
                        src.state(c).node_type == dst.state(e).node_type
                    }
                });
                if let Some(position) = position {
                    let e = free_dst.remove(position);
                    if src.node(c).hash == dst.node(e).hash {
                        link_subtrees(src, c, dst, e, mappings);
                    }
                    if !mappings.has_src(c) {
                        mappings.link(c, e);
                    }
                    queue.push_back((c, e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeType, SyntaxNode};

    fn name(label: &str) -> SyntaxNode {
        SyntaxNode::new(NodeType::SimpleName).label(label)
    }

    fn ret(label: &str) -> SyntaxNode {
        SyntaxNode::new(NodeType::ReturnStatement).child(name(label))
    }

    #[test]
    fn test_identical_trees_fully_matched() {
        let syntax = SyntaxNode::new(NodeType::Block).child(ret("x")).child(ret("y"));
        let a = Tree::from(&syntax);
        let b = Tree::from(&syntax);
        let mappings = match_trees(&a, &b, &MatcherOptions::default());
        assert_eq!(mappings.len(), a.len());
        assert!(mappings.pairs().all(|(s, d)| s == d));
    }

    #[test]
    fn test_relabeled_leaf_matched_by_recovery() {
        let a = Tree::from(SyntaxNode::new(NodeType::Block).child(ret("x")));
        let b = Tree::from(SyntaxNode::new(NodeType::Block).child(ret("y")));
        let mappings = match_trees(&a, &b, &MatcherOptions::default());
        assert_eq!(mappings.dst(2), Some(2));
        assert_eq!(mappings.len(), 3);
    }

    #[test]
    fn test_swapped_subtrees_follow_content() {
        let a = Tree::from(SyntaxNode::new(NodeType::Block).child(ret("x")).child(ret("y")));
        let b = Tree::from(SyntaxNode::new(NodeType::Block).child(ret("y")).child(ret("x")));
        let mappings = match_trees(&a, &b, &MatcherOptions::default());
        // return x (src 1) ends up second in the target (dst 3)
        assert_eq!(mappings.dst(1), Some(3));
        assert_eq!(mappings.dst(3), Some(1));
    }

    #[test]
    fn test_different_root_types_stay_unmatched() {
        let a = Tree::from(SyntaxNode::new(NodeType::Block));
        let b = Tree::from(SyntaxNode::new(NodeType::BreakStatement));
        let mappings = match_trees(&a, &b, &MatcherOptions::default());
        assert!(mappings.is_empty());
    }
}
