pub mod extractor;
pub mod generator;
pub mod matcher;

pub use extractor::ChangesExtractor;
pub use generator::{BasicChangeGenerator, ChangeGenerator};
pub use matcher::{MappingStore, MatcherOptions};

use crate::ast::{NodeId, NodeState, Tree};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Insert,
    Delete,
    Move,
    Update,
}

impl ChangeType {
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// Local neighbourhood of a change site: the node, its parent and its
/// grandparent. Any level is absent near the root or on the side of an
/// edit where the node does not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeContext {
    pub node: Option<NodeState>,
    pub parent: Option<NodeState>,
    pub parent_of_parent: Option<NodeState>,
}

impl NodeContext {
    pub fn new(
        node: Option<NodeState>,
        parent: Option<NodeState>,
        parent_of_parent: Option<NodeState>,
    ) -> Self {
        Self {
            node,
            parent,
            parent_of_parent,
        }
    }

    /// Context of an existing node.
    pub fn of(tree: &Tree, id: NodeId) -> Self {
        let parent = tree.parent(id);
        let parent_of_parent = parent.and_then(|p| tree.parent(p));
        Self {
            node: Some(tree.state(id).clone()),
            parent: parent.map(|p| tree.state(p).clone()),
            parent_of_parent: parent_of_parent.map(|p| tree.state(p).clone()),
        }
    }

    /// Context of a node that does not exist on this side of the edit but
    /// would hang below `parent`.
    pub fn missing_under(tree: &Tree, parent: Option<NodeId>) -> Self {
        Self {
            node: None,
            parent: parent.map(|p| tree.state(p).clone()),
            parent_of_parent: parent.and_then(|p| tree.parent(p)).map(|p| tree.state(p).clone()),
        }
    }
}

/// One atomic structural edit with its context before and after.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeChange {
    pub change_type: ChangeType,
    pub origin: NodeContext,
    pub destination: NodeContext,
}

impl CodeChange {
    pub fn new(change_type: ChangeType, origin: NodeContext, destination: NodeContext) -> Self {
        Self {
            change_type,
            origin,
            destination,
        }
    }
}

/// Edit script that turns the `origin_id` solution into the `target_id` one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changes {
    pub origin_id: i64,
    pub target_id: i64,
    pub changes: Vec<CodeChange>,
}

impl Changes {
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CodeChange> {
        self.changes.iter()
    }
}
