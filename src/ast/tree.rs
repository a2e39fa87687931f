use super::node::{NodeState, NodeType};
use crate::hasher::xxhash;
use serde::{Deserialize, Serialize};
use std::ops::Range;

pub type NodeId = usize;

/// Nested, serde-friendly form of a syntax tree as handed over by a parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxNode {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            label: None,
            declared_type: None,
            children: Vec::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn declared_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }

    pub fn child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }

    fn state(&self) -> NodeState {
        NodeState {
            node_type: self.node_type,
            label: self.label.clone(),
            declared_type: self.declared_type.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub state: NodeState,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Structural hash of the subtree rooted here.
    pub hash: u64,
    /// Leaves have height 1.
    pub height: usize,
    /// Number of nodes in the subtree, this one included.
    pub size: usize,
}

/// Immutable syntax tree stored as a preorder arena.
///
/// Node ids are preorder positions, so the root is 0 and the descendants of
/// `id` occupy the contiguous range `id + 1 .. id + size`.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn root(&self) -> NodeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn state(&self, id: NodeId) -> &NodeState {
        &self.nodes[id].state
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id].children.is_empty()
    }

    pub fn preorder(&self) -> Range<NodeId> {
        0..self.nodes.len()
    }

    pub fn descendants(&self, id: NodeId) -> Range<NodeId> {
        id + 1..id + self.nodes[id].size
    }

    /// Position of `id` among its parent's children.
    pub fn child_position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn structure_hash(&self) -> u64 {
        self.nodes[0].hash
    }

    /// Node-by-node equality of shape, types, labels and declared types.
    pub fn deep_equals(&self, other: &Tree) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.nodes.iter().zip(&other.nodes).all(|(a, b)| {
                a.state == b.state && a.children.len() == b.children.len()
            })
    }

    pub fn to_syntax(&self) -> SyntaxNode {
        self.syntax_at(self.root())
    }

    fn syntax_at(&self, id: NodeId) -> SyntaxNode {
        let state = self.state(id);
        SyntaxNode {
            node_type: state.node_type,
            label: state.label.clone(),
            declared_type: state.declared_type.clone(),
            children: self.children(id).iter().map(|&c| self.syntax_at(c)).collect(),
        }
    }
}

impl From<&SyntaxNode> for Tree {
    fn from(root: &SyntaxNode) -> Self {
        let mut nodes: Vec<Node> = Vec::new();
        // Explicit stack keeps deep trees off the call stack.
        let mut stack: Vec<(&SyntaxNode, Option<NodeId>)> = vec![(root, None)];
        while let Some((syntax, parent)) = stack.pop() {
            let id = nodes.len();
            nodes.push(Node {
                state: syntax.state(),
                parent,
                children: Vec::with_capacity(syntax.children.len()),
                hash: 0,
                height: 1,
                size: 1,
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(id);
            }
            for child in syntax.children.iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        // Children always have larger ids than their parent.
        for id in (0..nodes.len()).rev() {
            let children = nodes[id].children.clone();
            let hash = xxhash::hash_node(&nodes[id].state, children.iter().map(|&c| nodes[c].hash));
            let height = 1 + children.iter().map(|&c| nodes[c].height).max().unwrap_or(0);
            let size = 1 + children.iter().map(|&c| nodes[c].size).sum::<usize>();
            let node = &mut nodes[id];
            node.hash = hash;
            node.height = height;
            node.size = size;
        }

        Tree { nodes }
    }
}

impl From<SyntaxNode> for Tree {
    fn from(root: SyntaxNode) -> Self {
        Tree::from(&root)
    }
}
