pub mod builder;
pub mod node;
pub mod tree;

pub use builder::{CachedTreeBuilder, JsonTreeBuilder, TreeBuilder};
pub use node::{NodeState, NodeType};
pub use tree::{Node, NodeId, SyntaxNode, Tree};
