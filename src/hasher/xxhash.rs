use crate::ast::NodeState;
use std::hash::Hasher as _;
use twox_hash::XxHash64;

pub fn hash_data(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}

/// Content hash of a source text, used to key the tree cache.
pub fn hash_text(text: &str) -> u64 {
    hash_data(text.as_bytes())
}

/// Structural hash of a node: its own state followed by the hashes of its
/// children in order. Equal hashes mean isomorphic subtrees (modulo collisions).
pub fn hash_node(state: &NodeState, child_hashes: impl IntoIterator<Item = u64>) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write_usize(state.node_type.ordinal());
    write_optional(&mut hasher, state.label.as_deref());
    write_optional(&mut hasher, state.declared_type.as_deref());
    let mut count = 0usize;
    for child in child_hashes {
        hasher.write_u64(child);
        count += 1;
    }
    hasher.write_usize(count);
    hasher.finish()
}

fn write_optional(hasher: &mut XxHash64, value: Option<&str>) {
    match value {
        // Length prefix keeps ("ab", "c") apart from ("a", "bc").
        Some(text) => {
            hasher.write_u8(1);
            hasher.write_usize(text.len());
            hasher.write(text.as_bytes());
        }
        None => hasher.write_u8(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeType;

    #[test]
    fn test_hash_node_depends_on_label() {
        let a = NodeState::new(NodeType::SimpleName).with_label("i");
        let b = NodeState::new(NodeType::SimpleName).with_label("j");
        assert_ne!(hash_node(&a, []), hash_node(&b, []));
        assert_eq!(hash_node(&a, []), hash_node(&a.clone(), []));
    }

    #[test]
    fn test_hash_node_absent_label_differs_from_empty() {
        let absent = NodeState::new(NodeType::StringLiteral);
        let empty = NodeState::new(NodeType::StringLiteral).with_label("");
        assert_ne!(hash_node(&absent, []), hash_node(&empty, []));
    }

    #[test]
    fn test_hash_node_child_order_matters() {
        let parent = NodeState::new(NodeType::Block);
        assert_ne!(hash_node(&parent, [1, 2]), hash_node(&parent, [2, 1]));
    }
}
