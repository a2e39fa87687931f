use mistake_clusters::ast::{NodeType, SyntaxNode, Tree};
use mistake_clusters::changes::generator::diff;
use mistake_clusters::changes::{ChangeType, CodeChange, MatcherOptions};
use mistake_clusters::hasher::HasherKind;

fn name(label: &str) -> SyntaxNode {
    SyntaxNode::new(NodeType::SimpleName).label(label)
}

fn typed_name(label: &str, declared: &str) -> SyntaxNode {
    name(label).declared_type(declared)
}

fn returning(value: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeType::ReturnStatement).child(value)
}

fn single_change(before: SyntaxNode, after: SyntaxNode) -> CodeChange {
    let changes = diff(&Tree::from(before), &Tree::from(after), &MatcherOptions::default());
    assert_eq!(changes.len(), 1, "unexpected script: {:?}", changes);
    changes.into_iter().next().unwrap()
}

#[test]
fn test_identical_changes_in_different_programs_hash_equal() {
    let first = single_change(
        SyntaxNode::new(NodeType::Block).child(returning(name("x"))),
        SyntaxNode::new(NodeType::Block).child(returning(name("y"))),
    );
    let unrelated = SyntaxNode::new(NodeType::ExpressionStatement).child(
        SyntaxNode::new(NodeType::MethodInvocation)
            .label("println")
            .child(name("a")),
    );
    let second = single_change(
        SyntaxNode::new(NodeType::Block)
            .child(unrelated.clone())
            .child(returning(name("x"))),
        SyntaxNode::new(NodeType::Block)
            .child(unrelated)
            .child(returning(name("y"))),
    );
    assert_eq!(first.change_type, ChangeType::Update);
    assert_eq!(first, second);

    for kind in HasherKind::ALL {
        let hasher = kind.change_hasher();
        assert_eq!(hasher.hash(&first), hasher.hash(&second), "{}", kind);
        assert_eq!(hasher.hash(&first), hasher.hash(&first), "{}", kind);
    }
}

#[test]
fn test_label_only_difference_separates_specific_hashers() {
    let base = || SyntaxNode::new(NodeType::Block).child(returning(name("x")));
    let to_y = single_change(base(), SyntaxNode::new(NodeType::Block).child(returning(name("y"))));
    let to_z = single_change(base(), SyntaxNode::new(NodeType::Block).child(returning(name("z"))));

    let kinds = [
        HasherKind::Weak,
        HasherKind::JavaTypes,
        HasherKind::Extended,
        HasherKind::DeepExtended,
    ];
    for kind in kinds {
        let hasher = kind.change_hasher();
        assert_eq!(hasher.hash(&to_y), hasher.hash(&to_z), "{}", kind);
    }
    for kind in [HasherKind::Full, HasherKind::FullExtended] {
        let hasher = kind.change_hasher();
        assert_ne!(hasher.hash(&to_y), hasher.hash(&to_z), "{}", kind);
    }
}

#[test]
fn test_declared_type_difference_separates_type_aware_hashers() {
    let base = || SyntaxNode::new(NodeType::Block).child(returning(typed_name("x", "int")));
    let to_long = single_change(
        base(),
        SyntaxNode::new(NodeType::Block).child(returning(typed_name("x", "long"))),
    );
    let to_char = single_change(
        base(),
        SyntaxNode::new(NodeType::Block).child(returning(typed_name("x", "char"))),
    );

    let weak = HasherKind::Weak.change_hasher();
    assert_eq!(weak.hash(&to_long), weak.hash(&to_char));
    for kind in [HasherKind::JavaTypes, HasherKind::Full, HasherKind::DeepExtended] {
        let hasher = kind.change_hasher();
        assert_ne!(hasher.hash(&to_long), hasher.hash(&to_char), "{}", kind);
    }
}

#[test]
fn test_parent_label_reaches_extended_hashers_only() {
    let call = |method: &str, arg: &str| {
        SyntaxNode::new(NodeType::Block).child(
            SyntaxNode::new(NodeType::ExpressionStatement).child(
                SyntaxNode::new(NodeType::MethodInvocation)
                    .label(method)
                    .child(name(arg)),
            ),
        )
    };
    let in_print = single_change(call("print", "a"), call("print", "b"));
    let in_exit = single_change(call("exit", "a"), call("exit", "b"));

    let full = HasherKind::Full.change_hasher();
    assert_eq!(full.hash(&in_print), full.hash(&in_exit));
    let extended = HasherKind::FullExtended.change_hasher();
    assert_ne!(extended.hash(&in_print), extended.hash(&in_exit));
}
