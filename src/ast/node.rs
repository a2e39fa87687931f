use serde::{Deserialize, Serialize};

/// Fixed node-kind taxonomy of the normalized syntax tree.
///
/// The declaration order is the ordinal used by fingerprints, so new kinds
/// may only be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    AnonymousClassDeclaration,
    ArrayAccess,
    ArrayCreation,
    ArrayInitializer,
    ArrayType,
    AssertStatement,
    Assignment,
    Block,
    BooleanLiteral,
    BreakStatement,
    CastExpression,
    CatchClause,
    CharacterLiteral,
    ClassInstanceCreation,
    CompilationUnit,
    ConditionalExpression,
    ConstructorInvocation,
    ContinueStatement,
    DoStatement,
    EmptyStatement,
    ExpressionStatement,
    FieldAccess,
    FieldDeclaration,
    ForStatement,
    IfStatement,
    ImportDeclaration,
    InfixExpression,
    Initializer,
    LabeledStatement,
    MethodDeclaration,
    MethodInvocation,
    NullLiteral,
    NumberLiteral,
    PackageDeclaration,
    ParenthesizedExpression,
    PostfixExpression,
    PrefixExpression,
    PrimitiveType,
    QualifiedName,
    ReturnStatement,
    SimpleName,
    SimpleType,
    SingleVariableDeclaration,
    StringLiteral,
    SuperConstructorInvocation,
    SuperFieldAccess,
    SuperMethodInvocation,
    SwitchCase,
    SwitchStatement,
    SynchronizedStatement,
    ThisExpression,
    ThrowStatement,
    TryStatement,
    TypeDeclaration,
    TypeDeclarationStatement,
    TypeLiteral,
    VariableDeclarationExpression,
    VariableDeclarationStatement,
    VariableDeclarationFragment,
    WhileStatement,
    InstanceofExpression,
    EnhancedForStatement,
    ParameterizedType,
    Modifier,
    LambdaExpression,
    MethodReference,
}

impl NodeType {
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// Classifiable attributes of one syntax-tree node, independent of position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeState {
    pub node_type: NodeType,
    pub label: Option<String>,
    pub declared_type: Option<String>,
}

impl NodeState {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            label: None,
            declared_type: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_declared_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }
}
