//! Context fingerprints of code changes.
//!
//! Every hasher is plain data: a tag followed by "extract-and-hash" steps.
//! The six change hashers differ only in which node-state fields they pick
//! at each level of the context, from `weak` (types only) to `deep-extended`.

pub mod xxhash;

use crate::ast::NodeState;
use crate::changes::{CodeChange, NodeContext};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Joins hashed fields. Unit separator never occurs in source-derived tokens.
pub const TOKEN_SEPARATOR: char = '\u{1f}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    Type,
    Label,
    DeclaredType,
}

/// Selects and joins fields of a single node state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHasher {
    pub tag: &'static str,
    pub fields: &'static [StateField],
}

impl StateHasher {
    /// Absent states hash to the empty string, which no present state does.
    pub fn hash(&self, state: Option<&NodeState>, out: &mut String) {
        let Some(state) = state else {
            return;
        };
        out.push_str(self.tag);
        for field in self.fields {
            out.push(TOKEN_SEPARATOR);
            match field {
                StateField::Type => out.push_str(&state.node_type.ordinal().to_string()),
                StateField::Label => out.push_str(state.label.as_deref().unwrap_or_default()),
                StateField::DeclaredType => {
                    out.push_str(state.declared_type.as_deref().unwrap_or_default())
                }
            }
        }
    }
}

pub const TYPE_ONLY_STATE: StateHasher = StateHasher {
    tag: "TOS",
    fields: &[StateField::Type],
};
pub const LABEL_STATE: StateHasher = StateHasher {
    tag: "LNS",
    fields: &[StateField::Type, StateField::Label],
};
pub const DECLARED_TYPE_STATE: StateHasher = StateHasher {
    tag: "JNS",
    fields: &[StateField::Type, StateField::DeclaredType],
};
pub const FULL_STATE: StateHasher = StateHasher {
    tag: "FNS",
    fields: &[StateField::Type, StateField::Label, StateField::DeclaredType],
};

/// Hashes the three levels of a [`NodeContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextHasher {
    pub tag: &'static str,
    pub node: StateHasher,
    pub parent: StateHasher,
    pub parent_of_parent: StateHasher,
}

impl ContextHasher {
    pub fn hash(&self, context: &NodeContext, out: &mut String) {
        out.push_str(self.tag);
        out.push(TOKEN_SEPARATOR);
        self.node.hash(context.node.as_ref(), out);
        out.push(TOKEN_SEPARATOR);
        self.parent.hash(context.parent.as_ref(), out);
        out.push(TOKEN_SEPARATOR);
        self.parent_of_parent.hash(context.parent_of_parent.as_ref(), out);
    }
}

pub const WEAK_CONTEXT: ContextHasher = ContextHasher {
    tag: "TOC",
    node: TYPE_ONLY_STATE,
    parent: TYPE_ONLY_STATE,
    parent_of_parent: TYPE_ONLY_STATE,
};
pub const JAVA_TYPES_CONTEXT: ContextHasher = ContextHasher {
    tag: "JTC",
    node: DECLARED_TYPE_STATE,
    parent: TYPE_ONLY_STATE,
    parent_of_parent: TYPE_ONLY_STATE,
};
pub const FULL_CONTEXT: ContextHasher = ContextHasher {
    tag: "FCC",
    node: FULL_STATE,
    parent: TYPE_ONLY_STATE,
    parent_of_parent: TYPE_ONLY_STATE,
};
pub const EXTENDED_CONTEXT: ContextHasher = ContextHasher {
    tag: "ECC",
    node: DECLARED_TYPE_STATE,
    parent: LABEL_STATE,
    parent_of_parent: TYPE_ONLY_STATE,
};
pub const FULL_EXTENDED_CONTEXT: ContextHasher = ContextHasher {
    tag: "FEC",
    node: FULL_STATE,
    parent: LABEL_STATE,
    parent_of_parent: TYPE_ONLY_STATE,
};
pub const DEEP_EXTENDED_CONTEXT: ContextHasher = ContextHasher {
    tag: "DEC",
    node: DECLARED_TYPE_STATE,
    parent: LABEL_STATE,
    parent_of_parent: LABEL_STATE,
};

/// Deterministic digest of a change under one hasher variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Comma-separated token rendering with quotes and commas stripped from
    /// the fields, for tabular export.
    pub fn tokens(&self) -> String {
        self.0
            .chars()
            .filter(|c| !matches!(c, ',' | '\'' | '"'))
            .map(|c| if c == TOKEN_SEPARATOR { ',' } else { c })
            .collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens())
    }
}

/// Hasher variants ordered from least to most specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HasherKind {
    Weak,
    JavaTypes,
    Full,
    Extended,
    FullExtended,
    DeepExtended,
}

impl HasherKind {
    pub const ALL: [HasherKind; 6] = [
        HasherKind::Weak,
        HasherKind::JavaTypes,
        HasherKind::Full,
        HasherKind::Extended,
        HasherKind::FullExtended,
        HasherKind::DeepExtended,
    ];

    pub fn context_hasher(self) -> ContextHasher {
        match self {
            HasherKind::Weak => WEAK_CONTEXT,
            HasherKind::JavaTypes => JAVA_TYPES_CONTEXT,
            HasherKind::Full => FULL_CONTEXT,
            HasherKind::Extended => EXTENDED_CONTEXT,
            HasherKind::FullExtended => FULL_EXTENDED_CONTEXT,
            HasherKind::DeepExtended => DEEP_EXTENDED_CONTEXT,
        }
    }

    pub fn change_hasher(self) -> ChangeHasher {
        ChangeHasher::new(self.context_hasher())
    }

    pub fn name(self) -> &'static str {
        match self {
            HasherKind::Weak => "weak",
            HasherKind::JavaTypes => "java-types",
            HasherKind::Full => "full",
            HasherKind::Extended => "extended",
            HasherKind::FullExtended => "full-extended",
            HasherKind::DeepExtended => "deep-extended",
        }
    }
}

impl Default for HasherKind {
    fn default() -> Self {
        HasherKind::Full
    }
}

impl fmt::Display for HasherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Change type, then origin context, then destination context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeHasher {
    context: ContextHasher,
}

impl ChangeHasher {
    pub fn new(context: ContextHasher) -> Self {
        Self { context }
    }

    pub fn hash(&self, change: &CodeChange) -> Fingerprint {
        let mut out = String::with_capacity(64);
        out.push_str("CCE");
        out.push(TOKEN_SEPARATOR);
        out.push_str("CT");
        out.push_str(&change.change_type.ordinal().to_string());
        out.push(TOKEN_SEPARATOR);
        self.context.hash(&change.origin, &mut out);
        out.push(TOKEN_SEPARATOR);
        self.context.hash(&change.destination, &mut out);
        Fingerprint(out)
    }
}
