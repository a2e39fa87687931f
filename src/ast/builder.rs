use super::tree::{SyntaxNode, Tree};
use crate::error::{Error, Result};
use crate::hasher::xxhash;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

/// Turns source text into a normalized syntax tree.
pub trait TreeBuilder: Send + Sync {
    fn build_tree(&self, code: &str) -> Result<Arc<Tree>>;
}

impl<B: TreeBuilder + ?Sized> TreeBuilder for Arc<B> {
    fn build_tree(&self, code: &str) -> Result<Arc<Tree>> {
        (**self).build_tree(code)
    }
}

/// Reads trees that an external parser already serialized as nested JSON
/// (see [`SyntaxNode`]).
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTreeBuilder;

impl TreeBuilder for JsonTreeBuilder {
    fn build_tree(&self, code: &str) -> Result<Arc<Tree>> {
        let syntax: SyntaxNode =
            serde_json::from_str(code).map_err(|e| Error::Unparsable(e.to_string()))?;
        Ok(Arc::new(Tree::from(&syntax)))
    }
}

/// Memoizes another builder by content hash, so identical code is parsed once.
pub struct CachedTreeBuilder<B> {
    inner: B,
    cache: DashMap<u64, Arc<Tree>>,
}

impl<B: TreeBuilder> CachedTreeBuilder<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl<B: TreeBuilder> TreeBuilder for CachedTreeBuilder<B> {
    fn build_tree(&self, code: &str) -> Result<Arc<Tree>> {
        let key = xxhash::hash_text(code);
        if let Some(tree) = self.cache.get(&key) {
            trace!("Tree cache hit for {:016x}", key);
            return Ok(Arc::clone(tree.value()));
        }
        let tree = self.inner.build_tree(code)?;
        self.cache.insert(key, Arc::clone(&tree));
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBuilder {
        calls: AtomicUsize,
    }

    impl TreeBuilder for CountingBuilder {
        fn build_tree(&self, code: &str) -> Result<Arc<Tree>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            JsonTreeBuilder.build_tree(code)
        }
    }

    #[test]
    fn test_json_builder_reads_nested_tree() {
        let code = r#"{"type":"BLOCK","children":[{"type":"SIMPLE_NAME","label":"x","declared_type":"int"}]}"#;
        let tree = JsonTreeBuilder.build_tree(code).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.state(1).label.as_deref(), Some("x"));
        assert_eq!(tree.state(1).declared_type.as_deref(), Some("int"));
    }

    #[test]
    fn test_json_builder_rejects_garbage() {
        let err = JsonTreeBuilder.build_tree("class A {").unwrap_err();
        assert!(matches!(err, Error::Unparsable(_)));
    }

    #[test]
    fn test_cached_builder_parses_identical_code_once() {
        let builder = CachedTreeBuilder::new(CountingBuilder {
            calls: AtomicUsize::new(0),
        });
        let code = r#"{"type":"BREAK_STATEMENT"}"#;
        let first = builder.build_tree(code).unwrap();
        let second = builder.build_tree(code).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builder.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(builder.len(), 1);
    }
}
