use super::{ReferencePool, ReferenceSelector};
use crate::error::{Error, Result};
use crate::model::Solution;
use crate::storage::CacheStore;
use std::sync::Arc;
use tracing::trace;

pub const DEFAULT_INDEX: &str = "references";

/// Remembers the reference chosen for each (pool, query) pair in a
/// [`CacheStore`] index. Entries live until invalidated or the index is dropped.
pub struct CachedSelector<S> {
    inner: S,
    store: Arc<CacheStore>,
    index: String,
}

impl<S: ReferenceSelector> CachedSelector<S> {
    pub fn new(inner: S, store: Arc<CacheStore>) -> Self {
        Self::with_index(inner, store, DEFAULT_INDEX)
    }

    pub fn with_index(inner: S, store: Arc<CacheStore>, index: impl Into<String>) -> Self {
        Self {
            inner,
            store,
            index: index.into(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    fn key(pool: &ReferencePool, query: &Solution) -> String {
        format!("{}|{}", pool.key(), query.solution_id)
    }
}

impl<S: ReferenceSelector> ReferenceSelector for CachedSelector<S> {
    fn select(&self, pool: &ReferencePool, query: &Solution) -> Result<Solution> {
        let key = Self::key(pool, query);
        if let Some(bytes) = self.store.get(&self.index, &key)? {
            let cached_id: i64 = bincode::deserialize(&bytes)?;
            trace!("Found reference for {} in cache", query.solution_id);
            return pool
                .get(cached_id)
                .cloned()
                .ok_or_else(|| Error::StaleCacheEntry {
                    query_id: query.solution_id,
                    cached_id,
                    pool_key: pool.key().to_string(),
                });
        }

        let chosen = self.inner.select(pool, query)?;
        trace!("No reference for {} in cache, adding", query.solution_id);
        self.store
            .put(&self.index, &key, bincode::serialize(&chosen.solution_id)?)?;
        Ok(chosen)
    }

    fn invalidate(&self, pool: &ReferencePool, query: &Solution) -> Result<()> {
        self.store.remove(&self.index, &Self::key(pool, query))?;
        self.inner.invalidate(pool, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Verdict;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FirstSelector {
        calls: AtomicUsize,
    }

    impl ReferenceSelector for FirstSelector {
        fn select(&self, pool: &ReferencePool, _query: &Solution) -> Result<Solution> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(pool.solutions()[0].clone())
        }
    }

    fn ok(id: i64) -> Solution {
        Solution::new("", 1, id, id, Verdict::Ok)
    }

    #[test]
    fn test_second_select_is_served_from_cache() {
        let store = Arc::new(CacheStore::in_memory().unwrap());
        let selector = CachedSelector::new(
            FirstSelector {
                calls: AtomicUsize::new(0),
            },
            store,
        );
        let pool = ReferencePool::with_key("p", vec![ok(1), ok(2)]);
        let query = Solution::new("", 1, 7, 70, Verdict::Fail);
        assert_eq!(selector.select(&pool, &query).unwrap().solution_id, 1);
        assert_eq!(selector.select(&pool, &query).unwrap().solution_id, 1);
        assert_eq!(selector.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stale_entry_is_reported_then_invalidated() {
        let store = Arc::new(CacheStore::in_memory().unwrap());
        store
            .put(DEFAULT_INDEX, "p|70", bincode::serialize(&99i64).unwrap())
            .unwrap();
        let selector = CachedSelector::new(
            FirstSelector {
                calls: AtomicUsize::new(0),
            },
            store,
        );
        let pool = ReferencePool::with_key("p", vec![ok(1)]);
        let query = Solution::new("", 1, 7, 70, Verdict::Fail);
        let err = selector.select(&pool, &query).unwrap_err();
        assert!(matches!(err, Error::StaleCacheEntry { cached_id: 99, .. }));

        selector.invalidate(&pool, &query).unwrap();
        assert_eq!(selector.select(&pool, &query).unwrap().solution_id, 1);
    }
}
