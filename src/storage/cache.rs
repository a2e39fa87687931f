use super::sqlite::Database;
use crate::error::{Error, Result};
use ahash::AHashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, trace};

pub const DEFAULT_FLUSH_EVERY: usize = 64;

struct CacheState {
    db: Database,
    pending: AHashMap<(String, String), Vec<u8>>,
}

/// Persistent key-value store partitioned by index name.
///
/// Writes are buffered and reach SQLite when the buffer holds
/// `flush_every` entries, on [`CacheStore::flush`], on [`CacheStore::close`]
/// and when the store is dropped. Reads see buffered writes.
pub struct CacheStore {
    state: Mutex<CacheState>,
    flush_every: usize,
}

impl CacheStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!("Opening cache store at {}", path.display());
        Ok(Self::with_database(Database::open(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::with_database(Database::open_in_memory()?))
    }

    fn with_database(db: Database) -> Self {
        Self {
            state: Mutex::new(CacheState {
                db,
                pending: AHashMap::new(),
            }),
            flush_every: DEFAULT_FLUSH_EVERY,
        }
    }

    pub fn with_flush_every(mut self, flush_every: usize) -> Self {
        self.flush_every = flush_every.max(1);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, CacheState>> {
        self.state
            .lock()
            .map_err(|e| Error::Cache(format!("Failed to lock cache: {}", e)))
    }

    pub fn get(&self, index: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let state = self.lock()?;
        if let Some(value) = state.pending.get(&(index.to_string(), key.to_string())) {
            trace!("Pending hit for {}/{}", index, key);
            return Ok(Some(value.clone()));
        }
        Ok(state.db.get_entry(index, key)?)
    }

    pub fn put(&self, index: &str, key: &str, value: Vec<u8>) -> Result<()> {
        let mut state = self.lock()?;
        state
            .pending
            .insert((index.to_string(), key.to_string()), value);
        if state.pending.len() >= self.flush_every {
            Self::flush_locked(&mut state)?;
        }
        Ok(())
    }

    pub fn remove(&self, index: &str, key: &str) -> Result<bool> {
        let mut state = self.lock()?;
        let buffered = state
            .pending
            .remove(&(index.to_string(), key.to_string()))
            .is_some();
        let stored = state.db.remove_entry(index, key)?;
        Ok(buffered || stored)
    }

    /// Removes every entry of one index.
    pub fn drop_index(&self, index: &str) -> Result<usize> {
        let mut state = self.lock()?;
        let before = state.pending.len();
        state.pending.retain(|(i, _), _| i != index);
        let buffered = before - state.pending.len();
        Ok(buffered + state.db.drop_index(index)?)
    }

    /// Stored entry count for one index, or for all of them. Flushes first.
    pub fn count(&self, index: Option<&str>) -> Result<usize> {
        let mut state = self.lock()?;
        Self::flush_locked(&mut state)?;
        Ok(state.db.count_entries(index)?)
    }

    pub fn flush(&self) -> Result<()> {
        let mut state = self.lock()?;
        Self::flush_locked(&mut state)
    }

    pub fn close(self) -> Result<()> {
        self.flush()
    }

    fn flush_locked(state: &mut CacheState) -> Result<()> {
        if state.pending.is_empty() {
            return Ok(());
        }
        let mut by_index: AHashMap<String, Vec<(String, Vec<u8>)>> = AHashMap::new();
        for ((index, key), value) in state.pending.drain() {
            by_index.entry(index).or_default().push((key, value));
        }
        for (index, entries) in by_index {
            state.db.put_entries(&index, &entries)?;
        }
        Ok(())
    }
}

impl Drop for CacheStore {
    fn drop(&mut self) {
        let state = match self.state.get_mut() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = Self::flush_locked(state) {
            error!("Failed to flush cache on drop: {}", e);
        }
    }
}
