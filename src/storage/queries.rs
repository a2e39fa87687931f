use super::sqlite::Database;
use rusqlite::{params, OptionalExtension, Result};
use tracing::debug;

impl Database {
    pub fn get_entry(&self, index: &str, key: &str) -> Result<Option<Vec<u8>>> {
        self.connection()
            .query_row(
                "SELECT value FROM cache_entry WHERE index_name = ?1 AND key = ?2",
                params![index, key],
                |row| row.get(0),
            )
            .optional()
    }

    /// Upserts a batch of entries in a single transaction.
    pub fn put_entries(&mut self, index: &str, entries: &[(String, Vec<u8>)]) -> Result<usize> {
        let tx = self.connection_mut().transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO cache_entry (index_name, key, value) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(index_name, key) DO UPDATE SET value = excluded.value",
            )?;
            for (key, value) in entries {
                stmt.execute(params![index, key, value])?;
            }
        }
        tx.commit()?;
        debug!("Wrote {} entries to cache index {}", entries.len(), index);
        Ok(entries.len())
    }

    pub fn remove_entry(&self, index: &str, key: &str) -> Result<bool> {
        let removed = self.connection().execute(
            "DELETE FROM cache_entry WHERE index_name = ?1 AND key = ?2",
            params![index, key],
        )?;
        Ok(removed > 0)
    }

    pub fn drop_index(&self, index: &str) -> Result<usize> {
        let removed = self.connection().execute(
            "DELETE FROM cache_entry WHERE index_name = ?1",
            params![index],
        )?;
        debug!("Dropped {} entries from cache index {}", removed, index);
        Ok(removed)
    }

    pub fn count_entries(&self, index: Option<&str>) -> Result<usize> {
        let count: i64 = match index {
            Some(index) => self.connection().query_row(
                "SELECT COUNT(*) FROM cache_entry WHERE index_name = ?1",
                params![index],
                |row| row.get(0),
            )?,
            None => self
                .connection()
                .query_row("SELECT COUNT(*) FROM cache_entry", [], |row| row.get(0))?,
        };
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_roundtrip_and_upsert() {
        let mut db = Database::open_in_memory().unwrap();
        db.put_entries("refs", &[("a".into(), vec![1]), ("b".into(), vec![2])])
            .unwrap();
        db.put_entries("refs", &[("a".into(), vec![9])]).unwrap();
        assert_eq!(db.get_entry("refs", "a").unwrap(), Some(vec![9]));
        assert_eq!(db.get_entry("other", "a").unwrap(), None);
        assert_eq!(db.count_entries(Some("refs")).unwrap(), 2);
    }

    #[test]
    fn test_drop_index_is_scoped() {
        let mut db = Database::open_in_memory().unwrap();
        db.put_entries("x", &[("k".into(), vec![1])]).unwrap();
        db.put_entries("y", &[("k".into(), vec![1])]).unwrap();
        assert_eq!(db.drop_index("x").unwrap(), 1);
        assert_eq!(db.count_entries(None).unwrap(), 1);
        assert!(db.remove_entry("y", "k").unwrap());
        assert!(!db.remove_entry("y", "k").unwrap());
    }
}
