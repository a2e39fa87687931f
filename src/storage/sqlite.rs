use rusqlite::{Connection, Result};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Layout version stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

const PRAGMAS: [(&str, i64); 2] = [("synchronous", 1), ("cache_size", -16000)];

/// SQLite connection holding the cache tables.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let db = Database { conn };
        db.configure()?;
        db.migrate()?;
        Ok(db)
    }

    fn configure(&self) -> Result<()> {
        // In-memory databases answer "memory" and stay that way.
        let mode: String =
            self.conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        for (name, value) in PRAGMAS {
            self.conn.pragma_update(None, name, value)?;
        }
        self.conn.busy_timeout(Duration::from_secs(5))?;
        debug!("SQLite configured (journal_mode={})", mode);
        Ok(())
    }

    /// Entries are recomputable, so an older layout is dropped rather than converted.
    fn migrate(&self) -> Result<()> {
        let version = self.schema_version()?;
        if version < SCHEMA_VERSION {
            debug!("Cache schema {} is older than {}, recreating", version, SCHEMA_VERSION);
            self.conn.execute_batch("DROP TABLE IF EXISTS cache_entry;")?;
        }
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    pub fn schema_version(&self) -> Result<i64> {
        self.conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
