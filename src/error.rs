use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Unparsable source: {0}")]
    Unparsable(String),

    #[error("Invalid input for solution {solution_id}: {reason}")]
    InvalidInput { solution_id: i64, reason: String },

    #[error("No options available for cluster member {member_id}")]
    NoOptions { member_id: i64 },

    #[error("Stale cache entry for solution {query_id}: cached reference {cached_id} is not in pool {pool_key}")]
    StaleCacheEntry {
        query_id: i64,
        cached_id: i64,
        pool_key: String,
    },

    #[error("Empty reference pool {pool_key}")]
    EmptyPool { pool_key: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl Error {
    /// Identifier of the solution the failure is attributed to, when there is one.
    pub fn solution_id(&self) -> Option<i64> {
        match self {
            Error::InvalidInput { solution_id, .. } => Some(*solution_id),
            Error::NoOptions { member_id } => Some(*member_id),
            Error::StaleCacheEntry { query_id, .. } => Some(*query_id),
            _ => None,
        }
    }
}
