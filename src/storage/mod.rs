pub mod cache;
pub mod queries;
pub mod serialization;
pub mod sqlite;

pub use cache::CacheStore;
pub use sqlite::Database;
