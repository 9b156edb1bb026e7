pub mod sqlite;

pub use sqlite::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: i64 },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Document shard unavailable: {0}")]
    ShardUnavailable(String),
}
