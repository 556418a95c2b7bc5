//! Storage errors.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("migration v{version} failed: {message}")]
    Migration { version: u32, message: String },

    /// The blob was written by a newer build than this one.
    #[error("blob '{key}' has version {found}, newest supported is {supported}")]
    UnsupportedVersion {
        key: String,
        found: u32,
        supported: u32,
    },

    #[error("upgrade from v{from} failed: {message}")]
    Upgrade { from: u32, message: String },

    /// A previous holder of the connection panicked.
    #[error("database connection poisoned")]
    Poisoned,

    /// The blocking task running a statement was cancelled or panicked.
    #[error("background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
