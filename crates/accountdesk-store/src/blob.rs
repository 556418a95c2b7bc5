//! Named text blobs, the durable equivalent of browser local storage.
//!
//! Each key holds one UTF-8 value, overwritten as a whole on every write.
//! [`crate::Persisted`] stores one JSON document per key on top of this.

use chrono::Utc;
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::StoreResult;

/// Key-value access to the `blobs` table.
#[derive(Clone)]
pub struct BlobStore {
    db: Database,
}

impl BlobStore {
    /// Create a blob store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get the value stored under `key`, returning `None` if absent.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let key = key.to_string();
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT value FROM blobs WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get(0),
                );
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }

    /// Insert or replace the value under `key`.
    #[instrument(skip(self, value), fields(len = value.len()))]
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let key = key.to_string();
        let value = value.to_string();
        let now = Utc::now().timestamp();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO blobs (key, value, updated_at) VALUES (?1, ?2, ?3) \
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
                     updated_at = excluded.updated_at",
                    rusqlite::params![key, value, now],
                )?;
                debug!(key = %key, "blob written");
                Ok(())
            })
            .await
    }

    /// Delete a key, returning `true` if it existed.
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> StoreResult<bool> {
        let key = key.to_string();
        self.db
            .execute(move |conn| {
                let deleted =
                    conn.execute("DELETE FROM blobs WHERE key = ?1", rusqlite::params![key])?;
                Ok(deleted > 0)
            })
            .await
    }

    /// List all stored keys in lexical order.
    pub async fn keys(&self) -> StoreResult<Vec<String>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn.prepare("SELECT key FROM blobs ORDER BY key ASC")?;
                let keys = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────
