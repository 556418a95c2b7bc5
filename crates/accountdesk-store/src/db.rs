//! The SQLite file behind every accountdesk store.
//!
//! One connection per process, shared behind a mutex. Statements run on
//! tokio's blocking pool so async callers never stall on disk I/O.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::migration;

/// Cloneable handle to the accountdesk database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database file at `path`.
    ///
    /// Does blocking file I/O; async code should prefer
    /// [`Database::open_and_migrate`].
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening database");
        Self::from_connection(Connection::open(path)?)
    }

    /// Private in-memory database. Gone when the last handle drops.
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("opening in-memory database");
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open `path` off the runtime thread, then bring its schema up to date.
    pub async fn open_and_migrate(path: impl AsRef<Path> + Send + 'static) -> StoreResult<Self> {
        let db = tokio::task::spawn_blocking(move || Self::open(path)).await??;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Apply every migration newer than the recorded schema version.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        self.execute(migration::run_all).await
    }

    /// Run `f` with exclusive access to the connection.
    ///
    /// ```ignore
    /// let n: i64 = db
    ///     .execute(|conn| Ok(conn.query_row("SELECT count(*) FROM blobs", [], |r| r.get(0))?))
    ///     .await?;
    /// ```
    pub async fn execute<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&guard)
        })
        .await?
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        // WAL: an interrupted write leaves the previous state readable.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "busy_timeout", 5_000_i32)?;
        debug!("pragmas set");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn scalar<T>(db: &Database, sql: &'static str) -> T
    where
        T: rusqlite::types::FromSql + Send + 'static,
    {
        db.execute(move |conn| Ok(conn.query_row(sql, [], |row| row.get(0))?))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_and_migrate(dir.path().join("desk.db"))
            .await
            .unwrap();

        let mode: String = scalar(&db, "PRAGMA journal_mode").await;
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn fresh_database_has_empty_blob_table() {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();

        let count: i64 = scalar(&db, "SELECT count(*) FROM blobs").await;
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn clones_share_one_connection() {
        let db = Database::open_in_memory().unwrap();
        let other = db.clone();

        db.execute(|conn| {
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (7);")?;
            Ok(())
        })
        .await
        .unwrap();

        let x: i64 = scalar(&other, "SELECT x FROM t").await;
        assert_eq!(x, 7);
    }

    #[tokio::test]
    async fn closure_errors_come_back_as_store_errors() {
        let db = Database::open_in_memory().unwrap();
        let result: StoreResult<()> = db
            .execute(|conn| {
                conn.execute_batch("SELECT * FROM no_such_table;")?;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(StoreError::Sqlite(_))));
    }
}
