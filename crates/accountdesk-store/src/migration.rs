//! Schema migrations.
//!
//! Each entry in `MIGRATIONS` runs once, in its own transaction, and is
//! recorded in `_migrations`.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// Append only; versions strictly increase.
static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "named state blobs",
    sql: r#"
            CREATE TABLE blobs (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
        "#,
}];

// ── public API ───────────────────────────────────────────────────────

/// Bring `conn` up to the newest schema. Blocking.
pub fn run_all(conn: &Connection) -> StoreResult<()> {
    ensure_migrations_table(conn)?;

    let current = current_version(conn)?;
    let mut pending = MIGRATIONS.iter().filter(|m| m.version > current).peekable();
    if pending.peek().is_none() {
        debug!(current, "schema up to date");
        return Ok(());
    }

    pending.try_for_each(|m| apply(conn, m))
}

/// Highest applied version, 0 for a fresh file.
pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |row| row.get(0),
    )
    .map_err(failed(0, "read schema version"))
}

// ── internals ────────────────────────────────────────────────────────

/// Map a SQLite error into a [`StoreError::Migration`] for `version`.
fn failed(version: u32, step: &'static str) -> impl Fn(rusqlite::Error) -> StoreError {
    move |e| StoreError::Migration {
        version,
        message: format!("{step}: {e}"),
    }
}

fn ensure_migrations_table(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version     INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at  INTEGER NOT NULL
        );",
    )
    .map_err(failed(0, "create _migrations"))
}

/// Apply one migration and record it, all or nothing.
fn apply(conn: &Connection, migration: &Migration) -> StoreResult<()> {
    let version = migration.version;
    info!(version, description = migration.description, "applying migration");

    // `Connection::transaction` wants `&mut`; drive BEGIN/COMMIT directly.
    conn.execute_batch("BEGIN IMMEDIATE;")
        .map_err(failed(version, "begin"))?;

    let body = conn
        .execute_batch(migration.sql)
        .map_err(failed(version, "execute"))
        .and_then(|()| {
            conn.execute(
                "INSERT INTO _migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![version, migration.description, chrono::Utc::now().timestamp()],
            )
            .map_err(failed(version, "record"))
        });

    if let Err(err) = body {
        warn!(version, %err, "migration failed, rolling back");
        let _ = conn.execute_batch("ROLLBACK;");
        return Err(err);
    }

    conn.execute_batch("COMMIT;").map_err(failed(version, "commit"))?;
    info!(version, "migration applied");
    Ok(())
}

// ── tests ────────────────────────────────────────────────────────────
