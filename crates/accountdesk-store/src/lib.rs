//! # accountdesk-store
//!
//! Durable storage for accountdesk.
//!
//! Every store in the workspace keeps its whole state as one JSON document
//! under a named key, the way a browser app keeps state in local storage.
//! This crate provides the pieces underneath:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Persisted<S>  (versioned JSON envelope) │
//! ├─────────────────────────────────────────┤
//! │  BlobStore     (key → text)              │
//! ├─────────────────────────────────────────┤
//! │  Database (rusqlite WAL, blocking pool)  │
//! │  Migrations (versioned, transactional)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use accountdesk_store::{BlobStore, Database, Persisted};
//!
//! let db = Database::open_and_migrate("data/accountdesk.db").await?;
//! let blobs = BlobStore::new(db);
//! let mut state = Persisted::load(blobs, "auth-store", MySchema).await;
//! state.mutate(|s| s.visits += 1).await;
//! ```

pub mod blob;
pub mod db;
pub mod error;
pub mod migration;
pub mod persisted;

// ── re-exports ───────────────────────────────────────────────────────

pub use blob::BlobStore;
pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use persisted::{Persisted, StateSchema};
