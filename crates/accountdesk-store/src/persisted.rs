//! Versioned, self-persisting state containers.
//!
//! A [`Persisted`] owns one in-memory state value and mirrors it to a
//! named blob after every mutation. The blob is a JSON envelope:
//!
//! ```text
//! {"state": { ... }, "version": 1}
//! ```
//!
//! Loading never fails. A missing blob, a malformed envelope, a version
//! newer than the schema, or an upgrade that cannot be completed all
//! yield `State::default()`, logged at `warn`. Writes after a mutation are
//! best-effort: a failed write is logged and the in-memory state is kept.

use std::cmp::Ordering;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::blob::BlobStore;
use crate::error::{StoreError, StoreResult};

/// Describes the shape and evolution of one persisted state document.
pub trait StateSchema {
    /// The in-memory state.
    type State: Serialize + DeserializeOwned + Default;

    /// Version written by this build. Older versions go through
    /// [`StateSchema::upgrade`]; newer ones are rejected.
    const VERSION: u32;

    /// Convert a state document written under an older version.
    fn upgrade(&self, from: u32, raw: serde_json::Value) -> StoreResult<Self::State> {
        let _ = raw;
        Err(StoreError::Upgrade {
            from,
            message: "no upgrade path".into(),
        })
    }

    /// Repair invariants a well-formed document can still violate.
    fn validate(&self, state: &mut Self::State) {
        let _ = state;
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    state: &'a T,
    version: u32,
}

#[derive(Deserialize)]
struct RawEnvelope {
    state: serde_json::Value,
    version: u32,
}

/// One state value bound to its blob key.
pub struct Persisted<S: StateSchema> {
    blobs: BlobStore,
    key: String,
    schema: S,
    state: S::State,
}

impl<S: StateSchema> Persisted<S> {
    /// Load the state stored under `key`, falling back to the default.
    #[instrument(skip(blobs, schema))]
    pub async fn load(blobs: BlobStore, key: &str, schema: S) -> Self {
        let key = key.to_string();
        let state = match blobs.get(&key).await {
            Ok(Some(raw)) => match Self::decode(&schema, &key, &raw) {
                Ok(state) => state,
                Err(err) => {
                    warn!(key = %key, %err, "discarding unreadable state blob");
                    S::State::default()
                }
            },
            Ok(None) => {
                debug!(key = %key, "no stored state, using defaults");
                S::State::default()
            }
            Err(err) => {
                warn!(key = %key, %err, "storage unavailable, using defaults");
                S::State::default()
            }
        };

        Self {
            blobs,
            key,
            schema,
            state,
        }
    }

    /// Parse an envelope, upgrading and validating its state.
    pub fn decode(schema: &S, key: &str, raw: &str) -> StoreResult<S::State> {
        let envelope: RawEnvelope = serde_json::from_str(raw)?;

        let mut state = match envelope.version.cmp(&S::VERSION) {
            Ordering::Equal => serde_json::from_value(envelope.state)?,
            Ordering::Less => {
                debug!(key, from = envelope.version, to = S::VERSION, "upgrading state");
                schema.upgrade(envelope.version, envelope.state)?
            }
            Ordering::Greater => {
                return Err(StoreError::UnsupportedVersion {
                    key: key.to_string(),
                    found: envelope.version,
                    supported: S::VERSION,
                });
            }
        };

        schema.validate(&mut state);
        Ok(state)
    }

    /// Serialize the current state into its envelope.
    pub fn encode(&self) -> StoreResult<String> {
        let envelope = EnvelopeRef {
            state: &self.state,
            version: S::VERSION,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Current state.
    pub fn get(&self) -> &S::State {
        &self.state
    }

    /// Blob key this state is mirrored to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Schema handle, for stores that keep context on it.
    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Write the full state to its blob, surfacing any error.
    pub async fn save(&self) -> StoreResult<()> {
        let encoded = self.encode()?;
        self.blobs.set(&self.key, &encoded).await
    }

    /// Apply `f` to the state, then persist it best-effort.
    pub async fn mutate<R>(&mut self, f: impl FnOnce(&mut S::State) -> R) -> R {
        let out = f(&mut self.state);
        if let Err(err) = self.save().await {
            warn!(key = %self.key, %err, "failed to persist state");
        }
        out
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        hits: u32,
        labels: Vec<String>,
    }

    /// Version 1 stored the count as `count`.
    struct CounterSchema;

    impl StateSchema for CounterSchema {
        type State = Counter;
        const VERSION: u32 = 2;

        fn upgrade(&self, from: u32, raw: serde_json::Value) -> StoreResult<Counter> {
            if from != 1 {
                return Err(StoreError::Upgrade {
                    from,
                    message: "unknown version".into(),
                });
            }
            let hits = raw
                .get("count")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0) as u32;
            Ok(Counter {
                hits,
                labels: Vec::new(),
            })
        }

        fn validate(&self, state: &mut Counter) {
            state.labels.retain(|l| !l.is_empty());
        }
    }

    async fn setup_blobs() -> BlobStore {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        BlobStore::new(db)
    }

    #[tokio::test]
    async fn missing_blob_loads_default() {
        let blobs = setup_blobs().await;
        let counter = Persisted::load(blobs, "counter", CounterSchema).await;
        assert_eq!(counter.get(), &Counter::default());
    }

    #[tokio::test]
    async fn mutate_persists_and_reloads() {
        let blobs = setup_blobs().await;

        let mut counter = Persisted::load(blobs.clone(), "counter", CounterSchema).await;
        counter
            .mutate(|s| {
                s.hits += 3;
                s.labels.push("a".into());
            })
            .await;

        let reloaded = Persisted::load(blobs.clone(), "counter", CounterSchema).await;
        assert_eq!(reloaded.get(), counter.get());

        let raw = blobs.get("counter").await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 2);
        assert_eq!(value["state"]["hits"], 3);
    }

    #[tokio::test]
    async fn corrupt_blob_loads_default() {
        let blobs = setup_blobs().await;
        blobs.set("counter", "{not json").await.unwrap();

        let counter = Persisted::load(blobs, "counter", CounterSchema).await;
        assert_eq!(counter.get(), &Counter::default());
    }

    #[tokio::test]
    async fn wrong_shape_loads_default() {
        let blobs = setup_blobs().await;
        blobs
            .set("counter", r#"{"state":{"hits":"many"},"version":2}"#)
            .await
            .unwrap();

        let counter = Persisted::load(blobs, "counter", CounterSchema).await;
        assert_eq!(counter.get(), &Counter::default());
    }

    #[tokio::test]
    async fn future_version_loads_default() {
        let blobs = setup_blobs().await;
        blobs
            .set("counter", r#"{"state":{"hits":9,"labels":[]},"version":3}"#)
            .await
            .unwrap();

        let counter = Persisted::load(blobs, "counter", CounterSchema).await;
        assert_eq!(counter.get().hits, 0);
    }

    #[test]
    fn decode_rejects_future_version() {
        let result = Persisted::<CounterSchema>::decode(
            &CounterSchema,
            "counter",
            r#"{"state":{},"version":7}"#,
        );
        match result {
            Err(StoreError::UnsupportedVersion {
                found, supported, ..
            }) => {
                assert_eq!(found, 7);
                assert_eq!(supported, 2);
            }
            other => panic!("expected UnsupportedVersion, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn older_version_is_upgraded() {
        let blobs = setup_blobs().await;
        blobs
            .set("counter", r#"{"state":{"count":5},"version":1}"#)
            .await
            .unwrap();

        let counter = Persisted::load(blobs, "counter", CounterSchema).await;
        assert_eq!(counter.get().hits, 5);
    }

    #[tokio::test]
    async fn missing_upgrade_path_loads_default() {
        let blobs = setup_blobs().await;
        blobs
            .set("counter", r#"{"state":{"count":5},"version":0}"#)
            .await
            .unwrap();

        let counter = Persisted::load(blobs, "counter", CounterSchema).await;
        assert_eq!(counter.get().hits, 0);
    }

    #[tokio::test]
    async fn validate_runs_on_load() {
        let blobs = setup_blobs().await;
        blobs
            .set(
                "counter",
                r#"{"state":{"hits":1,"labels":["","keep"]},"version":2}"#,
            )
            .await
            .unwrap();

        let counter = Persisted::load(blobs, "counter", CounterSchema).await;
        assert_eq!(counter.get().labels, vec!["keep".to_string()]);
    }
}
