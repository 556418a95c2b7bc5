//! The contact message log.

use accountdesk_store::{BlobStore, Persisted, StateSchema, StoreError, StoreResult};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Default blob key.
pub const DEFAULT_KEY: &str = "contact-forms";

/// A saved submission. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Form input for [`ContactLog::add`].
#[derive(Debug, Clone, Default)]
pub struct NewContactMessage {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactState {
    /// Newest first.
    pub items: Vec<ContactMessage>,
}

/// Version 0 is the browser build's layout, with `createdAt` in epoch
/// milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactSchema;

impl StateSchema for ContactSchema {
    type State = ContactState;
    const VERSION: u32 = 1;

    fn upgrade(&self, from: u32, raw: serde_json::Value) -> StoreResult<ContactState> {
        if from != 0 {
            return Err(StoreError::Upgrade {
                from,
                message: "no upgrade path for contact log".into(),
            });
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct LegacyItem {
            id: String,
            title: String,
            description: String,
            created_at: i64,
        }

        #[derive(Deserialize)]
        struct LegacyState {
            #[serde(default)]
            items: Vec<LegacyItem>,
        }

        let legacy: LegacyState = serde_json::from_value(raw)?;
        let items = legacy
            .items
            .into_iter()
            .map(|item| {
                let created_at = Utc
                    .timestamp_millis_opt(item.created_at)
                    .single()
                    .ok_or_else(|| StoreError::Upgrade {
                        from,
                        message: format!("invalid timestamp: {}", item.created_at),
                    })?;
                Ok(ContactMessage {
                    id: item.id,
                    title: item.title,
                    description: item.description,
                    created_at,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        info!(items = items.len(), "upgraded contact log from v0");
        Ok(ContactState { items })
    }
}

/// Contact submissions mirrored to one blob.
pub struct ContactLog {
    state: Persisted<ContactSchema>,
}

impl ContactLog {
    /// Load the log stored under `key`.
    pub async fn load(blobs: BlobStore, key: &str) -> Self {
        let state = Persisted::load(blobs, key, ContactSchema).await;
        debug!(key, items = state.get().items.len(), "contact log loaded");
        Self { state }
    }

    /// All messages, newest first.
    pub fn items(&self) -> &[ContactMessage] {
        &self.state.get().items
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Record a submission at the front of the log.
    #[instrument(skip(self, message), fields(title = %message.title))]
    pub async fn add(&mut self, message: NewContactMessage) -> ContactMessage {
        let entry = ContactMessage {
            id: Uuid::now_v7().to_string(),
            title: message.title,
            description: message.description,
            created_at: Utc::now(),
        };

        let stored = entry.clone();
        self.state.mutate(|s| s.items.insert(0, stored)).await;
        info!(id = %entry.id, "contact message saved");
        entry
    }

    /// Remove every message.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) {
        let removed = self.len();
        self.state.mutate(|s| s.items.clear()).await;
        info!(removed, "contact log cleared");
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use accountdesk_store::Database;

    async fn setup_log() -> ContactLog {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        ContactLog::load(BlobStore::new(db), DEFAULT_KEY).await
    }

    fn message(title: &str, description: &str) -> NewContactMessage {
        NewContactMessage {
            title: title.into(),
            description: description.into(),
        }
    }

    #[tokio::test]
    async fn add_to_empty_log() {
        let mut log = setup_log().await;
        assert!(log.is_empty());

        let before = Utc::now();
        let entry = log.add(message("T", "D")).await;

        assert_eq!(log.len(), 1);
        assert!(!entry.id.is_empty());
        assert_eq!(entry.title, "T");
        assert_eq!(entry.description, "D");
        assert!(entry.created_at >= before);
        assert!(entry.created_at <= Utc::now());
        assert_eq!(log.items()[0], entry);
    }

    #[tokio::test]
    async fn newest_first_then_clear() {
        let mut log = setup_log().await;

        let first = log.add(message("first", "")).await;
        let second = log.add(message("second", "")).await;

        assert_eq!(log.items()[0].id, second.id);
        assert_eq!(log.items()[1].id, first.id);
        assert_ne!(first.id, second.id);

        log.clear().await;
        assert_eq!(log.len(), 0);
    }

    #[tokio::test]
    async fn empty_fields_are_accepted() {
        let mut log = setup_log().await;
        log.add(message("", "")).await;
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn v0_items_are_upgraded() {
        let raw = r#"{"state":{"items":[
            {"id":"b","title":"Pricing","description":"How much?","createdAt":1700000000000},
            {"id":"a","title":"Hello","description":"Hi","createdAt":1690000000000}
        ]},"version":0}"#;

        let state = Persisted::<ContactSchema>::decode(&ContactSchema, DEFAULT_KEY, raw).unwrap();

        assert_eq!(state.items.len(), 2);
        assert_eq!(state.items[0].id, "b");
        assert_eq!(state.items[0].created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(state.items[1].title, "Hello");
    }

    #[test]
    fn unknown_old_version_is_rejected() {
        let result = ContactSchema.upgrade(3, serde_json::json!({}));
        assert!(matches!(result, Err(StoreError::Upgrade { from: 3, .. })));
    }
}
