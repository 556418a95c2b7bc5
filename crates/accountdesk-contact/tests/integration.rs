//! Integration tests for the accountdesk-contact crate.

use std::path::Path;

use accountdesk_contact::{ContactLog, NewContactMessage};
use accountdesk_store::{BlobStore, Database};

const KEY: &str = "contact-forms";

async fn open(path: &Path) -> (BlobStore, ContactLog) {
    let db = Database::open_and_migrate(path.to_path_buf()).await.unwrap();
    let blobs = BlobStore::new(db);
    let log = ContactLog::load(blobs.clone(), KEY).await;
    (blobs, log)
}

fn message(title: &str) -> NewContactMessage {
    NewContactMessage {
        title: title.into(),
        description: format!("about {title}"),
    }
}

#[tokio::test]
async fn messages_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("contact.db");

    let saved = {
        let (_, mut log) = open(&db_path).await;
        log.add(message("first")).await;
        log.add(message("second")).await;
        log.items().to_vec()
    };

    let (_, log) = open(&db_path).await;
    assert_eq!(log.items(), saved.as_slice());
    assert_eq!(log.items()[0].title, "second");
}

#[tokio::test]
async fn clear_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("contact.db");

    {
        let (_, mut log) = open(&db_path).await;
        log.add(message("only")).await;
        log.clear().await;
    }

    let (_, log) = open(&db_path).await;
    assert!(log.is_empty());
}

#[tokio::test]
async fn browser_blob_is_imported() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("contact.db");

    {
        let (blobs, _) = open(&db_path).await;
        blobs
            .set(
                KEY,
                r#"{"state":{"items":[{"id":"x1","title":"Hello","description":"World","createdAt":1700000000000}]},"version":0}"#,
            )
            .await
            .unwrap();
    }

    let (_, mut log) = open(&db_path).await;
    assert_eq!(log.len(), 1);
    assert_eq!(log.items()[0].id, "x1");
    assert_eq!(log.items()[0].created_at.timestamp(), 1_700_000_000);

    // New messages go in front of imported ones.
    log.add(message("new")).await;
    assert_eq!(log.items()[1].id, "x1");
}

#[tokio::test]
async fn unreadable_blob_starts_empty_and_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("contact.db");

    {
        let (blobs, _) = open(&db_path).await;
        blobs.set(KEY, "not json").await.unwrap();
    }

    {
        let (_, mut log) = open(&db_path).await;
        assert!(log.is_empty());
        log.add(message("fresh")).await;
    }

    let (blobs, log) = open(&db_path).await;
    assert_eq!(log.len(), 1);
    let raw = blobs.get(KEY).await.unwrap().unwrap();
    assert!(raw.contains("\"version\":1"));
}
