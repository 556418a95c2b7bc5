//! Integration tests for the accountdesk-identity crate.
//!
//! Each test reopens the store from an on-disk database to check that
//! every action is persisted before it returns.

use std::path::Path;

use accountdesk_identity::{IdentityStore, NewUser, PasswordHasher, ProfileUpdate};
use accountdesk_store::{BlobStore, Database};

const KEY: &str = "auth-store";

async fn open(path: &Path) -> IdentityStore {
    let db = Database::open_and_migrate(path.to_path_buf()).await.unwrap();
    IdentityStore::load(BlobStore::new(db), KEY, PasswordHasher::new(1_000)).await
}

fn new_user(first: &str, last: &str, email: &str, password: &str) -> NewUser {
    NewUser {
        first_name: first.into(),
        last_name: last.into(),
        email: email.into(),
        password: password.into(),
        avatar: None,
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Registration across restarts
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn pending_registration_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("identity.db");

    let code = {
        let mut store = open(&db_path).await;
        store
            .register(new_user("Ada", "Lovelace", "ada@example.com", "engine"))
            .await
            .unwrap()
    };

    let mut store = open(&db_path).await;
    assert_eq!(store.pending().unwrap().email, "ada@example.com");
    assert!(store.verify_otp(&code).await);

    let store = open(&db_path).await;
    assert!(store.is_logged_in());
    assert!(store.pending().is_none());
    assert_eq!(store.current_user().unwrap().full_name(), "Ada Lovelace");
}

#[tokio::test]
async fn second_verification_for_same_email_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("identity.db");
    let mut store = open(&db_path).await;

    let code = store
        .register(new_user("A", "X", "a@x.com", "pw"))
        .await
        .unwrap();
    assert!(store.verify_otp(&code).await);

    let code = store
        .register(new_user("A", "X", "a@x.com", "pw"))
        .await
        .unwrap();
    assert!(!store.verify_otp(&code).await);

    let store = open(&db_path).await;
    assert_eq!(store.users().len(), 1);
    assert!(store.pending().is_some());
}

// ═══════════════════════════════════════════════════════════════════════
//  Session and profile across restarts
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn session_profile_and_avatar_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("identity.db");

    let id = {
        let mut store = open(&db_path).await;
        let code = store
            .register(new_user("Grace", "Hopper", "grace@navy.mil", "cobol"))
            .await
            .unwrap();
        assert!(store.verify_otp(&code).await);
        store
            .update_profile(ProfileUpdate {
                first_name: Some("Amazing".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        store.set_avatar("data:image/png;base64,iVBORw0KGgo=").await;
        store.current_user().unwrap().id.clone()
    };

    let mut store = open(&db_path).await;
    let user = store.current_user().unwrap();
    assert_eq!(user.id, id);
    assert_eq!(user.first_name, "Amazing");
    assert_eq!(user.avatar.as_deref(), Some("data:image/png;base64,iVBORw0KGgo="));
    let before = store.state().clone();

    store.logout().await;
    let mut store = open(&db_path).await;
    assert!(!store.is_logged_in());

    assert!(store.login("GRACE@navy.mil", "cobol").await);
    let store = open(&db_path).await;
    assert_eq!(store.state(), &before);
}

#[tokio::test]
async fn removing_self_persists_logout() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("identity.db");

    {
        let mut store = open(&db_path).await;
        let code = store
            .register(new_user("A", "X", "a@x.com", "pw"))
            .await
            .unwrap();
        assert!(store.verify_otp(&code).await);
        store.remove_user("a@x.com").await;
    }

    let store = open(&db_path).await;
    assert!(store.users().is_empty());
    assert!(!store.is_logged_in());
}

// ═══════════════════════════════════════════════════════════════════════
//  Legacy and damaged blobs
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn browser_blob_is_imported() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("identity.db");

    let db = Database::open_and_migrate(db_path.clone()).await.unwrap();
    BlobStore::new(db)
        .set(
            KEY,
            r#"{"state":{"users":[{"id":"1","firstName":"Rimas","lastName":"Saad",
                "email":"rimas@example.com","password":"secret"}],
                "currentUser":null,"isLoggedIn":false,
                "pendingUser":null,"pendingOtp":null},"version":0}"#,
        )
        .await
        .unwrap();

    let mut store = open(&db_path).await;
    assert_eq!(store.users().len(), 1);
    assert!(store.login("rimas@example.com", "secret").await);
    assert!(!store.users()[0].password_hash.contains("secret"));
}

#[tokio::test]
async fn corrupt_blob_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("identity.db");

    let db = Database::open_and_migrate(db_path.clone()).await.unwrap();
    BlobStore::new(db).set(KEY, "\u{0}garbage").await.unwrap();

    let mut store = open(&db_path).await;
    assert!(store.users().is_empty());

    let code = store
        .register(new_user("A", "X", "a@x.com", "pw"))
        .await
        .unwrap();
    assert!(store.verify_otp(&code).await);
}
