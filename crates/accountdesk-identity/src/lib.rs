//! # accountdesk-identity
//!
//! Session and identity store for accountdesk.
//!
//! Registration is confirmed by a six digit one-time code; passwords are
//! kept as salted PBKDF2 hashes; the session is an id reference into the
//! user list, so "logged in" and "has a current user" cannot disagree.
//!
//! ```ignore
//! use accountdesk_identity::{IdentityStore, NewUser, PasswordHasher};
//!
//! let mut identity = IdentityStore::load(blobs, "auth-store", PasswordHasher::default()).await;
//! let code = identity.register(new_user).await?;
//! assert!(identity.verify_otp(&code).await);
//! ```

pub mod avatar;
pub mod directory;
pub mod error;
pub mod otp;
pub mod password;
pub mod schema;
pub mod store;
pub mod types;

// ── re-exports ───────────────────────────────────────────────────────

pub use directory::DirectoryRow;
pub use error::{IdentityError, IdentityResult};
pub use password::PasswordHasher;
pub use schema::IdentitySchema;
pub use store::IdentityStore;
pub use types::{IdentityState, NewUser, PendingRegistration, ProfileUpdate, User};
