//! The session and identity store.
//!
//! Holds the registered users, the current session and the single pending
//! registration. Every action that changes state writes the whole state
//! back to its blob before returning. Authentication outcomes are reported
//! as `bool`; actions that need a session are silent no-ops without one.

use accountdesk_store::{BlobStore, Persisted};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::directory::{self, DirectoryRow};
use crate::error::IdentityResult;
use crate::otp;
use crate::password::PasswordHasher;
use crate::schema::IdentitySchema;
use crate::types::{IdentityState, NewUser, PendingRegistration, ProfileUpdate, User};

/// Default blob key.
pub const DEFAULT_KEY: &str = "auth-store";

fn same_email(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Users, session and pending registration, mirrored to one blob.
pub struct IdentityStore {
    state: Persisted<IdentitySchema>,
}

impl IdentityStore {
    /// Load the identity state stored under `key`.
    pub async fn load(blobs: BlobStore, key: &str, hasher: PasswordHasher) -> Self {
        let state = Persisted::load(blobs, key, IdentitySchema::new(hasher)).await;
        debug!(
            key,
            users = state.get().users.len(),
            logged_in = state.get().current_user().is_some(),
            "identity state loaded"
        );
        Self { state }
    }

    fn hasher(&self) -> &PasswordHasher {
        &self.state.schema().hasher
    }

    // ── reads ────────────────────────────────────────────────────────

    pub fn state(&self) -> &IdentityState {
        self.state.get()
    }

    /// All users, newest first.
    pub fn users(&self) -> &[User] {
        &self.state.get().users
    }

    pub fn current_user(&self) -> Option<&User> {
        self.state.get().current_user()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user().is_some()
    }

    pub fn pending(&self) -> Option<&PendingRegistration> {
        self.state.get().pending.as_ref()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&User> {
        self.state.get().find(id)
    }

    /// Directory rows whose full name matches `query`.
    pub fn search(&self, query: &str) -> Vec<DirectoryRow<'_>> {
        directory::search(self.users(), query)
    }

    // ── auth ─────────────────────────────────────────────────────────

    /// Start a registration and return its one-time code.
    ///
    /// Replaces any registration still waiting for its code. Email
    /// uniqueness is checked at verification, not here.
    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn register(&mut self, new_user: NewUser) -> IdentityResult<String> {
        let code = otp::generate()?;
        let password_hash = self.hasher().hash(&new_user.password)?;

        let pending = PendingRegistration {
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            password_hash,
            avatar: new_user.avatar.filter(|a| !a.is_empty()),
            otp: code.clone(),
            issued_at: Utc::now(),
        };

        let replaced = self
            .state
            .mutate(|s| s.pending.replace(pending).is_some())
            .await;
        info!(replaced, "registration pending verification");
        Ok(code)
    }

    /// Confirm the pending registration with its code.
    ///
    /// On success the new user is prepended, logged in, and the pending
    /// slot cleared. When the email is already registered the pending slot
    /// is kept as is.
    #[instrument(skip(self, code))]
    pub async fn verify_otp(&mut self, code: &str) -> bool {
        let Some(pending) = self.pending() else {
            debug!("no pending registration");
            return false;
        };

        if !otp::matches(&pending.otp, code) {
            debug!("one-time code mismatch");
            return false;
        }

        if self.users().iter().any(|u| u.email == pending.email) {
            info!(email = %pending.email, "email already registered");
            return false;
        }

        let id = Uuid::now_v7().to_string();
        self.state
            .mutate(|s| {
                let Some(p) = s.pending.take() else {
                    return;
                };
                let user = User {
                    id: id.clone(),
                    first_name: p.first_name,
                    last_name: p.last_name,
                    email: p.email,
                    password_hash: p.password_hash,
                    avatar: p.avatar,
                    created_at: Utc::now(),
                };
                s.users.insert(0, user);
                s.current_user_id = Some(id.clone());
            })
            .await;

        info!(user_id = %id, "registration verified");
        true
    }

    /// Log in with email (trimmed, any case) and exact password.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        let hasher = self.hasher();
        let found = self
            .users()
            .iter()
            .filter(|u| same_email(&u.email, email))
            .find(|u| match hasher.verify(password, &u.password_hash) {
                Ok(valid) => valid,
                Err(err) => {
                    warn!(user_id = %u.id, %err, "unreadable password hash");
                    false
                }
            })
            .map(|u| u.id.clone());

        let Some(id) = found else {
            debug!("invalid credentials");
            return false;
        };

        self.state
            .mutate(|s| s.current_user_id = Some(id.clone()))
            .await;
        info!(user_id = %id, "logged in");
        true
    }

    /// End the session. Always succeeds.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) {
        self.state.mutate(|s| s.current_user_id = None).await;
        info!("logged out");
    }

    // ── profile ──────────────────────────────────────────────────────

    /// Merge the supplied fields into the current user.
    ///
    /// No-op without a session. A new password is hashed before storage.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> IdentityResult<()> {
        let Some(id) = self.state.get().current_user_id.clone() else {
            debug!("profile update without session ignored");
            return Ok(());
        };

        let password_hash = match update.password.as_deref() {
            Some(password) => Some(self.hasher().hash(password)?),
            None => None,
        };

        self.state
            .mutate(|s| {
                let Some(user) = s.users.iter_mut().find(|u| u.id == id) else {
                    return;
                };
                if let Some(first_name) = update.first_name {
                    user.first_name = first_name;
                }
                if let Some(last_name) = update.last_name {
                    user.last_name = last_name;
                }
                if let Some(email) = update.email {
                    user.email = email;
                }
                if let Some(hash) = password_hash {
                    user.password_hash = hash;
                }
            })
            .await;

        info!(user_id = %id, "profile updated");
        Ok(())
    }

    /// Replace the current user's avatar; an empty string clears it.
    #[instrument(skip(self, data_url), fields(len = data_url.len()))]
    pub async fn set_avatar(&mut self, data_url: &str) {
        let Some(id) = self.state.get().current_user_id.clone() else {
            debug!("avatar change without session ignored");
            return;
        };

        let avatar = (!data_url.is_empty()).then(|| data_url.to_string());
        let cleared = avatar.is_none();
        self.state
            .mutate(|s| {
                if let Some(user) = s.users.iter_mut().find(|u| u.id == id) {
                    user.avatar = avatar;
                }
            })
            .await;

        info!(user_id = %id, cleared, "avatar updated");
    }

    // ── directory ────────────────────────────────────────────────────

    /// Delete every user with this email (trimmed, any case).
    ///
    /// Ends the session when the current user's email matches.
    #[instrument(skip(self))]
    pub async fn remove_user(&mut self, email: &str) {
        let state = self.state.get();
        let matching = state
            .users
            .iter()
            .filter(|u| same_email(&u.email, email))
            .count();
        let logs_out = state
            .current_user()
            .is_some_and(|u| same_email(&u.email, email));

        if matching == 0 && !logs_out {
            debug!("no user with that email");
            return;
        }

        self.state
            .mutate(|s| {
                s.users.retain(|u| !same_email(&u.email, email));
                if logs_out {
                    s.current_user_id = None;
                }
            })
            .await;

        info!(removed = matching, logged_out = logs_out, "users removed");
    }
}

// ── tests ────────────────────────────────────────────────────────────
