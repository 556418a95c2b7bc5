//! Persisted layout of the identity state and its upgrades.
//!
//! Version 0 is the layout the browser build wrote: camelCase fields,
//! plaintext passwords, a copy of the current user, an `isLoggedIn` flag
//! and the pending registration split across `pendingUser`/`pendingOtp`.
//! Version 1 is [`IdentityState`].

use accountdesk_store::{StateSchema, StoreError, StoreResult};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::password::PasswordHasher;
use crate::types::{IdentityState, PendingRegistration, User};

/// Schema handle; carries the hasher used when upgrading plaintext
/// passwords.
#[derive(Debug, Clone, Default)]
pub struct IdentitySchema {
    pub hasher: PasswordHasher,
}

impl IdentitySchema {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self { hasher }
    }
}

impl StateSchema for IdentitySchema {
    type State = IdentityState;
    const VERSION: u32 = 1;

    fn upgrade(&self, from: u32, raw: serde_json::Value) -> StoreResult<IdentityState> {
        match from {
            0 => upgrade_v0(&self.hasher, raw),
            other => Err(StoreError::Upgrade {
                from: other,
                message: "no upgrade path for identity state".into(),
            }),
        }
    }

    fn validate(&self, state: &mut IdentityState) {
        if let Some(id) = state.current_user_id.as_deref()
            && state.find(id).is_none()
        {
            warn!(user_id = %id, "session refers to a missing user, logging out");
            state.current_user_id = None;
        }
    }
}

// ── version 0 ────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyUser {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    #[serde(default)]
    avatar: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyPendingUser {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    #[serde(default)]
    avatar: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyState {
    #[serde(default)]
    users: Vec<LegacyUser>,
    #[serde(default)]
    current_user: Option<LegacyUser>,
    #[serde(default)]
    is_logged_in: bool,
    #[serde(default)]
    pending_user: Option<LegacyPendingUser>,
    #[serde(default)]
    pending_otp: Option<String>,
}

fn upgrade_v0(hasher: &PasswordHasher, raw: serde_json::Value) -> StoreResult<IdentityState> {
    let legacy: LegacyState = serde_json::from_value(raw)?;
    let now = Utc::now();
    let hash = |password: &str| {
        hasher.hash(password).map_err(|e| StoreError::Upgrade {
            from: 0,
            message: e.to_string(),
        })
    };

    let users = legacy
        .users
        .into_iter()
        .map(|u| -> StoreResult<User> {
            Ok(User {
                password_hash: hash(&u.password)?,
                id: u.id,
                first_name: u.first_name,
                last_name: u.last_name,
                email: u.email,
                avatar: u.avatar.filter(|a| !a.is_empty()),
                created_at: now,
            })
        })
        .collect::<StoreResult<Vec<_>>>()?;

    let current_user_id = if legacy.is_logged_in {
        legacy.current_user.map(|u| u.id)
    } else {
        None
    };

    let pending = match (legacy.pending_user, legacy.pending_otp) {
        (Some(p), Some(otp)) => Some(PendingRegistration {
            password_hash: hash(&p.password)?,
            first_name: p.first_name,
            last_name: p.last_name,
            email: p.email,
            avatar: p.avatar.filter(|a| !a.is_empty()),
            otp,
            issued_at: now,
        }),
        _ => None,
    };

    info!(users = users.len(), "upgraded identity state from v0");
    Ok(IdentityState {
        users,
        current_user_id,
        pending,
    })
}

// ── tests ────────────────────────────────────────────────────────────
