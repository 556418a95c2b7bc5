//! Salted password hashing via PBKDF2-HMAC-SHA256 (ring).
//!
//! Hashes are stored as `pbkdf2-sha256$<iterations>$base64(salt)$base64(hash)`.
//! The iteration count travels with the hash, so raising the configured
//! count later does not invalidate existing accounts.

use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{IdentityError, IdentityResult};

/// OWASP 2023 recommendation for PBKDF2-HMAC-SHA256.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

const SCHEME: &str = "pbkdf2-sha256";

const SALT_LEN: usize = 32;

const KEY_LEN: usize = 32;

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Hashes new passwords with a fixed iteration count and verifies hashes
/// made with any count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher {
    /// Create a hasher; an iteration count of zero is raised to one.
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN),
        }
    }

    /// Iteration count used for new hashes.
    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }

    /// Hash `password` under a fresh random salt.
    pub fn hash(&self, password: &str) -> IdentityResult<String> {
        let rng = SystemRandom::new();

        let mut salt = [0u8; SALT_LEN];
        rng.fill(&mut salt).map_err(|_| IdentityError::Random)?;

        let mut hash = [0u8; KEY_LEN];
        pbkdf2::derive(
            PBKDF2_ALG,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut hash,
        );

        Ok(format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            BASE64.encode(salt),
            BASE64.encode(hash)
        ))
    }

    /// Check `password` against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch and an error only when `stored` is
    /// not a hash this module produced.
    pub fn verify(&self, password: &str, stored: &str) -> IdentityResult<bool> {
        let parts: Vec<&str> = stored.split('$').collect();
        let [scheme, iterations, salt, expected] = parts.as_slice() else {
            return Err(IdentityError::MalformedHash(
                "expected four '$'-separated fields".into(),
            ));
        };

        if *scheme != SCHEME {
            return Err(IdentityError::MalformedHash(format!(
                "unknown scheme: {scheme}"
            )));
        }

        let iterations = iterations
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| IdentityError::MalformedHash("invalid iteration count".into()))?;
        let salt = BASE64
            .decode(salt)
            .map_err(|e| IdentityError::MalformedHash(format!("invalid salt encoding: {e}")))?;
        let expected = BASE64
            .decode(expected)
            .map_err(|e| IdentityError::MalformedHash(format!("invalid hash encoding: {e}")))?;

        Ok(pbkdf2::verify(PBKDF2_ALG, iterations, &salt, password.as_bytes(), &expected).is_ok())
    }
}

// ── tests ────────────────────────────────────────────────────────────
