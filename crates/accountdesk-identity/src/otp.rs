//! Six digit one-time codes for registration confirmation.

use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{IdentityError, IdentityResult};

/// Smallest code, so every code has exactly six digits.
pub const OTP_MIN: u32 = 100_000;

/// Number of distinct codes (100000..=999999).
pub const OTP_SPAN: u32 = 900_000;

/// Draw a code uniformly from 100000..=999999 using the system CSPRNG.
pub fn generate() -> IdentityResult<String> {
    let rng = SystemRandom::new();
    // Largest multiple of OTP_SPAN that fits in a u32; draws at or above it
    // are rejected so the modulo below stays unbiased.
    let limit = u32::MAX - (u32::MAX % OTP_SPAN);

    loop {
        let mut buf = [0u8; 4];
        rng.fill(&mut buf).map_err(|_| IdentityError::Random)?;
        let draw = u32::from_le_bytes(buf);
        if draw < limit {
            return Ok((OTP_MIN + draw % OTP_SPAN).to_string());
        }
    }
}

/// Compare a user-supplied code against the issued one.
///
/// Surrounding whitespace in `supplied` is ignored; everything else must
/// match exactly.
pub fn matches(issued: &str, supplied: &str) -> bool {
    supplied.trim() == issued
}

// ── tests ────────────────────────────────────────────────────────────
