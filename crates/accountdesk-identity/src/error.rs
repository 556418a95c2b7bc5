//! Error types for the accountdesk-identity crate.
//!
//! Authentication outcomes are not errors: `verify_otp` and `login` answer
//! with `bool`, and updates without a session are no-ops. [`IdentityError`]
//! covers faults only.

use thiserror::Error;

/// Alias for `Result<T, IdentityError>`.
pub type IdentityResult<T> = Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The system random source could not produce bytes.
    #[error("system random source failed")]
    Random,

    /// A stored password hash could not be parsed.
    #[error("malformed password hash: {0}")]
    MalformedHash(String),

    /// Avatar ingestion was given no file.
    #[error("no avatar file given")]
    NoAvatarFile,

    /// Avatar ingestion accepts a single file.
    #[error("expected exactly one avatar file, got {0}")]
    TooManyAvatarFiles(usize),

    /// The avatar file does not look like an image.
    #[error("not an image file: {0}")]
    NotAnImage(String),

    #[error("avatar is {size} bytes, limit is {max}")]
    AvatarTooLarge { size: u64, max: u64 },

    /// Reading the avatar file failed.
    #[error("failed to read avatar: {0}")]
    Io(#[from] std::io::Error),
}
