//! Shared helper functions used across CLI subcommands.

use accountdesk_identity::User;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
///
/// Logs go to stderr; stdout carries command output only.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Form input
// ---------------------------------------------------------------------------

/// Avatar shown for users who have not uploaded one.
pub const DEFAULT_AVATAR: &str = "/default-avatar.png";

/// A required form field: the trimmed value, or an error naming the field.
pub fn required_trim<'a>(label: &str, value: &'a str) -> Result<&'a str, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("{label} is required."))
    } else {
        Ok(trimmed)
    }
}

/// Like [`required_trim`], but hands back the value untouched. Passwords
/// are checked for blankness yet stored exactly as typed.
pub fn required_raw<'a>(label: &str, value: &'a str) -> Result<&'a str, String> {
    required_trim(label, value).map(|_| value)
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Avatar reference for display, abbreviated when it is an inline image.
pub fn avatar_label(user: &User) -> String {
    match user.avatar.as_deref() {
        None => DEFAULT_AVATAR.to_owned(),
        Some(url) => match url.split_once(',') {
            Some((header, payload)) if header.starts_with("data:") => {
                format!("{header} ({} bytes encoded)", payload.len())
            }
            _ => url.to_owned(),
        },
    }
}
