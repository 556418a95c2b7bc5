//! Application configuration.
//!
//! Reads `config/default.toml` (or the file passed with `--config`). Every
//! field has a default, so a missing file or a missing section is fine;
//! a file that exists but does not parse is an error.

use std::path::{Path, PathBuf};

use accountdesk_identity::avatar::DEFAULT_MAX_BYTES;
use accountdesk_identity::password::DEFAULT_ITERATIONS;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Environment variable overriding `storage.data_dir`.
pub const DATA_DIR_ENV: &str = "ACCOUNTDESK_DATA_DIR";

/// Database file name inside the data directory.
pub const DB_FILE: &str = "accountdesk.db";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub avatar: AvatarConfig,
    pub log: LogConfig,
}

/// `[storage]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Blob key for users, session and pending registration.
    pub identity_key: String,
    /// Blob key for the contact message log.
    pub contact_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            identity_key: accountdesk_identity::store::DEFAULT_KEY.to_owned(),
            contact_key: accountdesk_contact::log::DEFAULT_KEY.to_owned(),
        }
    }
}

/// `[auth]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// PBKDF2 rounds for newly hashed passwords. Existing hashes keep
    /// the count they were made with.
    pub pbkdf2_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// `[avatar]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub max_bytes: u64,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// `[log]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, falling back to defaults if the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read config {}", path.display()));
            }
        };

        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Effective data directory: `--data-dir` first, then the environment,
    /// then the config file.
    pub fn data_dir(&self, from_env: Option<PathBuf>, from_flag: Option<PathBuf>) -> PathBuf {
        from_flag
            .or(from_env)
            .unwrap_or_else(|| self.storage.data_dir.clone())
    }
}

// ── tests ────────────────────────────────────────────────────────────
