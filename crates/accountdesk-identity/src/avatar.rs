//! Avatar ingestion: one image file in, one data URL out.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, instrument};

use crate::error::{IdentityError, IdentityResult};

/// Default upper bound on avatar file size (2 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 2 * 1024 * 1024;

/// Image MIME type for a file, judged by its extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        _ => return None,
    };
    Some(mime)
}

/// `data:<mime>;base64,<payload>`.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Read a single dropped image and convert it to a data URL.
///
/// Anything other than exactly one file is rejected before any I/O.
#[instrument(skip(paths), fields(count = paths.len()))]
pub async fn ingest(paths: &[PathBuf], max_bytes: u64) -> IdentityResult<String> {
    let path = match paths {
        [] => return Err(IdentityError::NoAvatarFile),
        [path] => path,
        more => return Err(IdentityError::TooManyAvatarFiles(more.len())),
    };

    let mime = mime_for_path(path)
        .ok_or_else(|| IdentityError::NotAnImage(path.display().to_string()))?;

    let size = tokio::fs::metadata(path).await?.len();
    if size > max_bytes {
        return Err(IdentityError::AvatarTooLarge {
            size,
            max: max_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await?;
    debug!(path = %path.display(), mime, size = bytes.len(), "avatar read");
    Ok(encode_data_url(mime, &bytes))
}

// ── tests ────────────────────────────────────────────────────────────
