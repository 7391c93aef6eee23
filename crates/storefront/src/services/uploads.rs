//! Image upload storage.
//!
//! Payment proofs and product images are written to a local directory under a
//! random name and served back from `/uploads/`. Only common image formats are
//! accepted.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// URL prefix the upload directory is served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Errors from [`UploadStorage::store`].
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File is required")]
    Empty,
    #[error("File exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
    #[error("Only PNG, JPEG, WebP and GIF images are accepted")]
    UnsupportedType,
    #[error("failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Whether the client sent something unacceptable, as opposed to a
    /// storage failure.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Writes uploaded images to disk.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStorage {
    /// Create storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub const fn new(dir: PathBuf, max_bytes: usize) -> Self {
        Self { dir, max_bytes }
    }

    /// The directory uploads are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store an image and return the URL it is served from.
    ///
    /// The declared content type is checked first; when it is missing or
    /// generic the leading bytes decide.
    ///
    /// # Errors
    ///
    /// Returns a client error for empty, oversized or non-image payloads and
    /// `UploadError::Io` if the file cannot be written.
    pub async fn store(
        &self,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<String, UploadError> {
        if data.is_empty() {
            return Err(UploadError::Empty);
        }
        if data.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: data.len(),
                max: self.max_bytes,
            });
        }
        let extension = content_type
            .and_then(extension_for_content_type)
            .or_else(|| sniff_extension(data))
            .ok_or(UploadError::UnsupportedType)?;

        fs::create_dir_all(&self.dir).await?;
        let name = format!("{}.{extension}", Uuid::new_v4());
        fs::write(self.dir.join(&name), data).await?;

        tracing::info!(file = %name, size = data.len(), "Upload stored");
        Ok(format!("{UPLOADS_URL_PREFIX}/{name}"))
    }

    /// Remove a file returned by [`Self::store`] whose record was never
    /// written. Failures are logged, not returned.
    pub async fn discard(&self, url: &str) {
        let Some(name) = url
            .strip_prefix(UPLOADS_URL_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| {
                !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
            })
        else {
            tracing::warn!(url, "Refusing to discard a path outside the upload directory");
            return;
        };
        match fs::remove_file(self.dir.join(name)).await {
            Ok(()) => tracing::info!(file = %name, "Orphaned upload removed"),
            Err(e) => tracing::warn!(file = %name, error = %e, "Failed to remove orphaned upload"),
        }
    }
}

fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

fn sniff_extension(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("gif")
    } else if data.starts_with(b"RIFF") && data.get(8..12) == Some(b"WEBP".as_slice()) {
        Some("webp")
    } else {
        None
    }
}
