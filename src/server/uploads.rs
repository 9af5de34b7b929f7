use crate::{Result, llm::EncodedFile};
use base64::{Engine as _, engine::general_purpose};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

const WINDOWS_DEVICE_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Reduces a client-supplied filename to a safe single path component.
///
/// Returns an empty string when nothing usable is left.
pub fn sanitize_filename(name: &str) -> String {
    let name = name.replace(['/', '\\'], " ");
    let joined = name.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');

    let stem = trimmed.split('.').next().unwrap_or_default();
    if WINDOWS_DEVICE_NAMES
        .iter()
        .any(|device| device.eq_ignore_ascii_case(stem))
    {
        return format!("_{}", trimmed);
    }
    trimmed.to_string()
}

/// Directory that holds uploads for the duration of one request.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

/// An uploaded file on disk, removed once the request is done.
#[derive(Debug)]
pub struct StoredUpload {
    path: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `data` under a unique name derived from the sanitized filename.
    pub async fn save(&self, filename: &str, data: &[u8]) -> Result<StoredUpload> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(format!("{}_{}", Uuid::new_v4().simple(), filename));
        if let Err(e) = tokio::fs::write(&path, data).await {
            // A short write can leave a partial file behind.
            discard(&path).await;
            return Err(e.into());
        }
        debug!(path = %path.display(), bytes = data.len(), "Stored upload");

        Ok(StoredUpload { path })
    }
}

impl StoredUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.path)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    pub async fn encode(&self) -> Result<EncodedFile> {
        let data = tokio::fs::read(&self.path).await?;
        Ok(EncodedFile {
            mime_type: self.mime_type(),
            data: general_purpose::STANDARD.encode(data),
        })
    }

    /// Best-effort delete; failures are only logged.
    pub async fn remove(self) {
        discard(&self.path).await;
    }
}

async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove upload"),
    }
}
