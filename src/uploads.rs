use std::path::{Path, PathBuf};

use chrono::Utc;
use rocket::fs::TempFile;
use tracing::{info, instrument};

use crate::error::AppError;

/// Disk-backed store for teacher images. Stored filenames are derived from a
/// millisecond timestamp plus the original extension, which keeps concurrent
/// uploads apart in practice but is not collision-proof.
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Persists an uploaded file and returns its public `/uploads/...` path.
    /// Empty form parts (a file input left blank) yield `None`.
    #[instrument(skip_all)]
    pub async fn store(&self, file: &mut TempFile<'_>) -> Result<Option<String>, AppError> {
        if file.len() == 0 {
            return Ok(None);
        }

        let mut filename = Utc::now().timestamp_millis().to_string();
        if let Some(ext) = Self::extension_of(file) {
            filename.push('.');
            filename.push_str(&ext);
        }

        let dest = self.dir.join(&filename);
        file.copy_to(&dest).await?;

        info!(path = %dest.display(), "Stored uploaded image");
        Ok(Some(format!("/uploads/{}", filename)))
    }

    fn extension_of(file: &TempFile<'_>) -> Option<String> {
        if let Some(name) = file.raw_name() {
            let raw = name.dangerous_unsafe_unsanitized_raw().as_str();
            if let Some(ext) = Path::new(raw).extension() {
                return Some(ext.to_string_lossy().into_owned());
            }
        }

        file.content_type()
            .and_then(|ct| ct.extension())
            .map(|ext| ext.as_str().to_string())
    }
}
