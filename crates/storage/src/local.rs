use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::{StorageError, StorageResult};

/// Durable store for transformed images: a flat directory served statically
/// under `/optimized/`.
///
/// Writes go to a uniquely named sibling first and are renamed into place,
/// so the visible path either holds a complete previous artifact or the new
/// one, never a partial write. Re-publishing the same name overwrites.
#[derive(Debug, Clone)]
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Create the backing directory if it does not exist yet.
    pub async fn ensure(&self) -> StorageResult<()> {
        if !self.base_path.exists() {
            debug!("Creating output directory: {:?}", self.base_path);
            fs::create_dir_all(&self.base_path).await?;
        }
        Ok(())
    }

    /// Reject names that would escape the flat output directory.
    fn validate_name<'a>(&self, filename: &'a str) -> StorageResult<&'a str> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(StorageError::InvalidName(filename.to_string()));
        }
        Ok(filename)
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.base_path.join(filename)
    }

    /// Write `data` under `filename` and return the stored byte size.
    pub async fn publish(&self, filename: &str, data: &[u8]) -> StorageResult<u64> {
        let filename = self.validate_name(filename)?;
        self.ensure().await?;

        let final_path = self.base_path.join(filename);
        let temp_path = self
            .base_path
            .join(format!(".{}.{}.tmp", filename, Uuid::new_v4().simple()));

        fs::write(&temp_path, data).await?;
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            // Leave no temp sibling behind on a failed rename.
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!("Published {:?} ({} bytes)", final_path, data.len());
        Ok(data.len() as u64)
    }

    pub async fn read(&self, filename: &str) -> StorageResult<Vec<u8>> {
        let filename = self.validate_name(filename)?;
        Ok(fs::read(self.base_path.join(filename)).await?)
    }

    /// Request-relative URL under which the artifact is served.
    pub fn url_path(&self, filename: &str) -> String {
        format!("/optimized/{filename}")
    }
}
