use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CaptureError, CaptureResult};
use crate::recording::RecordingBlob;

/// Transient reference to blob data staged for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    pub id: Uuid,
    pub byte_len: usize,
}

/// Download capability: the generic "save as" path
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    async fn create_reference(&self, blob: &RecordingBlob) -> CaptureResult<BlobRef>;

    /// Deliver the referenced data under `filename`; returns where it landed
    async fn trigger_save(&self, blob_ref: &BlobRef, filename: &str) -> CaptureResult<PathBuf>;

    /// Drop the staged data; unknown references are ignored
    async fn release(&self, blob_ref: BlobRef);
}

/// Saves into a downloads directory
///
/// Blobs are staged in hidden temp files next to the destination and copied
/// to their final name on save.
pub struct DownloadsFolder {
    dir: PathBuf,
    staged: Mutex<HashMap<Uuid, NamedTempFile>>,
}

impl DownloadsFolder {
    pub fn new(dir: impl Into<PathBuf>) -> CaptureResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        info!("Downloads directory: {}", dir.display());

        Ok(Self {
            dir,
            staged: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of references not yet released
    pub async fn staged_count(&self) -> usize {
        self.staged.lock().await.len()
    }
}

#[async_trait::async_trait]
impl Downloader for DownloadsFolder {
    async fn create_reference(&self, blob: &RecordingBlob) -> CaptureResult<BlobRef> {
        let staged = tempfile::Builder::new()
            .prefix(".recording-")
            .suffix(".part")
            .tempfile_in(&self.dir)
            .map_err(|e| CaptureError::DownloadFailed(format!("staging failed: {}", e)))?;

        tokio::fs::write(staged.path(), &blob.data)
            .await
            .map_err(|e| CaptureError::DownloadFailed(format!("staging failed: {}", e)))?;

        let blob_ref = BlobRef {
            id: Uuid::new_v4(),
            byte_len: blob.len(),
        };
        debug!("Staged {} bytes as {}", blob_ref.byte_len, blob_ref.id);

        self.staged.lock().await.insert(blob_ref.id, staged);
        Ok(blob_ref)
    }

    async fn trigger_save(&self, blob_ref: &BlobRef, filename: &str) -> CaptureResult<PathBuf> {
        let source = {
            let staged = self.staged.lock().await;
            staged
                .get(&blob_ref.id)
                .map(|file| file.path().to_path_buf())
                .ok_or_else(|| {
                    CaptureError::DownloadFailed(format!("reference {} was released", blob_ref.id))
                })?
        };

        let target = self.dir.join(filename);
        tokio::fs::copy(&source, &target)
            .await
            .map_err(|e| CaptureError::DownloadFailed(format!("{}: {}", target.display(), e)))?;

        info!("Downloaded {} ({} bytes)", target.display(), blob_ref.byte_len);
        Ok(target)
    }

    async fn release(&self, blob_ref: BlobRef) {
        let removed = self.staged.lock().await.remove(&blob_ref.id);
        match removed {
            Some(file) => {
                if let Err(e) = file.close() {
                    warn!("Failed to remove staged download {}: {}", blob_ref.id, e);
                }
            }
            None => debug!("Reference {} already released", blob_ref.id),
        }
    }
}
