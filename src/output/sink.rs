use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::directory::FolderHandle;
use super::download::Downloader;
use super::folder::FolderStore;
use crate::error::{CaptureError, CaptureResult};
use crate::notify::Notifier;
use crate::recording::{extension_for, RecordingBlob};

/// Filename prefix for saved recordings
pub const FILENAME_PREFIX: &str = "screen-recording";

/// Where a finished recording ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaveOutcome {
    SavedToFolder { path: PathBuf },
    Downloaded { path: PathBuf },
}

/// `screen-recording-YYYYMMDD-HHMMSS.<ext>` for a local instant
///
/// Same-second recordings share a name; the later one overwrites.
pub fn build_filename(at: NaiveDateTime, mime_type: &str) -> String {
    format!(
        "{}-{}.{}",
        FILENAME_PREFIX,
        at.format("%Y%m%d-%H%M%S"),
        extension_for(mime_type)
    )
}

/// Delivers finished recordings: chosen folder first, download otherwise
pub struct OutputSink {
    folders: Arc<FolderStore>,
    downloader: Arc<dyn Downloader>,
    notifier: Arc<dyn Notifier>,
    release_delay: Duration,
}

impl OutputSink {
    pub fn new(
        folders: Arc<FolderStore>,
        downloader: Arc<dyn Downloader>,
        notifier: Arc<dyn Notifier>,
        release_delay: Duration,
    ) -> Self {
        Self {
            folders,
            downloader,
            notifier,
            release_delay,
        }
    }

    pub fn folders(&self) -> &Arc<FolderStore> {
        &self.folders
    }

    /// Save `blob` as `filename`
    ///
    /// Folder problems never escape: they are logged and the blob is
    /// downloaded instead. Only a failed download is returned as an error.
    pub async fn save(&self, blob: &RecordingBlob, filename: &str) -> CaptureResult<SaveOutcome> {
        let folder = match self.folders.get().await {
            Ok(folder) => folder,
            Err(e) => {
                warn!("Could not read output folder, downloading instead: {}", e);
                None
            }
        };

        if let Some(folder) = folder {
            let permission = self.folders.ensure_permission(&folder).await;
            if permission.allows_write() {
                match self.write_to_folder(&folder, blob, filename).await {
                    Ok(path) => {
                        info!("Saved {} ({} bytes)", path.display(), blob.len());
                        self.notifier
                            .hint(&format!("Saved {} to {}", filename, folder.name));
                        return Ok(SaveOutcome::SavedToFolder { path });
                    }
                    Err(e) => {
                        let e = CaptureError::FolderWriteFailed(e.to_string());
                        warn!("{} ({:?}), falling back to download", e, permission);
                    }
                }
            } else {
                info!("No write permission for {}, downloading", folder.path.display());
            }
        }

        match self.download(blob, filename).await {
            Ok(path) => {
                self.notifier.hint(&format!("Downloaded {}", filename));
                Ok(SaveOutcome::Downloaded { path })
            }
            Err(e) => {
                error!("Download of {} failed: {}", filename, e);
                self.notifier.failure(&e);
                Err(e)
            }
        }
    }

    async fn write_to_folder(
        &self,
        folder: &FolderHandle,
        blob: &RecordingBlob,
        filename: &str,
    ) -> CaptureResult<PathBuf> {
        let directories = self.folders.directories();
        let mut file = directories.open_for_write(folder, filename).await?;
        file.write(&blob.data).await?;
        file.close().await?;
        Ok(folder.path.join(filename))
    }

    async fn download(&self, blob: &RecordingBlob, filename: &str) -> CaptureResult<PathBuf> {
        let blob_ref = self.downloader.create_reference(blob).await?;
        let result = self.downloader.trigger_save(&blob_ref, filename).await;

        // The save action may still be reading the reference; release later
        let downloader = Arc::clone(&self.downloader);
        let delay = self.release_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            downloader.release(blob_ref).await;
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_filename_is_deterministic() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(9, 7, 3))
            .expect("valid instant");

        assert_eq!(
            build_filename(at, "video/webm;codecs=vp9,opus"),
            "screen-recording-20240305-090703.webm"
        );
        assert_eq!(
            build_filename(at, "video/mp4"),
            "screen-recording-20240305-090703.mp4"
        );
    }
}
