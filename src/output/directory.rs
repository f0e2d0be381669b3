use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{CaptureError, CaptureResult};

/// Last-known permission of a persisted folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    #[default]
    Unknown,
}

/// Answer from a permission query or request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionResponse {
    Granted,
    Denied,
    /// Not decided yet; a request would prompt
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    ReadWrite,
}

/// Capability reference to a writable directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderHandle {
    pub path: PathBuf,
    pub name: String,
    #[serde(default)]
    pub permission: PermissionState,
}

impl FolderHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            path,
            name,
            permission: PermissionState::Unknown,
        }
    }
}

/// An open file inside a folder
#[async_trait::async_trait]
pub trait WritableFile: Send {
    async fn write(&mut self, data: &[u8]) -> CaptureResult<()>;

    /// Flush and commit the file
    async fn close(self: Box<Self>) -> CaptureResult<()>;
}

/// Directory capability: picking, permissions and file creation
#[async_trait::async_trait]
pub trait DirectoryAccess: Send + Sync {
    /// Let the user choose a folder; `UserCancelled` when they don't
    async fn pick(&self, suggested: Option<PathBuf>) -> CaptureResult<FolderHandle>;

    async fn query_permission(
        &self,
        folder: &FolderHandle,
        mode: AccessMode,
    ) -> CaptureResult<PermissionResponse>;

    async fn request_permission(
        &self,
        folder: &FolderHandle,
        mode: AccessMode,
    ) -> CaptureResult<PermissionResponse>;

    /// Create or truncate `name` inside the folder
    async fn open_for_write(
        &self,
        folder: &FolderHandle,
        name: &str,
    ) -> CaptureResult<Box<dyn WritableFile>>;
}

/// Folders on the local filesystem
///
/// There is no interactive prompt here: "picking" validates a supplied path
/// and permissions reflect what the filesystem reports.
#[derive(Debug, Default, Clone)]
pub struct LocalDirectories;

impl LocalDirectories {
    pub fn new() -> Self {
        Self
    }

    async fn inspect(path: &Path, mode: AccessMode) -> PermissionResponse {
        match tokio::fs::metadata(path).await {
            Ok(meta) if !meta.is_dir() => PermissionResponse::Denied,
            Ok(meta) if mode == AccessMode::ReadWrite && meta.permissions().readonly() => {
                PermissionResponse::Denied
            }
            Ok(_) => PermissionResponse::Granted,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PermissionResponse::Prompt,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                PermissionResponse::Denied
            }
            Err(e) => {
                debug!("Could not inspect {}: {}", path.display(), e);
                PermissionResponse::Prompt
            }
        }
    }
}

#[async_trait::async_trait]
impl DirectoryAccess for LocalDirectories {
    async fn pick(&self, suggested: Option<PathBuf>) -> CaptureResult<FolderHandle> {
        let Some(path) = suggested else {
            return Err(CaptureError::UserCancelled);
        };

        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| CaptureError::FolderUnavailable(format!("{}: {}", path.display(), e)))?;
        if !meta.is_dir() {
            return Err(CaptureError::FolderUnavailable(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        let path = tokio::fs::canonicalize(&path).await?;
        info!("Picked folder: {}", path.display());
        Ok(FolderHandle::new(path))
    }

    async fn query_permission(
        &self,
        folder: &FolderHandle,
        mode: AccessMode,
    ) -> CaptureResult<PermissionResponse> {
        Ok(Self::inspect(&folder.path, mode).await)
    }

    async fn request_permission(
        &self,
        folder: &FolderHandle,
        mode: AccessMode,
    ) -> CaptureResult<PermissionResponse> {
        // A folder removed since it was picked stays gone
        match Self::inspect(&folder.path, mode).await {
            PermissionResponse::Granted => Ok(PermissionResponse::Granted),
            PermissionResponse::Prompt => {
                info!("{} is no longer available", folder.path.display());
                Ok(PermissionResponse::Denied)
            }
            PermissionResponse::Denied => Ok(PermissionResponse::Denied),
        }
    }

    async fn open_for_write(
        &self,
        folder: &FolderHandle,
        name: &str,
    ) -> CaptureResult<Box<dyn WritableFile>> {
        let path = folder.path.join(name);
        let file = tokio::fs::File::create(&path).await?;
        debug!("Opened {} for writing", path.display());
        Ok(Box::new(LocalFile { file, path }))
    }
}

struct LocalFile {
    file: tokio::fs::File,
    path: PathBuf,
}

#[async_trait::async_trait]
impl WritableFile for LocalFile {
    async fn write(&mut self, data: &[u8]) -> CaptureResult<()> {
        self.file.write_all(data).await?;
        Ok(())
    }

    async fn close(mut self: Box<Self>) -> CaptureResult<()> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        debug!("Closed {}", self.path.display());
        Ok(())
    }
}
