use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::directory::{
    AccessMode, DirectoryAccess, FolderHandle, PermissionResponse, PermissionState,
};
use super::store::KeyValueStore;
use crate::error::{CaptureError, CaptureResult};

/// Namespace of the durable store
pub const STORE_NAMESPACE: &str = "screen-recorder";

/// Key holding the chosen output folder
pub const FOLDER_KEY: &str = "output-folder";

/// Result of negotiating folder permission
///
/// `UnknownTreatAsGranted` is returned when the permission API is missing or
/// failed; the following write then surfaces the concrete error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOutcome {
    Granted,
    Denied,
    UnknownTreatAsGranted,
}

impl PermissionOutcome {
    pub fn allows_write(self) -> bool {
        !matches!(self, PermissionOutcome::Denied)
    }
}

/// Single-slot persistence of the chosen output folder
pub struct FolderStore {
    store: Arc<dyn KeyValueStore>,
    directories: Arc<dyn DirectoryAccess>,
}

impl FolderStore {
    pub fn new(store: Arc<dyn KeyValueStore>, directories: Arc<dyn DirectoryAccess>) -> Self {
        Self { store, directories }
    }

    pub fn directories(&self) -> &Arc<dyn DirectoryAccess> {
        &self.directories
    }

    /// The persisted folder, if any
    ///
    /// A stored value that no longer parses is treated as absent.
    pub async fn get(&self) -> CaptureResult<Option<FolderHandle>> {
        let Some(value) = self.store.get(FOLDER_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(handle) => Ok(Some(handle)),
            Err(e) => {
                warn!("Ignoring unreadable stored folder: {}", e);
                Ok(None)
            }
        }
    }

    /// Replace the persisted folder (last write wins)
    pub async fn set(&self, handle: &FolderHandle) -> CaptureResult<()> {
        self.store
            .set(FOLDER_KEY, serde_json::to_value(handle)?)
            .await?;
        info!("Output folder set to {}", handle.path.display());
        Ok(())
    }

    /// Ask the directory capability for a folder and persist it
    ///
    /// On cancel the previous folder stays in place.
    pub async fn pick(&self, suggested: Option<PathBuf>) -> CaptureResult<FolderHandle> {
        let mut handle = self.directories.pick(suggested).await?;
        handle.permission = match self.ensure_permission(&handle).await {
            PermissionOutcome::Granted => PermissionState::Granted,
            PermissionOutcome::Denied => {
                return Err(CaptureError::PermissionDenied(format!(
                    "write access to {}",
                    handle.path.display()
                )))
            }
            PermissionOutcome::UnknownTreatAsGranted => PermissionState::Unknown,
        };

        self.set(&handle).await?;
        Ok(handle)
    }

    /// Make sure `handle` may be written, prompting if needed
    pub async fn ensure_permission(&self, handle: &FolderHandle) -> PermissionOutcome {
        let outcome = self.negotiate(handle).await;

        let permission = match outcome {
            PermissionOutcome::Granted => PermissionState::Granted,
            PermissionOutcome::Denied => PermissionState::Denied,
            PermissionOutcome::UnknownTreatAsGranted => PermissionState::Unknown,
        };
        if permission != handle.permission {
            self.remember(handle, permission).await;
        }

        outcome
    }

    async fn negotiate(&self, handle: &FolderHandle) -> PermissionOutcome {
        match self
            .directories
            .query_permission(handle, AccessMode::ReadWrite)
            .await
        {
            Ok(PermissionResponse::Granted) => return PermissionOutcome::Granted,
            Ok(_) => {}
            Err(e) => {
                warn!(
                    "Permission check for {} failed, assuming granted: {}",
                    handle.path.display(),
                    e
                );
                return PermissionOutcome::UnknownTreatAsGranted;
            }
        }

        match self
            .directories
            .request_permission(handle, AccessMode::ReadWrite)
            .await
        {
            Ok(PermissionResponse::Granted) => PermissionOutcome::Granted,
            Ok(_) => {
                info!("Write permission to {} declined", handle.path.display());
                PermissionOutcome::Denied
            }
            Err(e) => {
                warn!(
                    "Permission request for {} failed, assuming granted: {}",
                    handle.path.display(),
                    e
                );
                PermissionOutcome::UnknownTreatAsGranted
            }
        }
    }

    /// Persist the new last-known permission if `handle` is still the chosen folder
    async fn remember(&self, handle: &FolderHandle, permission: PermissionState) {
        match self.get().await {
            Ok(Some(current)) if current.path == handle.path => {
                let updated = FolderHandle {
                    permission,
                    ..current
                };
                if let Err(e) = self.set(&updated).await {
                    warn!("Could not persist folder permission: {}", e);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Could not read stored folder: {}", e),
        }
    }
}
