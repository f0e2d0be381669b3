//! Error types shared by the capture, recording and output layers.

use thiserror::Error;

/// Failure kinds surfaced by the capture lifecycle
///
/// None of these are fatal to the process: each one either degrades to a
/// fallback (folder write → download) or returns the system to OFF.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("screen capture is not supported on this platform")]
    Unsupported,

    #[error("screen capture was cancelled by the user")]
    UserCancelled,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("recording is not supported on this platform")]
    RecordingUnsupported,

    #[error("failed to initialize recorder: {0}")]
    RecorderInitFailed(String),

    #[error("no capture session is active")]
    NotCapturing,

    #[error("failed to write to folder: {0}")]
    FolderWriteFailed(String),

    #[error("folder is unavailable: {0}")]
    FolderUnavailable(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CaptureError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            CaptureError::Unsupported => "UNSUPPORTED",
            CaptureError::UserCancelled => "USER_CANCELLED",
            CaptureError::PermissionDenied(_) => "PERMISSION_DENIED",
            CaptureError::RecordingUnsupported => "RECORDING_UNSUPPORTED",
            CaptureError::RecorderInitFailed(_) => "RECORDER_INIT_FAILED",
            CaptureError::NotCapturing => "NOT_CAPTURING",
            CaptureError::FolderWriteFailed(_) => "FOLDER_WRITE_FAILED",
            CaptureError::FolderUnavailable(_) => "FOLDER_UNAVAILABLE",
            CaptureError::DownloadFailed(_) => "DOWNLOAD_FAILED",
            CaptureError::Storage(_) => "STORAGE_ERROR",
            CaptureError::Io(_) => "IO_ERROR",
            CaptureError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Result type alias using CaptureError
pub type CaptureResult<T> = Result<T, CaptureError>;
