use serde::Serialize;

use crate::capture::SessionInfo;
use crate::output::FolderHandle;
use crate::recording::{RecordingState, RecordingStats};

/// Everything the presentation layer needs to render current state
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Screen capture is available on this platform
    pub capture_supported: bool,

    /// Recording is available on this platform
    pub recording_supported: bool,

    /// Capture is ON
    pub enabled: bool,

    /// Recording lifecycle state
    pub recording: RecordingState,

    /// Live capture session, when enabled
    pub session: Option<SessionInfo>,

    /// Live recording numbers, when recording
    pub recording_stats: Option<RecordingStats>,

    /// Chosen output folder, if any
    pub folder: Option<FolderHandle>,
}
