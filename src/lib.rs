pub mod app;
pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod notify;
pub mod output;
pub mod recording;
pub mod session;
pub mod synthetic;

pub use capture::{
    CaptureConstraints, CaptureSource, MediaStream, MediaTrack, SessionInfo, StreamController,
    TrackKind,
};
pub use config::Config;
pub use error::{CaptureError, CaptureResult};
pub use http::{create_router, AppState};
pub use notify::{HintBoard, Notifier, TracingNotifier};
pub use output::{
    build_filename, DirectoryAccess, Downloader, FolderHandle, FolderStore, KeyValueStore,
    OutputSink, PermissionOutcome, SaveOutcome,
};
pub use recording::{
    RecorderBackend, RecorderSettings, RecordingBlob, RecordingController, RecordingState,
};
pub use session::{CaptureContext, EnableOptions, Enablement, StatusSnapshot};
