pub mod backend;
pub mod blob;
pub mod codec;
pub mod controller;

pub use backend::{MediaRecorder, RecorderBackend, RecorderEvent};
pub use blob::RecordingBlob;
pub use codec::{extension_for, select_format, DEFAULT_MIME_TYPE, PREFERRED_FORMATS};
pub use controller::{
    RecorderSettings, RecordingController, RecordingState, RecordingStats, SharedRecordingState,
};
