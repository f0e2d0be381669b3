use std::time::Duration;
use tokio::sync::mpsc;

use crate::capture::MediaStream;
use crate::error::CaptureResult;

/// Events emitted by a running recorder
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    /// Recorder accepted the stream and began encoding
    Started,
    /// One periodic flush of encoded data (may be empty)
    Data(Vec<u8>),
    /// Final signal after a stop request; carries the container the recorder
    /// actually used, if it reports one
    Stopped { mime_type: Option<String> },
    /// Non-fatal encoder complaint
    Error(String),
}

/// A constructed recorder bound to one stream
#[async_trait::async_trait]
pub trait MediaRecorder: Send {
    /// Begin encoding, flushing data every `timeslice`
    ///
    /// Returns a channel receiver that will receive recorder events.
    async fn start(&mut self, timeslice: Duration) -> CaptureResult<mpsc::Receiver<RecorderEvent>>;

    /// Ask the recorder to flush and finish; completion arrives as
    /// `RecorderEvent::Stopped`
    fn request_stop(&mut self);

    /// Mime type the recorder reports for its output, if known
    fn mime_type(&self) -> Option<String>;
}

/// Recording capability
///
/// Platform-specific implementations:
/// - Synthetic: test-pattern encoder (see `crate::synthetic`)
/// - Native encoders plug in here
pub trait RecorderBackend: Send + Sync {
    /// Whether recording is available at all
    fn is_available(&self) -> bool;

    /// Whether the backend can produce the given mime type
    fn is_format_supported(&self, mime_type: &str) -> bool;

    /// Build a recorder for the stream
    ///
    /// `preferred_format` is `None` when no preference entry is supported; the
    /// backend then picks its own default. Fails with `RecorderInitFailed` on an
    /// unsupported option combination.
    fn construct(
        &self,
        stream: &MediaStream,
        preferred_format: Option<&str>,
    ) -> CaptureResult<Box<dyn MediaRecorder>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
