use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::backend::{MediaRecorder, RecorderBackend, RecorderEvent};
use super::blob::RecordingBlob;
use super::codec::{select_format, DEFAULT_MIME_TYPE, PREFERRED_FORMATS};
use crate::capture::MediaStream;
use crate::error::{CaptureError, CaptureResult};
use crate::output::{build_filename, OutputSink, SaveOutcome};

/// Recording lifecycle: `Inactive → Recording → Stopping → Inactive`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    #[default]
    Inactive,
    Recording,
    Stopping,
}

impl RecordingState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RecordingState::Recording,
            2 => RecordingState::Stopping,
            _ => RecordingState::Inactive,
        }
    }
}

/// Recording state readable without access to the controller
///
/// Stays current while `stop()` is finalizing and saving.
#[derive(Debug, Clone, Default)]
pub struct SharedRecordingState(Arc<AtomicU8>);

impl SharedRecordingState {
    pub fn get(&self) -> RecordingState {
        RecordingState::from_u8(self.0.load(Ordering::SeqCst))
    }

    fn set(&self, state: RecordingState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

/// Settings for the recording controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderSettings {
    /// Periodic flush interval; bounds buffered memory on long sessions
    pub timeslice: Duration,

    /// Container/codec candidates, most preferred first
    pub preferred_formats: Vec<String>,

    /// How long to wait for the recorder's stop signal before warning
    pub finalize_warn_after: Duration,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            timeslice: Duration::from_millis(1000),
            preferred_formats: PREFERRED_FORMATS.iter().map(|f| f.to_string()).collect(),
            finalize_warn_after: Duration::from_secs(5),
        }
    }
}

/// Live numbers about the recording in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingStats {
    pub recording_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub mime_type: Option<String>,
    pub chunks: usize,
    pub bytes: usize,
}

/// Output of the ingest task, produced exactly once
struct Finalized {
    chunks: Vec<Vec<u8>>,
    reported_mime_type: Option<String>,
}

struct ActiveRecording {
    id: Uuid,
    started_at: DateTime<Utc>,
    recorder: Box<dyn MediaRecorder>,
    mime_type: Option<String>,
    ingest: JoinHandle<Finalized>,
    chunk_count: Arc<AtomicUsize>,
    byte_count: Arc<AtomicUsize>,
}

/// Records the live capture stream into one finished blob
///
/// Holds at most one recording. `stop()` finalizes the recorder and hands
/// the result to the `OutputSink` before returning, so callers that await it
/// can safely tear down the capture stream afterwards.
pub struct RecordingController {
    backend: Arc<dyn RecorderBackend>,
    sink: Arc<OutputSink>,
    settings: RecorderSettings,
    state: SharedRecordingState,
    active: Option<ActiveRecording>,
}

impl RecordingController {
    pub fn new(
        backend: Arc<dyn RecorderBackend>,
        sink: Arc<OutputSink>,
        settings: RecorderSettings,
    ) -> Self {
        Self {
            backend,
            sink,
            settings,
            state: SharedRecordingState::default(),
            active: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state.get()
    }

    /// Handle that tracks `state()` from outside the controller
    pub fn shared_state(&self) -> SharedRecordingState {
        self.state.clone()
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    pub fn is_recording(&self) -> bool {
        self.state() != RecordingState::Inactive
    }

    /// Pick the container/codec to ask the recorder for
    pub fn negotiate_format(&self) -> Option<String> {
        select_format(&self.settings.preferred_formats, |candidate| {
            self.backend.is_format_supported(candidate)
        })
    }

    /// Start recording `stream`
    ///
    /// No-op when already recording. On error the controller stays Inactive
    /// and the capture stream is left untouched.
    pub async fn start(&mut self, stream: &MediaStream) -> CaptureResult<()> {
        if self.is_recording() {
            warn!("Recording already active");
            return Ok(());
        }

        if !self.backend.is_available() {
            warn!("Recorder backend {} is unavailable", self.backend.name());
            return Err(CaptureError::RecordingUnsupported);
        }

        if self.settings.timeslice.is_zero() {
            return Err(CaptureError::RecorderInitFailed(
                "timeslice must be greater than zero".to_string(),
            ));
        }

        let mime_type = self.negotiate_format();
        match &mime_type {
            Some(m) => info!("Negotiated recording format: {}", m),
            None => info!("No preferred format supported, using recorder default"),
        }

        let mut recorder = self.backend.construct(stream, mime_type.as_deref())?;
        let events = recorder
            .start(self.settings.timeslice)
            .await
            .map_err(|e| match e {
                e @ CaptureError::RecorderInitFailed(_) => e,
                other => CaptureError::RecorderInitFailed(other.to_string()),
            })?;

        let id = Uuid::new_v4();
        let chunk_count = Arc::new(AtomicUsize::new(0));
        let byte_count = Arc::new(AtomicUsize::new(0));
        let ingest = spawn_ingest(
            id,
            events,
            Arc::clone(&chunk_count),
            Arc::clone(&byte_count),
        );

        self.active = Some(ActiveRecording {
            id,
            started_at: Utc::now(),
            recorder,
            mime_type,
            ingest,
            chunk_count,
            byte_count,
        });
        self.state.set(RecordingState::Recording);

        info!(
            "Recording {} started (stream {}, flush every {}ms)",
            id,
            stream.id(),
            self.settings.timeslice.as_millis()
        );

        Ok(())
    }

    /// Finalize the recording and deliver it
    ///
    /// No-op (returns `None`) when Inactive. Otherwise waits for the
    /// recorder's stop signal, builds the blob, clears buffered chunks, goes
    /// Inactive and saves through the sink.
    pub async fn stop(&mut self) -> Option<CaptureResult<SaveOutcome>> {
        let Some(mut active) = self.active.take() else {
            debug!("Recording stop requested while inactive");
            return None;
        };

        info!("Stopping recording {}", active.id);
        self.state.set(RecordingState::Stopping);

        active.recorder.request_stop();

        // The join handle is consumed here, so finalize is observed once
        let finalized = match await_finalize(
            active.id,
            active.ingest,
            self.settings.finalize_warn_after,
        )
        .await
        {
            Ok(finalized) => finalized,
            Err(e) => {
                error!("Recording ingest task failed: {}", e);
                Finalized {
                    chunks: Vec::new(),
                    reported_mime_type: None,
                }
            }
        };

        let mime_type = active
            .mime_type
            .or(finalized.reported_mime_type)
            .or_else(|| active.recorder.mime_type())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        let chunk_total = finalized.chunks.len();
        let blob = RecordingBlob::from_chunks(finalized.chunks, mime_type);
        self.state.set(RecordingState::Inactive);

        info!(
            "Recording {} finalized: {} chunks, {} bytes ({})",
            active.id,
            chunk_total,
            blob.len(),
            blob.mime_type
        );

        let filename = build_filename(Local::now().naive_local(), &blob.mime_type);
        let outcome = self.sink.save(&blob, &filename).await;
        if let Err(e) = &outcome {
            error!("Failed to deliver recording {}: {}", filename, e);
        }

        Some(outcome)
    }

    pub fn stats(&self) -> Option<RecordingStats> {
        self.active.as_ref().map(|active| RecordingStats {
            recording_id: active.id,
            started_at: active.started_at,
            mime_type: active.mime_type.clone(),
            chunks: active.chunk_count.load(Ordering::SeqCst),
            bytes: active.byte_count.load(Ordering::SeqCst),
        })
    }
}

/// Wait for the ingest task, warning once if the recorder is slow to stop
async fn await_finalize(
    id: Uuid,
    mut ingest: JoinHandle<Finalized>,
    warn_after: Duration,
) -> Result<Finalized, tokio::task::JoinError> {
    match tokio::time::timeout(warn_after, &mut ingest).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "Recorder for {} has not stopped after {}ms, still waiting",
                id,
                warn_after.as_millis()
            );
            ingest.await
        }
    }
}

/// Collect recorder output until the first `Stopped` event
fn spawn_ingest(
    id: Uuid,
    mut events: mpsc::Receiver<RecorderEvent>,
    chunk_count: Arc<AtomicUsize>,
    byte_count: Arc<AtomicUsize>,
) -> JoinHandle<Finalized> {
    tokio::spawn(async move {
        let mut chunks = Vec::new();
        let mut reported_mime_type = None;

        while let Some(event) = events.recv().await {
            match event {
                RecorderEvent::Started => debug!("Recorder {} started", id),
                RecorderEvent::Data(chunk) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    chunk_count.fetch_add(1, Ordering::SeqCst);
                    byte_count.fetch_add(chunk.len(), Ordering::SeqCst);
                    chunks.push(chunk);
                }
                RecorderEvent::Error(msg) => warn!("Recorder {} reported: {}", id, msg),
                RecorderEvent::Stopped { mime_type } => {
                    reported_mime_type = mime_type;
                    break;
                }
            }
        }

        Finalized {
            chunks,
            reported_mime_type,
        }
    })
}
