//! Synthetic capture and recorder backends
//!
//! Stand-ins for a native screen-capture/encoder pair. The capture side
//! hands out tracks that behave like real ones (including ending on their
//! own via `SyntheticCapture::revoke`); the recorder emits one test-pattern
//! chunk per timeslice.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::capture::{
    CaptureConstraints, CaptureSource, MediaStream, MediaTrack, TrackKind, TrackSettings,
};
use crate::error::{CaptureError, CaptureResult};
use crate::recording::{MediaRecorder, RecorderBackend, RecorderEvent, DEFAULT_MIME_TYPE};

/// A track whose `ended()` resolves on `stop()` or `end()`
pub struct SyntheticTrack {
    id: String,
    kind: TrackKind,
    label: String,
    settings: TrackSettings,
    ended_tx: watch::Sender<bool>,
}

impl SyntheticTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>, settings: TrackSettings) -> Self {
        let (ended_tx, _) = watch::channel(false);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            label: label.into(),
            settings,
            ended_tx,
        }
    }

    /// End the track as the platform would (e.g. sharing revoked)
    pub fn end(&self) {
        self.ended_tx.send_replace(true);
    }

    pub fn is_ended(&self) -> bool {
        *self.ended_tx.borrow()
    }
}

#[async_trait::async_trait]
impl MediaTrack for SyntheticTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn settings(&self) -> TrackSettings {
        self.settings
    }

    async fn ended(&self) {
        let mut rx = self.ended_tx.subscribe();
        // Sender lives as long as self, so this only returns once ended
        let _ = rx.wait_for(|ended| *ended).await;
    }

    fn stop(&self) {
        if !self.is_ended() {
            debug!("Stopping synthetic track {}", self.id);
            self.end();
        }
    }
}

/// Capture source producing synthetic screen (and audio) tracks
pub struct SyntheticCapture {
    settings: TrackSettings,
    live: Mutex<Vec<Weak<SyntheticTrack>>>,
}

impl SyntheticCapture {
    pub fn new(width: u32, height: u32, frame_rate: f64) -> Self {
        Self {
            settings: TrackSettings {
                width: Some(width),
                height: Some(height),
                frame_rate: Some(frame_rate),
            },
            live: Mutex::new(Vec::new()),
        }
    }

    /// End every live track, like the platform's own "stop sharing" control
    pub fn revoke(&self) -> usize {
        let tracks: Vec<Arc<SyntheticTrack>> = match self.live.lock() {
            Ok(mut live) => live.drain(..).filter_map(|t| t.upgrade()).collect(),
            Err(_) => Vec::new(),
        };

        for track in &tracks {
            track.end();
        }
        info!("Revoked {} synthetic track(s)", tracks.len());
        tracks.len()
    }
}

impl Default for SyntheticCapture {
    fn default() -> Self {
        Self::new(1920, 1080, 30.0)
    }
}

#[async_trait::async_trait]
impl CaptureSource for SyntheticCapture {
    fn is_supported(&self) -> bool {
        true
    }

    async fn request(
        &self,
        constraints: CaptureConstraints,
    ) -> CaptureResult<Vec<Arc<dyn MediaTrack>>> {
        if !constraints.video && !constraints.audio {
            return Err(CaptureError::PermissionDenied(
                "nothing requested to capture".to_string(),
            ));
        }

        let mut created = Vec::new();
        if constraints.video {
            created.push(Arc::new(SyntheticTrack::new(
                TrackKind::Video,
                "Synthetic Display",
                self.settings,
            )));
        }
        if constraints.audio {
            created.push(Arc::new(SyntheticTrack::new(
                TrackKind::Audio,
                "Synthetic System Audio",
                TrackSettings::default(),
            )));
        }

        if let Ok(mut live) = self.live.lock() {
            live.retain(|t| t.strong_count() > 0);
            live.extend(created.iter().map(Arc::downgrade));
        }

        Ok(created
            .into_iter()
            .map(|t| t as Arc<dyn MediaTrack>)
            .collect())
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Recorder backend emitting a test pattern
#[derive(Debug, Clone)]
pub struct SyntheticRecorderBackend {
    supported: Vec<String>,
    chunk_size: usize,
}

impl SyntheticRecorderBackend {
    pub fn new(supported: Vec<String>, chunk_size: usize) -> Self {
        Self {
            supported,
            chunk_size,
        }
    }
}

impl Default for SyntheticRecorderBackend {
    fn default() -> Self {
        Self::new(
            vec![
                "video/webm;codecs=vp8".to_string(),
                "video/webm".to_string(),
            ],
            4096,
        )
    }
}

impl RecorderBackend for SyntheticRecorderBackend {
    fn is_available(&self) -> bool {
        true
    }

    fn is_format_supported(&self, mime_type: &str) -> bool {
        self.supported.iter().any(|s| s == mime_type)
    }

    fn construct(
        &self,
        stream: &MediaStream,
        preferred_format: Option<&str>,
    ) -> CaptureResult<Box<dyn MediaRecorder>> {
        if stream.video_tracks().next().is_none() {
            return Err(CaptureError::RecorderInitFailed(
                "stream has no video track".to_string(),
            ));
        }

        let mime_type = match preferred_format {
            Some(format) if !self.is_format_supported(format) => {
                return Err(CaptureError::RecorderInitFailed(format!(
                    "unsupported format {}",
                    format
                )))
            }
            Some(format) => format.to_string(),
            None => DEFAULT_MIME_TYPE.to_string(),
        };

        Ok(Box::new(SyntheticRecorder {
            mime_type,
            chunk_size: self.chunk_size,
            stop_tx: None,
        }))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

struct SyntheticRecorder {
    mime_type: String,
    chunk_size: usize,
    stop_tx: Option<oneshot::Sender<()>>,
}

#[async_trait::async_trait]
impl MediaRecorder for SyntheticRecorder {
    async fn start(&mut self, timeslice: Duration) -> CaptureResult<mpsc::Receiver<RecorderEvent>> {
        if self.stop_tx.is_some() {
            return Err(CaptureError::RecorderInitFailed(
                "recorder already started".to_string(),
            ));
        }
        if timeslice.is_zero() {
            return Err(CaptureError::RecorderInitFailed(
                "zero timeslice".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(100);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);

        let mime_type = self.mime_type.clone();
        let chunk_size = self.chunk_size;

        tokio::spawn(async move {
            let _ = tx.send(RecorderEvent::Started).await;

            let mut ticker = tokio::time::interval(timeslice);
            ticker.tick().await;
            let mut frame: u8 = 0;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        frame = frame.wrapping_add(1);
                        if tx.send(RecorderEvent::Data(vec![frame; chunk_size])).await.is_err() {
                            return;
                        }
                    }
                    _ = &mut stop_rx => break,
                }
            }

            // Final partial flush, then the single stop signal
            let _ = tx.send(RecorderEvent::Data(vec![0; chunk_size / 2])).await;
            let _ = tx
                .send(RecorderEvent::Stopped {
                    mime_type: Some(mime_type),
                })
                .await;
        });

        Ok(rx)
    }

    fn request_stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }

    fn mime_type(&self) -> Option<String> {
        Some(self.mime_type.clone())
    }
}
