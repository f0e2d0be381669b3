use futures::future::{select_all, BoxFuture};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::source::{CaptureConstraints, CaptureSource, MediaStream, SessionInfo, TrackEnded};
use crate::error::{CaptureError, CaptureResult};

/// Owns the single capture session slot
///
/// Every started session gets a watcher task that emits one `TrackEnded`
/// notice as soon as any of its tracks ends. The receiving side is taken by
/// the coordinator, which runs the same teardown as an explicit stop.
pub struct StreamController {
    source: Arc<dyn CaptureSource>,
    active: Option<ActiveCapture>,
    ended_tx: mpsc::UnboundedSender<TrackEnded>,
    ended_rx: Option<mpsc::UnboundedReceiver<TrackEnded>>,
}

struct ActiveCapture {
    stream: MediaStream,
    info: SessionInfo,
    watcher: JoinHandle<()>,
}

impl StreamController {
    pub fn new(source: Arc<dyn CaptureSource>) -> Self {
        let (ended_tx, ended_rx) = mpsc::unbounded_channel();
        Self {
            source,
            active: None,
            ended_tx,
            ended_rx: Some(ended_rx),
        }
    }

    /// Take the receiver for track-ended notices (only once)
    pub fn take_terminations(&mut self) -> Option<mpsc::UnboundedReceiver<TrackEnded>> {
        self.ended_rx.take()
    }

    pub fn is_supported(&self) -> bool {
        self.source.is_supported()
    }

    /// Start a capture session
    ///
    /// Returns the existing session's info if one is already active.
    pub async fn start(&mut self, constraints: CaptureConstraints) -> CaptureResult<SessionInfo> {
        if let Some(active) = &self.active {
            warn!("Capture already active: {}", active.info.id);
            return Ok(active.info.clone());
        }

        if !self.source.is_supported() {
            return Err(CaptureError::Unsupported);
        }

        info!(
            "Requesting capture from {} (video={}, audio={})",
            self.source.name(),
            constraints.video,
            constraints.audio
        );

        let tracks = self.source.request(constraints).await?;
        let stream = MediaStream::new(tracks);
        let info = SessionInfo::describe(&stream);
        let watcher = watch_tracks(&stream, self.ended_tx.clone());

        for track in &info.tracks {
            info!(
                "Capture track {}: {:?} '{}' ({}x{} @ {} fps)",
                track.id,
                track.kind,
                track.label,
                track.width.map(|w| w.to_string()).unwrap_or_else(|| "?".into()),
                track.height.map(|h| h.to_string()).unwrap_or_else(|| "?".into()),
                track.frame_rate.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "?".into()),
            );
        }
        info!("Capture session started: {}", info.id);

        self.active = Some(ActiveCapture {
            stream,
            info: info.clone(),
            watcher,
        });

        Ok(info)
    }

    /// Release all tracks and clear the session; no-op when inactive
    ///
    /// Returns whether a session was torn down.
    pub fn stop(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            debug!("Capture stop requested with no active session");
            return false;
        };

        // Cancel the watcher first so our own track.stop() calls don't echo
        // back as an external termination.
        active.watcher.abort();

        for track in active.stream.tracks() {
            track.stop();
        }

        info!("Capture session stopped: {}", active.info.id);
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The live stream, e.g. for binding a preview or a recorder
    pub fn stream(&self) -> Option<&MediaStream> {
        self.active.as_ref().map(|a| &a.stream)
    }

    pub fn info(&self) -> Option<&SessionInfo> {
        self.active.as_ref().map(|a| &a.info)
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        if self.stop() {
            warn!("Capture session released on drop");
        }
    }
}

/// Spawn a task that reports the first track to end
fn watch_tracks(
    stream: &MediaStream,
    ended_tx: mpsc::UnboundedSender<TrackEnded>,
) -> JoinHandle<()> {
    let session_id = stream.id();
    let tracks = stream.tracks().to_vec();

    tokio::spawn(async move {
        if tracks.is_empty() {
            return;
        }

        let endings: Vec<BoxFuture<'static, String>> = tracks
            .into_iter()
            .map(|track| -> BoxFuture<'static, String> {
                Box::pin(async move {
                    track.ended().await;
                    track.id().to_string()
                })
            })
            .collect();

        let (track_id, _, _) = select_all(endings).await;
        debug!("Track {} of session {} ended", track_id, session_id);

        // Receiver gone means the coordinator was dropped; nothing to notify
        let _ = ended_tx.send(TrackEnded {
            session_id,
            track_id,
        });
    })
}
