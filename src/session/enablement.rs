use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use super::config::EnableOptions;
use super::status::StatusSnapshot;
use crate::capture::{CaptureSource, StreamController, TrackEnded};
use crate::error::{CaptureError, CaptureResult};
use crate::notify::Notifier;
use crate::output::{FolderHandle, FolderStore, OutputSink, SaveOutcome};
use crate::recording::{
    RecorderBackend, RecorderSettings, RecordingController, RecordingState, SharedRecordingState,
};

/// The process-wide slots, owned explicitly
///
/// Each context is independent: two contexts never share a capture session,
/// recording, or folder slot.
pub struct CaptureContext {
    pub stream: StreamController,
    pub recorder: RecordingController,
    pub folders: Arc<FolderStore>,
}

impl CaptureContext {
    pub fn new(
        source: Arc<dyn CaptureSource>,
        backend: Arc<dyn RecorderBackend>,
        sink: Arc<OutputSink>,
        settings: RecorderSettings,
    ) -> Self {
        let folders = Arc::clone(sink.folders());
        Self {
            stream: StreamController::new(source),
            recorder: RecordingController::new(backend, sink, settings),
            folders,
        }
    }
}

/// The single ON/OFF toggle over capture + optional recording
///
/// All operations serialize on one lock around the `CaptureContext`. Turning
/// OFF always finalizes and saves the recording before the capture tracks
/// are released, whether the stop came from the user or from the platform
/// ending a track.
pub struct Enablement {
    ctx: Mutex<CaptureContext>,
    enabled: AtomicBool,
    recording: SharedRecordingState,
    notifier: Arc<dyn Notifier>,
}

impl Enablement {
    /// Wrap a context and start listening for externally ended tracks
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(mut ctx: CaptureContext, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        let terminations = ctx.stream.take_terminations();
        let recording = ctx.recorder.shared_state();

        let enablement = Arc::new(Self {
            ctx: Mutex::new(ctx),
            enabled: AtomicBool::new(false),
            recording,
            notifier,
        });

        match terminations {
            Some(rx) => spawn_termination_listener(Arc::downgrade(&enablement), rx),
            None => warn!("Termination notices already taken; external stops will go unnoticed"),
        }

        enablement
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Current recording state, without waiting on an operation in progress
    ///
    /// Reports `Stopping` while a recording is being finalized and saved.
    pub fn recording_state(&self) -> RecordingState {
        self.recording.get()
    }

    /// Turn capture ON, optionally recording
    ///
    /// A capture failure leaves everything OFF and issues one notification.
    /// A recorder failure is notified but capture stays ON.
    pub async fn enable(&self, options: EnableOptions) -> CaptureResult<StatusSnapshot> {
        let mut ctx = self.ctx.lock().await;

        if ctx.stream.is_active() {
            debug!("Capture already enabled");
            let snapshot = self.snapshot(&ctx);
            return Ok(with_folder(Arc::clone(&ctx.folders), snapshot).await);
        }

        info!(
            "Enabling capture (video={}, audio={}, record={})",
            options.video, options.audio, options.record
        );

        if let Err(e) = ctx.stream.start(options.constraints()).await {
            info!("Capture did not start: {}", e);
            self.reconcile(&ctx);
            self.notifier.failure(&e);
            return Err(e);
        }

        if options.record {
            if let Err(e) = self.start_recording_locked(&mut ctx).await {
                warn!("Capture is running without recording: {}", e);
                self.notifier.failure(&e);
            }
        }

        self.reconcile(&ctx);
        let snapshot = self.snapshot(&ctx);
        Ok(with_folder(Arc::clone(&ctx.folders), snapshot).await)
    }

    /// Turn capture OFF: finalize + save the recording, then release the stream
    ///
    /// No-op when already OFF.
    pub async fn disable(&self) -> Option<SaveOutcome> {
        let mut ctx = self.ctx.lock().await;
        if !ctx.stream.is_active() && !ctx.recorder.is_recording() {
            debug!("Capture already disabled");
            self.reconcile(&ctx);
            return None;
        }

        info!("Disabling capture");
        self.teardown(&mut ctx).await
    }

    /// Convenience for a single toggle control
    pub async fn toggle(&self, on: bool, options: EnableOptions) -> CaptureResult<StatusSnapshot> {
        if on {
            self.enable(options).await
        } else {
            self.disable().await;
            Ok(self.status().await)
        }
    }

    /// Start recording the live capture
    pub async fn start_recording(&self) -> CaptureResult<()> {
        let mut ctx = self.ctx.lock().await;
        let result = self.start_recording_locked(&mut ctx).await;
        if let Err(e) = &result {
            self.notifier.failure(e);
        }
        result
    }

    /// Finalize and save the current recording; capture stays ON
    pub async fn stop_recording(&self) -> CaptureResult<Option<SaveOutcome>> {
        let mut ctx = self.ctx.lock().await;
        ctx.recorder.stop().await.transpose()
    }

    /// Full status snapshot
    ///
    /// Waits for any operation in progress, including a stop that is still
    /// finalizing or saving. Use `is_enabled` and `recording_state` for a
    /// reading that never waits.
    pub async fn status(&self) -> StatusSnapshot {
        let (snapshot, folders) = {
            let ctx = self.ctx.lock().await;
            (self.snapshot(&ctx), Arc::clone(&ctx.folders))
        };
        with_folder(folders, snapshot).await
    }

    /// Choose the output folder for future recordings
    pub async fn pick_folder(&self, suggested: Option<PathBuf>) -> CaptureResult<FolderHandle> {
        let folders = Arc::clone(&self.ctx.lock().await.folders);
        match folders.pick(suggested).await {
            Ok(handle) => {
                self.notifier
                    .hint(&format!("Recordings will be saved to {}", handle.name));
                Ok(handle)
            }
            Err(CaptureError::UserCancelled) => {
                debug!("Folder pick cancelled");
                Err(CaptureError::UserCancelled)
            }
            Err(e) => {
                self.notifier.failure(&e);
                Err(e)
            }
        }
    }

    pub async fn folder(&self) -> CaptureResult<Option<FolderHandle>> {
        let folders = Arc::clone(&self.ctx.lock().await.folders);
        folders.get().await
    }

    async fn start_recording_locked(&self, ctx: &mut CaptureContext) -> CaptureResult<()> {
        let Some(stream) = ctx.stream.stream().cloned() else {
            return Err(CaptureError::NotCapturing);
        };
        ctx.recorder.start(&stream).await
    }

    /// Finalize-before-teardown
    async fn teardown(&self, ctx: &mut CaptureContext) -> Option<SaveOutcome> {
        let saved = ctx.recorder.stop().await.and_then(Result::ok);
        ctx.stream.stop();
        self.reconcile(ctx);
        saved
    }

    async fn on_track_ended(&self, ended: TrackEnded) {
        let mut ctx = self.ctx.lock().await;

        match ctx.stream.info() {
            Some(info) if info.id == ended.session_id => {}
            _ => {
                debug!(
                    "Ignoring end of track {} from stale session {}",
                    ended.track_id, ended.session_id
                );
                return;
            }
        }

        warn!(
            "Capture track {} ended outside the app, stopping session {}",
            ended.track_id, ended.session_id
        );
        self.teardown(&mut ctx).await;
    }

    fn reconcile(&self, ctx: &CaptureContext) {
        self.enabled.store(ctx.stream.is_active(), Ordering::SeqCst);
    }

    /// Status of everything but the folder, which needs an async lookup
    fn snapshot(&self, ctx: &CaptureContext) -> StatusSnapshot {
        StatusSnapshot {
            capture_supported: ctx.stream.is_supported(),
            recording_supported: ctx.recorder.is_available(),
            enabled: self.is_enabled(),
            recording: ctx.recorder.state(),
            session: ctx.stream.info().cloned(),
            recording_stats: ctx.recorder.stats(),
            folder: None,
        }
    }
}

async fn with_folder(folders: Arc<FolderStore>, mut snapshot: StatusSnapshot) -> StatusSnapshot {
    snapshot.folder = match folders.get().await {
        Ok(folder) => folder,
        Err(e) => {
            warn!("Could not read output folder: {}", e);
            None
        }
    };
    snapshot
}

fn spawn_termination_listener(
    enablement: Weak<Enablement>,
    mut terminations: mpsc::UnboundedReceiver<TrackEnded>,
) {
    tokio::spawn(async move {
        while let Some(ended) = terminations.recv().await {
            let Some(enablement) = enablement.upgrade() else {
                break;
            };
            enablement.on_track_ended(ended).await;
        }
        debug!("Termination listener stopped");
    });
}
