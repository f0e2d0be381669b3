// Test doubles for the platform capabilities
//
// Every fake appends to a shared EventLog so tests can assert ordering
// across capture, recorder and output.

#![allow(dead_code)]

use screen_recorder::capture::{
    CaptureConstraints, CaptureSource, MediaStream, MediaTrack, TrackKind, TrackSettings,
};
use screen_recorder::output::{
    AccessMode, BlobRef, DirectoryAccess, Downloader, FolderHandle, FolderStore, MemoryStore,
    OutputSink, PermissionResponse, WritableFile,
};
use screen_recorder::recording::{MediaRecorder, RecorderBackend, RecorderEvent, RecorderSettings};
use screen_recorder::{
    CaptureContext, CaptureError, CaptureResult, Enablement, Notifier, RecordingBlob,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.events().iter().position(|e| e.starts_with(prefix))
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

// ============================================================================
// Capture
// ============================================================================

pub struct FakeTrack {
    id: String,
    kind: TrackKind,
    ended_tx: watch::Sender<bool>,
    log: EventLog,
}

impl FakeTrack {
    pub fn end_externally(&self) {
        self.log.push(format!("track-ended-externally:{}", self.id));
        self.ended_tx.send_replace(true);
    }
}

#[async_trait::async_trait]
impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn label(&self) -> &str {
        "Fake Screen"
    }

    fn settings(&self) -> TrackSettings {
        TrackSettings {
            width: Some(1280),
            height: Some(720),
            frame_rate: Some(30.0),
        }
    }

    async fn ended(&self) {
        let mut rx = self.ended_tx.subscribe();
        let _ = rx.wait_for(|ended| *ended).await;
    }

    fn stop(&self) {
        if !*self.ended_tx.borrow() {
            self.log.push(format!("track-stopped:{}", self.id));
            self.ended_tx.send_replace(true);
        }
    }
}

/// What the next capture prompt answers
#[derive(Clone, Copy, Debug)]
pub enum PromptAnswer {
    Grant,
    Cancel,
    Deny,
}

pub struct FakeCapture {
    pub supported: bool,
    answers: Mutex<Vec<PromptAnswer>>,
    tracks: Mutex<Vec<Arc<FakeTrack>>>,
    pub requests: AtomicUsize,
    log: EventLog,
}

impl FakeCapture {
    pub fn new(log: EventLog) -> Self {
        Self {
            supported: true,
            answers: Mutex::new(Vec::new()),
            tracks: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
            log,
        }
    }

    pub fn unsupported(log: EventLog) -> Self {
        Self {
            supported: false,
            ..Self::new(log)
        }
    }

    /// Queue answers for upcoming prompts; unqueued prompts are granted
    pub fn answer_next(&self, answer: PromptAnswer) {
        self.answers.lock().unwrap().push(answer);
    }

    /// Tracks handed out so far
    pub fn tracks(&self) -> Vec<Arc<FakeTrack>> {
        self.tracks.lock().unwrap().clone()
    }

    /// Tracks not yet ended
    pub fn live_tracks(&self) -> usize {
        self.tracks()
            .iter()
            .filter(|t| !*t.ended_tx.borrow())
            .count()
    }
}

#[async_trait::async_trait]
impl CaptureSource for FakeCapture {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn request(
        &self,
        constraints: CaptureConstraints,
    ) -> CaptureResult<Vec<Arc<dyn MediaTrack>>> {
        let n = self.requests.fetch_add(1, Ordering::SeqCst);
        let answer = {
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                PromptAnswer::Grant
            } else {
                answers.remove(0)
            }
        };

        // The prompt is a real suspension point
        tokio::task::yield_now().await;

        match answer {
            PromptAnswer::Cancel => return Err(CaptureError::UserCancelled),
            PromptAnswer::Deny => {
                return Err(CaptureError::PermissionDenied("screen".to_string()))
            }
            PromptAnswer::Grant => {}
        }

        let mut created: Vec<Arc<FakeTrack>> = Vec::new();
        let kinds = [
            (constraints.video, TrackKind::Video),
            (constraints.audio, TrackKind::Audio),
        ];
        for (wanted, kind) in kinds {
            if wanted {
                let (ended_tx, _) = watch::channel(false);
                created.push(Arc::new(FakeTrack {
                    id: format!("{:?}-{}", kind, n).to_lowercase(),
                    kind,
                    ended_tx,
                    log: self.log.clone(),
                }));
            }
        }

        self.log.push(format!("capture-started:{}", created.len()));
        self.tracks.lock().unwrap().extend(created.iter().cloned());
        Ok(created
            .into_iter()
            .map(|t| t as Arc<dyn MediaTrack>)
            .collect())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Recorder
// ============================================================================

pub struct FakeRecorderBackend {
    pub available: bool,
    pub fail_construct: AtomicBool,
    supported: Vec<String>,
    /// Chunks each recorder emits right after starting
    chunks: Vec<Vec<u8>>,
    /// Delay between the stop request and the stop signal
    pub finalize_delay: Duration,
    pub constructed_with: Mutex<Vec<Option<String>>>,
    log: EventLog,
}

impl FakeRecorderBackend {
    pub fn new(log: EventLog) -> Self {
        Self {
            available: true,
            fail_construct: AtomicBool::new(false),
            supported: vec!["video/webm".to_string()],
            chunks: vec![b"abc".to_vec(), Vec::new(), b"defg".to_vec()],
            finalize_delay: Duration::from_millis(20),
            constructed_with: Mutex::new(Vec::new()),
            log,
        }
    }

    pub fn with_supported(mut self, supported: &[&str]) -> Self {
        self.supported = supported.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_chunks(mut self, chunks: Vec<Vec<u8>>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

impl RecorderBackend for FakeRecorderBackend {
    fn is_available(&self) -> bool {
        self.available
    }

    fn is_format_supported(&self, mime_type: &str) -> bool {
        self.supported.iter().any(|s| s == mime_type)
    }

    fn construct(
        &self,
        _stream: &MediaStream,
        preferred_format: Option<&str>,
    ) -> CaptureResult<Box<dyn MediaRecorder>> {
        self.constructed_with
            .lock()
            .unwrap()
            .push(preferred_format.map(str::to_string));

        if self.fail_construct.load(Ordering::SeqCst) {
            return Err(CaptureError::RecorderInitFailed(
                "unsupported option combination".to_string(),
            ));
        }

        Ok(Box::new(FakeRecorder {
            chunks: self.chunks.clone(),
            finalize_delay: self.finalize_delay,
            reported_mime: preferred_format.map(str::to_string),
            stop_tx: None,
            log: self.log.clone(),
        }))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct FakeRecorder {
    chunks: Vec<Vec<u8>>,
    finalize_delay: Duration,
    reported_mime: Option<String>,
    stop_tx: Option<oneshot::Sender<()>>,
    log: EventLog,
}

#[async_trait::async_trait]
impl MediaRecorder for FakeRecorder {
    async fn start(
        &mut self,
        _timeslice: Duration,
    ) -> CaptureResult<mpsc::Receiver<RecorderEvent>> {
        let (tx, rx) = mpsc::channel(16);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        self.stop_tx = Some(stop_tx);

        let chunks = self.chunks.clone();
        let delay = self.finalize_delay;
        let mime_type = self.reported_mime.clone();
        let log = self.log.clone();
        log.push("recorder-started");

        tokio::spawn(async move {
            let _ = tx.send(RecorderEvent::Started).await;
            for chunk in chunks {
                let _ = tx.send(RecorderEvent::Data(chunk)).await;
            }
            let _ = stop_rx.await;
            tokio::time::sleep(delay).await;
            let _ = tx.send(RecorderEvent::Data(b"!".to_vec())).await;
            log.push("recorder-finalized");
            let _ = tx
                .send(RecorderEvent::Stopped {
                    mime_type: mime_type.clone(),
                })
                .await;
            // A misbehaving backend firing twice must not matter
            let _ = tx.send(RecorderEvent::Stopped { mime_type }).await;
        });

        Ok(rx)
    }

    fn request_stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            self.log.push("recorder-stop-requested");
            let _ = stop_tx.send(());
        }
    }

    fn mime_type(&self) -> Option<String> {
        self.reported_mime.clone()
    }
}

// ============================================================================
// Output
// ============================================================================

pub struct FakeDirectory {
    pub query: Mutex<CaptureResult<PermissionResponse>>,
    pub request: Mutex<CaptureResult<PermissionResponse>>,
    pub fail_writes: AtomicBool,
    pub pick_result: Mutex<Option<PathBuf>>,
    log: EventLog,
}

impl FakeDirectory {
    pub fn new(log: EventLog) -> Self {
        Self {
            query: Mutex::new(Ok(PermissionResponse::Granted)),
            request: Mutex::new(Ok(PermissionResponse::Granted)),
            fail_writes: AtomicBool::new(false),
            pick_result: Mutex::new(None),
            log,
        }
    }

    pub fn set_query(&self, answer: CaptureResult<PermissionResponse>) {
        *self.query.lock().unwrap() = answer;
    }

    pub fn set_request(&self, answer: CaptureResult<PermissionResponse>) {
        *self.request.lock().unwrap() = answer;
    }

    fn replay(
        slot: &Mutex<CaptureResult<PermissionResponse>>,
    ) -> CaptureResult<PermissionResponse> {
        match &*slot.lock().unwrap() {
            Ok(answer) => Ok(*answer),
            Err(e) => Err(CaptureError::Storage(e.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl DirectoryAccess for FakeDirectory {
    async fn pick(&self, suggested: Option<PathBuf>) -> CaptureResult<FolderHandle> {
        match suggested.or_else(|| self.pick_result.lock().unwrap().clone()) {
            Some(path) => Ok(FolderHandle::new(path)),
            None => Err(CaptureError::UserCancelled),
        }
    }

    async fn query_permission(
        &self,
        _folder: &FolderHandle,
        _mode: AccessMode,
    ) -> CaptureResult<PermissionResponse> {
        self.log.push("permission-query");
        Self::replay(&self.query)
    }

    async fn request_permission(
        &self,
        _folder: &FolderHandle,
        _mode: AccessMode,
    ) -> CaptureResult<PermissionResponse> {
        self.log.push("permission-request");
        Self::replay(&self.request)
    }

    async fn open_for_write(
        &self,
        _folder: &FolderHandle,
        name: &str,
    ) -> CaptureResult<Box<dyn WritableFile>> {
        Ok(Box::new(FakeFile {
            name: name.to_string(),
            bytes: 0,
            fail: self.fail_writes.load(Ordering::SeqCst),
            log: self.log.clone(),
        }))
    }
}

struct FakeFile {
    name: String,
    bytes: usize,
    fail: bool,
    log: EventLog,
}

#[async_trait::async_trait]
impl WritableFile for FakeFile {
    async fn write(&mut self, data: &[u8]) -> CaptureResult<()> {
        self.log
            .push(format!("folder-write-attempt:{}:{}", self.name, data.len()));
        if self.fail {
            return Err(CaptureError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "handle invalidated",
            )));
        }
        self.bytes += data.len();
        Ok(())
    }

    async fn close(self: Box<Self>) -> CaptureResult<()> {
        self.log.push(format!("folder-saved:{}:{}", self.name, self.bytes));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDownloader {
    pub saves: Mutex<Vec<(String, usize)>>,
    pub released: AtomicUsize,
    pub fail: AtomicBool,
    log: EventLog,
}

impl FakeDownloader {
    pub fn new(log: EventLog) -> Self {
        Self {
            saves: Mutex::new(Vec::new()),
            released: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            log,
        }
    }

    pub fn saves(&self) -> Vec<(String, usize)> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Downloader for FakeDownloader {
    async fn create_reference(&self, blob: &RecordingBlob) -> CaptureResult<BlobRef> {
        Ok(BlobRef {
            id: uuid::Uuid::new_v4(),
            byte_len: blob.len(),
        })
    }

    async fn trigger_save(&self, blob_ref: &BlobRef, filename: &str) -> CaptureResult<PathBuf> {
        if self.fail.load(Ordering::SeqCst) {
            self.log.push(format!("download-failed:{}", filename));
            return Err(CaptureError::DownloadFailed("save dialog blocked".to_string()));
        }
        self.log
            .push(format!("download:{}:{}", filename, blob_ref.byte_len));
        self.saves
            .lock()
            .unwrap()
            .push((filename.to_string(), blob_ref.byte_len));
        Ok(PathBuf::from("/downloads").join(filename))
    }

    async fn release(&self, _blob_ref: BlobRef) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records every notification it receives
#[derive(Default)]
pub struct CountingNotifier {
    failures: Mutex<Vec<String>>,
    hints: Mutex<Vec<String>>,
}

impl CountingNotifier {
    /// Error codes of the failure notifications, in order
    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }

    pub fn hints(&self) -> Vec<String> {
        self.hints.lock().unwrap().clone()
    }
}

impl Notifier for CountingNotifier {
    fn failure(&self, error: &CaptureError) {
        self.failures.lock().unwrap().push(error.code().to_string());
    }

    fn hint(&self, text: &str) {
        self.hints.lock().unwrap().push(text.to_string());
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub log: EventLog,
    pub capture: Arc<FakeCapture>,
    pub recorder: Arc<FakeRecorderBackend>,
    pub directory: Arc<FakeDirectory>,
    pub downloader: Arc<FakeDownloader>,
    pub folders: Arc<FolderStore>,
    pub notifier: Arc<CountingNotifier>,
    pub enablement: Arc<Enablement>,
}

impl Harness {
    pub fn new() -> Self {
        let log = EventLog::default();
        Self::with(
            FakeCapture::new(log.clone()),
            FakeRecorderBackend::new(log.clone()),
            log,
        )
    }

    pub fn with(capture: FakeCapture, recorder: FakeRecorderBackend, log: EventLog) -> Self {
        let capture = Arc::new(capture);
        let recorder = Arc::new(recorder);
        let directory = Arc::new(FakeDirectory::new(log.clone()));
        let downloader = Arc::new(FakeDownloader::new(log.clone()));
        let notifier = Arc::new(CountingNotifier::default());

        let folders = Arc::new(FolderStore::new(
            Arc::new(MemoryStore::new()),
            directory.clone(),
        ));
        let sink = Arc::new(OutputSink::new(
            folders.clone(),
            downloader.clone(),
            notifier.clone(),
            Duration::from_millis(10),
        ));
        let settings = RecorderSettings {
            timeslice: Duration::from_millis(50),
            ..RecorderSettings::default()
        };

        let ctx = CaptureContext::new(capture.clone(), recorder.clone(), sink, settings);
        let enablement = Enablement::new(ctx, notifier.clone());

        Self {
            log,
            capture,
            recorder,
            directory,
            downloader,
            folders,
            notifier,
            enablement,
        }
    }
}

/// Poll until `cond` holds or a second passes
pub async fn eventually<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
