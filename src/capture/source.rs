use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::CaptureResult;

/// What the capture prompt should ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    /// Capture the screen
    pub video: bool,
    /// Capture system/tab audio alongside the screen
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: false,
        }
    }
}

/// Media kind of a single track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// Settings a track reports once live (video only; all optional)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSettings {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
}

/// One constituent track of a capture session
///
/// Implementations:
/// - Synthetic: test-pattern tracks (see `crate::synthetic`)
/// - Native backends plug in behind `CaptureSource`
#[async_trait::async_trait]
pub trait MediaTrack: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> TrackKind;

    /// Human-readable source label (e.g. "Screen 1")
    fn label(&self) -> &str;

    fn settings(&self) -> TrackSettings;

    /// Resolves once the track has ended, for any reason
    ///
    /// Tracks end when `stop()` is called and also when the platform ends
    /// them on its own (e.g. the user revokes sharing from outside the app).
    async fn ended(&self);

    /// Release the track; idempotent
    fn stop(&self);
}

/// Screen capture capability
#[async_trait::async_trait]
pub trait CaptureSource: Send + Sync {
    /// Whether the platform exposes screen capture at all
    fn is_supported(&self) -> bool;

    /// Prompt for a new capture session
    ///
    /// Fails with `Unsupported`, `PermissionDenied` or `UserCancelled`.
    async fn request(
        &self,
        constraints: CaptureConstraints,
    ) -> CaptureResult<Vec<Arc<dyn MediaTrack>>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// A live capture handle: the tracks granted by one prompt
#[derive(Clone)]
pub struct MediaStream {
    id: Uuid,
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &Arc<dyn MediaTrack>> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Video)
    }

    pub fn has_audio(&self) -> bool {
        self.tracks.iter().any(|t| t.kind() == TrackKind::Audio)
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

/// Metadata about one track, for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: String,
    pub kind: TrackKind,
    pub label: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
}

/// Metadata about the live capture session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Unique session identifier
    pub id: Uuid,

    /// When the capture prompt was granted
    pub started_at: DateTime<Utc>,

    /// One entry per constituent track
    pub tracks: Vec<TrackInfo>,
}

impl SessionInfo {
    /// Recompute metadata from the stream's current tracks
    pub fn describe(stream: &MediaStream) -> Self {
        let tracks = stream
            .tracks()
            .iter()
            .map(|track| {
                let settings = match track.kind() {
                    TrackKind::Video => track.settings(),
                    TrackKind::Audio => TrackSettings::default(),
                };
                TrackInfo {
                    id: track.id().to_string(),
                    kind: track.kind(),
                    label: track.label().to_string(),
                    width: settings.width,
                    height: settings.height,
                    frame_rate: settings.frame_rate,
                }
            })
            .collect();

        Self {
            id: stream.id(),
            started_at: Utc::now(),
            tracks,
        }
    }
}

/// Notice that a track of a given session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEnded {
    pub session_id: Uuid,
    pub track_id: String,
}
