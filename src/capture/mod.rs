//! Screen capture session management
//!
//! - `source`: platform capability traits (`CaptureSource`, `MediaTrack`) and session metadata
//! - `controller`: the single-slot `StreamController` with external-termination detection

pub mod controller;
pub mod source;

pub use controller::StreamController;
pub use source::{
    CaptureConstraints, CaptureSource, MediaStream, MediaTrack, SessionInfo, TrackEnded,
    TrackInfo, TrackKind, TrackSettings,
};
