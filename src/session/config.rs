use serde::{Deserialize, Serialize};

use crate::capture::CaptureConstraints;

/// What to turn on when capture is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnableOptions {
    /// Capture the screen (default: true)
    #[serde(default = "default_true")]
    pub video: bool,

    /// Capture audio alongside the screen
    #[serde(default)]
    pub audio: bool,

    /// Also record the capture to a file
    #[serde(default)]
    pub record: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EnableOptions {
    fn default() -> Self {
        Self {
            video: true,
            audio: false,
            record: false,
        }
    }
}

impl EnableOptions {
    pub fn constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            video: self.video,
            audio: self.audio,
        }
    }
}
