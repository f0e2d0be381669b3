//! User-facing notifications
//!
//! The presentation layer renders these; the core only decides when one is due.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::RwLock;
use tracing::{info, warn};

use crate::error::CaptureError;

/// Receives failure notices and hint text from the core
pub trait Notifier: Send + Sync {
    /// One user-facing message for a failed operation
    fn failure(&self, error: &CaptureError);

    /// Short status hint (e.g. where a recording was saved)
    fn hint(&self, text: &str);
}

/// Logs notifications and nothing else
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn failure(&self, error: &CaptureError) {
        warn!("Notify failure [{}]: {}", error.code(), error);
    }

    fn hint(&self, text: &str) {
        info!("Hint: {}", text);
    }
}

/// A notification kept for status queries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub code: Option<String>,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Logs notifications and retains the latest of each kind
#[derive(Debug, Default)]
pub struct HintBoard {
    last_hint: RwLock<Option<Notice>>,
    last_failure: RwLock<Option<Notice>>,
}

impl HintBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_hint(&self) -> Option<Notice> {
        self.last_hint.read().ok().and_then(|n| n.clone())
    }

    pub fn last_failure(&self) -> Option<Notice> {
        self.last_failure.read().ok().and_then(|n| n.clone())
    }
}

impl Notifier for HintBoard {
    fn failure(&self, error: &CaptureError) {
        TracingNotifier.failure(error);
        if let Ok(mut slot) = self.last_failure.write() {
            *slot = Some(Notice {
                code: Some(error.code().to_string()),
                message: error.to_string(),
                at: Utc::now(),
            });
        }
    }

    fn hint(&self, text: &str) {
        TracingNotifier.hint(text);
        if let Ok(mut slot) = self.last_hint.write() {
            *slot = Some(Notice {
                code: None,
                message: text.to_string(),
                at: Utc::now(),
            });
        }
    }
}
