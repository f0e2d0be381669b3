//! Capture enablement
//!
//! This module provides the `Enablement` coordinator that composes:
//! - Screen capture (`StreamController`)
//! - Optional recording (`RecordingController`)
//! - Delivery of the finished file (`OutputSink`)
//!
//! into a single ON/OFF lifecycle with finalize-before-teardown ordering.

mod config;
mod enablement;
mod status;

pub use config::EnableOptions;
pub use enablement::{CaptureContext, Enablement};
pub use status::StatusSnapshot;
