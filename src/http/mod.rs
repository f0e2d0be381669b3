//! HTTP API for the presentation layer
//!
//! This module provides a REST API that forwards user intents into the core:
//! - GET /status - Support flags, enablement, recording state, folder, last hint
//! - POST /capture/start - Enable capture (body: `{video, audio, record}`)
//! - POST /capture/stop - Disable capture (saves any recording first)
//! - POST /recording/start - Start recording the live capture
//! - POST /recording/stop - Finalize and save the current recording
//! - GET /folder, POST /folder - Read or choose the output folder
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
