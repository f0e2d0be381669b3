use super::state::AppState;
use crate::error::CaptureError;
use crate::notify::Notice;
use crate::output::{FolderHandle, SaveOutcome};
use crate::session::{EnableOptions, StatusSnapshot};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: StatusSnapshot,

    /// Latest hint text, if any
    pub hint: Option<Notice>,

    /// Latest failure notification, if any
    pub last_failure: Option<Notice>,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub status: String,
    /// Where the recording went, when one was active
    pub saved: Option<SaveOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct PickFolderRequest {
    /// Directory to use; omitted means the user cancelled
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct FolderResponse {
    pub folder: Option<FolderHandle>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
}

fn error_response(e: CaptureError) -> Response {
    let status = match &e {
        CaptureError::Unsupported | CaptureError::RecordingUnsupported => {
            StatusCode::NOT_IMPLEMENTED
        }
        CaptureError::UserCancelled | CaptureError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        CaptureError::NotCapturing => StatusCode::CONFLICT,
        CaptureError::RecorderInitFailed(_) | CaptureError::FolderUnavailable(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("Request failed: {}", e);
    }

    (
        status,
        Json(ErrorResponse {
            code: e.code().to_string(),
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.enablement.status().await;
    Json(StatusResponse {
        status,
        hint: state.notices.last_hint(),
        last_failure: state.notices.last_failure(),
    })
}

/// POST /capture/start
/// Turn capture on (optionally recording)
pub async fn start_capture(
    State(state): State<AppState>,
    Json(options): Json<EnableOptions>,
) -> Response {
    info!("Capture start requested");
    match state.enablement.enable(options).await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /capture/stop
/// Turn capture off, saving any recording first
pub async fn stop_capture(State(state): State<AppState>) -> Response {
    info!("Capture stop requested");
    let saved = state.enablement.disable().await;
    (
        StatusCode::OK,
        Json(StopResponse {
            status: "stopped".to_string(),
            saved,
        }),
    )
        .into_response()
}

/// POST /recording/start
pub async fn start_recording(State(state): State<AppState>) -> Response {
    match state.enablement.start_recording().await {
        Ok(()) => (StatusCode::OK, Json(state.enablement.status().await)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /recording/stop
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    match state.enablement.stop_recording().await {
        Ok(saved) => (
            StatusCode::OK,
            Json(StopResponse {
                status: "saved".to_string(),
                saved,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /folder
pub async fn get_folder(State(state): State<AppState>) -> Response {
    match state.enablement.folder().await {
        Ok(folder) => (StatusCode::OK, Json(FolderResponse { folder })).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /folder
/// Choose the output folder
pub async fn pick_folder(
    State(state): State<AppState>,
    Json(req): Json<PickFolderRequest>,
) -> Response {
    match state.enablement.pick_folder(req.path).await {
        Ok(folder) => (
            StatusCode::OK,
            Json(FolderResponse {
                folder: Some(folder),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
