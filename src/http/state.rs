use crate::notify::HintBoard;
use crate::session::Enablement;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The capture lifecycle this server controls
    pub enablement: Arc<Enablement>,

    /// Latest hint/failure for display
    pub notices: Arc<HintBoard>,
}

impl AppState {
    pub fn new(enablement: Arc<Enablement>, notices: Arc<HintBoard>) -> Self {
        Self {
            enablement,
            notices,
        }
    }
}
