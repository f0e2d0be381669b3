use anyhow::{Context, Result};
use std::sync::Arc;

use crate::capture::CaptureSource;
use crate::config::Config;
use crate::notify::Notifier;
use crate::output::{
    DownloadsFolder, FolderStore, JsonFileStore, LocalDirectories, OutputSink, STORE_NAMESPACE,
};
use crate::recording::RecorderBackend;
use crate::session::{CaptureContext, Enablement};

/// Wire a capture/recorder backend pair to the local filesystem outputs
/// described by `cfg`
pub async fn assemble(
    cfg: &Config,
    capture: Arc<dyn CaptureSource>,
    recorder: Arc<dyn RecorderBackend>,
    notifier: Arc<dyn Notifier>,
) -> Result<Arc<Enablement>> {
    let store = JsonFileStore::open(cfg.state_dir(), STORE_NAMESPACE)
        .await
        .context("Failed to open state store")?;
    let folders = Arc::new(FolderStore::new(
        Arc::new(store),
        Arc::new(LocalDirectories::new()),
    ));

    let downloads =
        DownloadsFolder::new(cfg.downloads_dir()).context("Failed to prepare downloads directory")?;

    let sink = Arc::new(OutputSink::new(
        folders,
        Arc::new(downloads),
        Arc::clone(&notifier),
        cfg.release_delay(),
    ));

    let ctx = CaptureContext::new(capture, recorder, sink, cfg.recorder_settings());
    Ok(Enablement::new(ctx, notifier))
}
