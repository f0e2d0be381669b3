use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use screen_recorder::synthetic::{SyntheticCapture, SyntheticRecorderBackend};
use screen_recorder::{app, create_router, AppState, Config, EnableOptions, HintBoard};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "screen-recorder",
    version,
    about = "Screen capture with folder-or-download recording output"
)]
struct Cli {
    /// Config file (without extension)
    #[arg(long, default_value = "config/screen-recorder")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API
    Serve,

    /// Capture for a while, then end sharing from "outside" the app
    Demo {
        /// Seconds to capture before sharing is revoked
        #[arg(long, default_value_t = 3)]
        seconds: u64,

        /// Capture audio too
        #[arg(long)]
        audio: bool,

        /// Skip recording
        #[arg(long)]
        no_record: bool,
    },

    /// Choose the folder recordings are saved to
    PickFolder { path: PathBuf },

    /// Print the chosen folder
    ShowFolder,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let capture = Arc::new(SyntheticCapture::default());
    let notices = Arc::new(HintBoard::new());
    let enablement = app::assemble(
        &cfg,
        capture.clone(),
        Arc::new(SyntheticRecorderBackend::default()),
        notices.clone(),
    )
    .await?;

    match cli.command {
        Command::Serve => {
            let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!("HTTP API listening on {}", addr);

            let router = create_router(AppState::new(enablement.clone(), notices));
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await
                .context("HTTP server failed")?;

            // Don't lose a recording in progress on shutdown
            enablement.disable().await;
        }

        Command::Demo {
            seconds,
            audio,
            no_record,
        } => {
            let options = EnableOptions {
                audio,
                record: !no_record,
                ..cfg.enable_options()
            };
            let status = enablement.enable(options).await?;
            info!("Capture enabled: {}", serde_json::to_string(&status)?);

            tokio::time::sleep(Duration::from_secs(seconds)).await;
            capture.revoke();

            let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
            while enablement.is_enabled() {
                if tokio::time::Instant::now() >= deadline {
                    warn!("Session still active after revoke, stopping explicitly");
                    enablement.disable().await;
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }

            match notices.last_hint() {
                Some(hint) => info!("Done: {}", hint.message),
                None => info!("Done"),
            }
        }

        Command::PickFolder { path } => {
            let folder = enablement.pick_folder(Some(path)).await?;
            info!("Recordings will be saved to {}", folder.path.display());
        }

        Command::ShowFolder => match enablement.folder().await? {
            Some(folder) => info!(
                "Output folder: {} ({:?})",
                folder.path.display(),
                folder.permission
            ),
            None => info!(
                "No output folder chosen; recordings go to {}",
                cfg.downloads_dir().display()
            ),
        },
    }

    Ok(())
}
