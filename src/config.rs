use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::recording::{RecorderSettings, PREFERRED_FORMATS};
use crate::session::EnableOptions;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Defaults for the enable toggle
#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    pub video: bool,
    pub audio: bool,
    /// Also record when capture is enabled
    pub record: bool,
}

#[derive(Debug, Deserialize)]
pub struct RecordingConfig {
    /// Recorder flush interval
    pub timeslice_ms: u64,
    /// Container/codec candidates, most preferred first
    pub preferred_formats: Vec<String>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            timeslice_ms: 1000,
            preferred_formats: PREFERRED_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Where the folder preference is persisted
    pub state_path: String,
    /// Fallback download destination
    pub downloads_path: String,
    /// How long a staged download outlives its save action
    pub release_delay_ms: u64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("SCREEN_RECORDER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        let cfg: Config = settings
            .try_deserialize()
            .with_context(|| format!("Invalid config in {}", path))?;
        cfg.validate()
            .with_context(|| format!("Invalid config in {}", path))?;

        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.recording.timeslice_ms > 0,
            "recording.timeslice_ms must be greater than zero"
        );
        Ok(())
    }

    pub fn enable_options(&self) -> EnableOptions {
        EnableOptions {
            video: self.capture.video,
            audio: self.capture.audio,
            record: self.capture.record,
        }
    }

    pub fn recorder_settings(&self) -> RecorderSettings {
        RecorderSettings {
            timeslice: Duration::from_millis(self.recording.timeslice_ms),
            preferred_formats: self.recording.preferred_formats.clone(),
            ..RecorderSettings::default()
        }
    }

    pub fn state_dir(&self) -> PathBuf {
        expand(&self.output.state_path)
    }

    pub fn downloads_dir(&self) -> PathBuf {
        expand(&self.output.downloads_path)
    }

    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(self.output.release_delay_ms)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
