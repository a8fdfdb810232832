use crate::config::{SessionConfig, SessionStorageMode};
use crate::export::expand_tilde;
use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Read-only view of the recording preferences.
pub trait Preferences {
    /// Period between ticks; zero disables the timer.
    fn recording_interval(&self) -> Duration;
    fn auto_clear(&self) -> bool;
    /// Directory new session documents are created in.
    fn session_directory(&self) -> &Path;
}

/// Runtime options derived from configuration for session recording.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub directory: PathBuf,
    pub interval_ms: u64,
    pub auto_clear: bool,
    pub show_indicator: bool,
    pub filename_template: String,
    pub background_export: bool,
}

impl SessionOptions {
    /// Creates a basic options struct with sensible defaults. Intended mainly for tests.
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            interval_ms: 5000,
            auto_clear: false,
            show_indicator: true,
            filename_template: crate::config::types::default_filename_template(),
            background_export: false,
        }
    }
}

impl Preferences for SessionOptions {
    fn recording_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    fn auto_clear(&self) -> bool {
        self.auto_clear
    }

    fn session_directory(&self) -> &Path {
        &self.directory
    }
}

/// Build runtime session options from configuration values.
pub fn options_from_config(
    session_cfg: &SessionConfig,
    config_dir: &Path,
) -> Result<SessionOptions> {
    let directory = match session_cfg.storage {
        SessionStorageMode::Auto => {
            let root = dirs::document_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| config_dir.to_path_buf());
            root.join("Alchemy")
        }
        SessionStorageMode::Config => config_dir.join("sessions"),
        SessionStorageMode::Custom => {
            let raw = session_cfg.custom_directory.as_ref().ok_or_else(|| {
                anyhow!("session.custom_directory must be set when storage = \"custom\"")
            })?;
            let expanded = expand_tilde(raw);
            if expanded.as_os_str().is_empty() {
                return Err(anyhow!(
                    "session.custom_directory resolved to an empty path"
                ));
            }
            expanded
        }
    };

    let mut options = SessionOptions::new(directory);
    options.interval_ms = session_cfg.interval_ms;
    options.auto_clear = session_cfg.auto_clear;
    options.show_indicator = session_cfg.show_indicator;
    options.filename_template = session_cfg.filename_template.clone();
    options.background_export = session_cfg.background_export;

    Ok(options)
}
