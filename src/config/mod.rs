//! Configuration file support for alchemy.
//!
//! This module handles loading and validating user settings from the configuration file
//! located at `~/.config/alchemy/config.toml`. Settings include drawing defaults,
//! session recording and bitmap export.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod enums;
pub mod types;

// Re-export commonly used types at module level
pub use enums::{ColorSpec, SessionStorageMode};
pub use types::{DrawingConfig, ExportConfig, SessionConfig};

use crate::draw::{BLACK, CanvasSettings, WHITE};
use anyhow::{Context, Result};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure containing all user settings.
///
/// This is the root configuration type that gets deserialized from the TOML file.
/// All fields have sensible defaults and will use those if not specified in the config file.
///
/// # Example TOML
/// ```toml
/// [drawing]
/// foreground = "red"
/// background = [250, 250, 240]
/// line_width = 3.0
///
/// [session]
/// interval_ms = 5000
/// auto_clear = true
/// storage = "custom"
/// custom_directory = "~/Sketches"
///
/// [export]
/// format = "png"
/// scale = 2.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Initial drawing settings (colors, width, style)
    #[serde(default)]
    pub drawing: DrawingConfig,

    /// Session recording preferences
    #[serde(default)]
    pub session: SessionConfig,

    /// Bitmap export defaults
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Validates and clamps all configuration values to acceptable ranges.
    ///
    /// Invalid values are clamped to the nearest valid value and a warning is logged.
    ///
    /// Validated ranges:
    /// - `drawing.alpha`: 0.0 - 1.0
    /// - `drawing.line_width`: 0.5 - 200.0
    /// - `session.interval_ms`: 0, or 100 - 3600000
    /// - `export.scale`: 0.1 - 8.0
    pub fn validate_and_clamp(&mut self) {
        if !(0.0..=1.0).contains(&self.drawing.alpha) {
            log::warn!(
                "Invalid alpha {:.2}, clamping to 0.0-1.0 range",
                self.drawing.alpha
            );
            self.drawing.alpha = if self.drawing.alpha.is_nan() {
                1.0
            } else {
                self.drawing.alpha.clamp(0.0, 1.0)
            };
        }

        if !(0.5..=200.0).contains(&self.drawing.line_width) {
            log::warn!(
                "Invalid line_width {:.1}, clamping to 0.5-200.0 range",
                self.drawing.line_width
            );
            self.drawing.line_width = if self.drawing.line_width.is_nan() {
                3.0
            } else {
                self.drawing.line_width.clamp(0.5, 200.0)
            };
        }

        // Zero is a valid "no timer" setting
        if self.session.interval_ms != 0 && !(100..=3_600_000).contains(&self.session.interval_ms)
        {
            log::warn!(
                "Invalid session interval_ms {}, clamping to 100-3600000 range",
                self.session.interval_ms
            );
            self.session.interval_ms = self.session.interval_ms.clamp(100, 3_600_000);
        }

        if self.session.filename_template.trim().is_empty() {
            log::warn!("Empty session filename_template, falling back to the default");
            self.session.filename_template = types::default_filename_template();
        }

        if !(0.1..=8.0).contains(&self.export.scale) {
            log::warn!(
                "Invalid export scale {:.2}, clamping to 0.1-8.0 range",
                self.export.scale
            );
            self.export.scale = if self.export.scale.is_nan() {
                1.0
            } else {
                self.export.scale.clamp(0.1, 8.0)
            };
        }
    }

    /// Canvas settings described by the `[drawing]` section.
    pub fn canvas_settings(&self) -> CanvasSettings {
        CanvasSettings {
            foreground: self.drawing.foreground.to_color_or(BLACK),
            background: self.drawing.background.to_color_or(WHITE),
            alpha: self.drawing.alpha,
            line_width: self.drawing.line_width,
            style: self.drawing.style,
            smoothing: self.drawing.smoothing,
        }
    }

    /// Returns the configuration directory, `~/.config/alchemy`.
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not find config directory")?
            .join("alchemy"))
    }

    /// Returns the path to the configuration file.
    ///
    /// The config file is located at `~/.config/alchemy/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the default location, or returns defaults if not found.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Loads configuration from `config_path`, or returns defaults if it does not exist.
    ///
    /// All loaded values are validated and clamped to acceptable ranges.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file exists but contains invalid TOML syntax
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Serializes the config to TOML and writes it to `config_path`, creating
    /// the parent directory if needed.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// JSON schema describing the configuration file.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}
