//! Configuration type definitions.

use super::enums::{ColorSpec, SessionStorageMode};
use crate::draw::ShapeStyle;
use crate::export::BitmapFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Drawing-related settings.
///
/// Controls the initial appearance of new shapes when the canvas opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DrawingConfig {
    /// Foreground (pen) color - either a named color (red, green, blue, yellow, orange,
    /// pink, white, black) or an RGB array like `[255, 0, 0]` for red
    #[serde(default = "default_foreground")]
    pub foreground: ColorSpec,

    /// Canvas background color; always drawn opaque
    #[serde(default = "default_background")]
    pub background: ColorSpec,

    /// Opacity applied to new shapes (valid range: 0.0 - 1.0)
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Stroke width in pixels (valid range: 0.5 - 200.0)
    #[serde(default = "default_line_width")]
    pub line_width: f64,

    /// Whether new shapes are stroked or filled
    #[serde(default)]
    pub style: ShapeStyle,

    /// Anti-aliased rendering
    #[serde(default = "default_smoothing")]
    pub smoothing: bool,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            foreground: default_foreground(),
            background: default_background(),
            alpha: default_alpha(),
            line_width: default_line_width(),
            style: ShapeStyle::default(),
            smoothing: default_smoothing(),
        }
    }
}

/// Session recording settings.
///
/// While recording, the canvas is appended as a new PDF page every
/// `interval_ms` whenever it changed since the previous page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionConfig {
    /// Recording interval in milliseconds (0 disables the timer; otherwise 100 - 3600000)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Clear the canvas after each recorded page
    #[serde(default)]
    pub auto_clear: bool,

    /// Flash the record indicator after each recorded page
    #[serde(default = "default_show_indicator")]
    pub show_indicator: bool,

    /// Where session PDFs are stored: auto, config or custom
    #[serde(default)]
    pub storage: SessionStorageMode,

    /// Directory used when `storage = "custom"` (supports `~/`)
    #[serde(default)]
    pub custom_directory: Option<String>,

    /// chrono format string for new session documents
    #[serde(default = "default_filename_template")]
    pub filename_template: String,

    /// Merge pages on a background worker instead of the drawing loop
    #[serde(default = "default_background_export")]
    pub background_export: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            auto_clear: false,
            show_indicator: default_show_indicator(),
            storage: SessionStorageMode::default(),
            custom_directory: None,
            filename_template: default_filename_template(),
            background_export: default_background_export(),
        }
    }
}

/// Bitmap export defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExportConfig {
    /// png, jpeg or bmp
    #[serde(default)]
    pub format: BitmapFormat,

    /// Skip the background (only for formats with alpha)
    #[serde(default)]
    pub transparent: bool,

    /// Output scale factor (valid range: 0.1 - 8.0)
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: BitmapFormat::default(),
            transparent: false,
            scale: default_scale(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_foreground() -> ColorSpec {
    ColorSpec::Name("black".to_string())
}

fn default_background() -> ColorSpec {
    ColorSpec::Name("white".to_string())
}

fn default_alpha() -> f64 {
    1.0
}

fn default_line_width() -> f64 {
    3.0
}

fn default_smoothing() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_show_indicator() -> bool {
    true
}

pub(crate) fn default_filename_template() -> String {
    "Alchemy-%Y-%m-%d-%H-%M-%S".to_string()
}

fn default_background_export() -> bool {
    true
}

fn default_scale() -> f64 {
    1.0
}
