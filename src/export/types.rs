//! Data types shared by the bitmap, PDF and merge exporters.

use crate::draw::RenderError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Raster formats the exporter can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BitmapFormat {
    #[default]
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
    Bmp,
}

impl BitmapFormat {
    pub fn extension(self) -> &'static str {
        match self {
            BitmapFormat::Png => "png",
            BitmapFormat::Jpeg => "jpg",
            BitmapFormat::Bmp => "bmp",
        }
    }

    /// Whether the format can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        matches!(self, BitmapFormat::Png | BitmapFormat::Bmp)
    }
}

impl fmt::Display for BitmapFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BitmapFormat::Png => "png",
            BitmapFormat::Jpeg => "jpeg",
            BitmapFormat::Bmp => "bmp",
        })
    }
}

impl FromStr for BitmapFormat {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "png" => Ok(BitmapFormat::Png),
            "jpg" | "jpeg" => Ok(BitmapFormat::Jpeg),
            "bmp" => Ok(BitmapFormat::Bmp),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Metadata written into every exported PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub creator: String,
    pub keywords: String,
}

impl DocumentInfo {
    /// Title "Alchemy Session", authored by the current OS user.
    pub fn session() -> Self {
        Self {
            title: "Alchemy Session".to_string(),
            author: current_user(),
            creator: creator_string(),
            keywords: "Alchemy <http://al.chemy.org>".to_string(),
        }
    }
}

/// Paper size for fit-to-page PDF output, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };
}

impl FromStr for PageSize {
    type Err = ExportError;

    /// Accepts `a4`, `letter` or `<width>x<height>` in points.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ExportError::InvalidPageSize(value.to_string());
        match value.to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::LETTER),
            other => {
                let (width, height) = other.split_once('x').ok_or_else(invalid)?;
                let width: f64 = width.trim().parse().map_err(|_| invalid())?;
                let height: f64 = height.trim().parse().map_err(|_| invalid())?;
                if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
                    Ok(PageSize { width, height })
                } else {
                    Err(invalid())
                }
            }
        }
    }
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self::session()
    }
}

/// Application name, version and build hash.
pub fn creator_string() -> String {
    format!(
        "Alchemy {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("ALCHEMY_GIT_HASH")
    )
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cairo error: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("Failed to render frame: {0}")]
    Render(#[from] RenderError),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] cairo::IoError),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Surface data unavailable: {0}")]
    Surface(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid page size: {0} (expected a4, letter or WIDTHxHEIGHT)")]
    InvalidPageSize(String),

    #[error("Malformed PDF document: {0}")]
    Malformed(String),

    #[error("Output {0} is locked by another writer")]
    Locked(PathBuf),

    #[error("Merged document {path} has {found} pages, expected {expected}")]
    Verify {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
}
