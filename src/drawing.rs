//! Drawing files: the committed shapes of a canvas stored as (optionally
//! gzip-compressed) JSON.

use crate::draw::{Canvas, CanvasSettings, Category, Color, Shape};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use flate2::{Compression, bufread::GzDecoder, write::GzEncoder};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const CURRENT_VERSION: u32 = 1;

/// A canvas's committed record plus the viewport it was drawn in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    pub width: i32,
    pub height: i32,
    /// Overrides the configured background when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

impl Drawing {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            version: CURRENT_VERSION,
            last_modified: None,
            width,
            height,
            background: None,
            shapes: Vec::new(),
        }
    }

    /// Captures the committed shapes and background of `canvas`.
    pub fn from_canvas(canvas: &Canvas) -> Self {
        Self {
            version: CURRENT_VERSION,
            last_modified: None,
            width: canvas.width(),
            height: canvas.height(),
            background: Some(canvas.colors().background()),
            shapes: canvas.shapes(Category::Committed).to_vec(),
        }
    }

    /// Builds a canvas showing this drawing.
    pub fn to_canvas(&self, mut settings: CanvasSettings) -> Canvas {
        if let Some(background) = self.background {
            settings.background = background;
        }
        let mut canvas = Canvas::new(self.width, self.height, settings);
        canvas.load_committed(self.shapes.clone());
        canvas
    }
}

/// Reads a drawing, transparently decompressing gzip input.
pub fn load_drawing(path: &Path) -> Result<Drawing> {
    let mut file_bytes = Vec::new();
    {
        let mut file = File::open(path)
            .with_context(|| format!("failed to open drawing {}", path.display()))?;
        file.read_to_end(&mut file_bytes)
            .context("failed to read drawing")?;
    }

    let compressed = is_gzip(&file_bytes);
    let decompressed = if compressed {
        let mut decoder = GzDecoder::new(&file_bytes[..]);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .context("failed to decompress drawing")?;
        out
    } else {
        file_bytes
    };

    let drawing: Drawing =
        serde_json::from_slice(&decompressed).context("failed to parse drawing json")?;

    if drawing.version > CURRENT_VERSION {
        bail!(
            "drawing {} has unsupported version {}",
            path.display(),
            drawing.version
        );
    }
    if drawing.width <= 0 || drawing.height <= 0 {
        bail!(
            "drawing {} has invalid size {}x{}",
            path.display(),
            drawing.width,
            drawing.height
        );
    }

    debug!(
        "Loaded drawing {} ({} shapes, compressed={})",
        path.display(),
        drawing.shapes.len(),
        compressed
    );
    Ok(drawing)
}

/// Writes a drawing through a temporary file in the destination directory.
pub fn save_drawing(drawing: &Drawing, path: &Path, compress: bool) -> Result<()> {
    let payload = Drawing {
        version: CURRENT_VERSION,
        last_modified: Some(Utc::now().to_rfc3339()),
        ..drawing.clone()
    };

    let mut bytes = serde_json::to_vec_pretty(&payload).context("failed to serialise drawing")?;
    if compress {
        bytes = compress_bytes(&bytes)?;
    }

    let tmp_path = temp_path(path);
    {
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .with_context(|| format!("failed to open temporary drawing {}", tmp_path.display()))?;
        tmp_file
            .write_all(&bytes)
            .context("failed to write drawing")?;
        tmp_file
            .sync_all()
            .context("failed to sync temporary drawing")?;
    }

    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "failed to move temporary drawing {} -> {}",
            tmp_path.display(),
            path.display()
        )
    })?;

    info!(
        "Drawing saved to {} ({} bytes, compression={})",
        path.display(),
        bytes.len(),
        compress
    );
    Ok(())
}

fn compress_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .context("failed to compress drawing")?;
    encoder
        .finish()
        .context("failed to finalise compressed drawing")
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() > 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

fn temp_path(target: &Path) -> PathBuf {
    let mut candidate = target.with_extension("json.tmp");
    let mut counter = 0u32;
    while candidate.exists() {
        counter += 1;
        candidate = target.with_extension(format!("json.tmp{}", counter));
    }
    candidate
}
