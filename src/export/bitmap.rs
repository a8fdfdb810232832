//! Raster export of the canvas.

use super::file::write_atomic;
use super::types::{BitmapFormat, ExportError};
use crate::draw::Canvas;
use std::io::Cursor;
use std::path::Path;

/// Renders the export frame and encodes it in `format`.
///
/// Transparency is honoured only when the format carries alpha; otherwise
/// the background is painted.
pub fn encode_bitmap(
    canvas: &Canvas,
    format: BitmapFormat,
    transparent: bool,
    scale: f64,
) -> Result<Vec<u8>, ExportError> {
    let transparent = transparent && format.supports_alpha();
    let surface = canvas.render_export(transparent, scale)?;
    encode_surface(surface, format, transparent)
}

/// Encodes a rendered ARGB surface.
pub fn encode_surface(
    mut surface: cairo::ImageSurface,
    format: BitmapFormat,
    keep_alpha: bool,
) -> Result<Vec<u8>, ExportError> {
    if format == BitmapFormat::Png {
        let mut out = Vec::new();
        surface.write_to_png(&mut out)?;
        return Ok(out);
    }

    let width = surface.width() as u32;
    let height = surface.height() as u32;
    let stride = surface.stride() as usize;
    let data = surface
        .data()
        .map_err(|err| ExportError::Surface(err.to_string()))?;

    let channels = if keep_alpha { 4 } else { 3 };
    let mut pixels = Vec::with_capacity(width as usize * height as usize * channels);
    for row in data.chunks(stride).take(height as usize) {
        for px in row[..width as usize * 4].chunks_exact(4) {
            let argb = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]);
            let [r, g, b, a] = unpremultiply(argb);
            pixels.extend_from_slice(&[r, g, b]);
            if keep_alpha {
                pixels.push(a);
            }
        }
    }
    drop(data);

    let image = if keep_alpha {
        image::RgbaImage::from_raw(width, height, pixels)
            .map(image::DynamicImage::ImageRgba8)
    } else {
        image::RgbImage::from_raw(width, height, pixels).map(image::DynamicImage::ImageRgb8)
    }
    .ok_or_else(|| ExportError::Surface("pixel buffer size mismatch".to_string()))?;

    let target = match format {
        BitmapFormat::Jpeg => image::ImageFormat::Jpeg,
        BitmapFormat::Bmp => image::ImageFormat::Bmp,
        BitmapFormat::Png => image::ImageFormat::Png,
    };
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, target)?;
    Ok(out.into_inner())
}

/// Converts a premultiplied `0xAARRGGBB` pixel to straight RGBA bytes.
fn unpremultiply(argb: u32) -> [u8; 4] {
    let a = (argb >> 24) as u8;
    let channel = |shift: u32| -> u8 {
        let value = ((argb >> shift) & 0xFF) as u32;
        match a {
            0 => 0,
            255 => value as u8,
            _ => ((value * 255 + a as u32 / 2) / a as u32).min(255) as u8,
        }
    };
    [channel(16), channel(8), channel(0), a]
}

/// Writes the canvas to `path` as `format`.
pub fn export_bitmap(
    canvas: &Canvas,
    path: &Path,
    format: BitmapFormat,
    transparent: bool,
    scale: f64,
) -> Result<(), ExportError> {
    let bytes = encode_bitmap(canvas, format, transparent, scale)?;
    write_atomic(path, &bytes)?;
    log::info!(
        "Exported {} ({}, {} bytes)",
        path.display(),
        format,
        bytes.len()
    );
    Ok(())
}

/// [`export_bitmap`] that logs failures instead of returning them.
pub fn save_bitmap(
    canvas: &Canvas,
    path: &Path,
    format: BitmapFormat,
    transparent: bool,
    scale: f64,
) -> bool {
    match export_bitmap(canvas, path, format, transparent, scale) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("Bitmap export to {} failed: {}", path.display(), err);
            false
        }
    }
}
