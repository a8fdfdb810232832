//! Single-page PDF export through Cairo.

use super::file::write_atomic;
use super::types::{DocumentInfo, ExportError, PageSize};
use crate::draw::Canvas;
use std::path::Path;

/// Renders the export frame as a one-page PDF sized to the viewport.
pub fn render_pdf_page(canvas: &Canvas, info: &DocumentInfo) -> Result<Vec<u8>, ExportError> {
    let width = canvas.width() as f64;
    let height = canvas.height() as f64;
    if width <= 0.0 || height <= 0.0 {
        return Err(ExportError::Render(crate::draw::RenderError::InvalidSize {
            width: canvas.width(),
            height: canvas.height(),
        }));
    }

    render_pdf(width, height, info, |ctx| canvas.render_export_into(ctx, false))
}

/// Renders the export frame onto one `page`-sized PDF page, scaled down to
/// fit and centred.
pub fn render_pdf_fit(
    canvas: &Canvas,
    info: &DocumentInfo,
    page: PageSize,
) -> Result<Vec<u8>, ExportError> {
    render_pdf(page.width, page.height, info, |ctx| {
        canvas.render_export_fit(ctx, page.width, page.height)
    })
}

fn render_pdf<F>(
    width: f64,
    height: f64,
    info: &DocumentInfo,
    paint: F,
) -> Result<Vec<u8>, ExportError>
where
    F: FnOnce(&cairo::Context) -> Result<(), crate::draw::RenderError>,
{
    let surface = cairo::PdfSurface::for_stream(width, height, Vec::<u8>::new())?;
    surface.set_metadata(cairo::PdfMetadata::Title, &info.title)?;
    surface.set_metadata(cairo::PdfMetadata::Author, &info.author)?;
    surface.set_metadata(cairo::PdfMetadata::Creator, &info.creator)?;
    surface.set_metadata(cairo::PdfMetadata::Keywords, &info.keywords)?;
    {
        let ctx = cairo::Context::new(&surface)?;
        paint(&ctx)?;
        ctx.show_page()?;
    }

    let stream = surface
        .finish_output_stream()
        .map_err(|err| ExportError::Malformed(format!("{:?}", err.error)))?;
    let bytes = stream
        .downcast::<Vec<u8>>()
        .map_err(|_| ExportError::Malformed("unexpected PDF stream type".to_string()))?;
    Ok(*bytes)
}

/// Writes the canvas to `path` as a fresh single-page document.
pub fn export_single_pdf(
    canvas: &Canvas,
    path: &Path,
    info: &DocumentInfo,
) -> Result<(), ExportError> {
    let bytes = render_pdf_page(canvas, info)?;
    write_atomic(path, &bytes)?;
    log::info!("Saved PDF {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Writes the canvas to `path` fitted onto a `page`-sized sheet.
pub fn export_fit_pdf(
    canvas: &Canvas,
    path: &Path,
    info: &DocumentInfo,
    page: PageSize,
) -> Result<(), ExportError> {
    let bytes = render_pdf_fit(canvas, info, page)?;
    write_atomic(path, &bytes)?;
    log::info!(
        "Saved PDF {} fitted to {}x{} pt",
        path.display(),
        page.width,
        page.height
    );
    Ok(())
}

/// [`export_single_pdf`] that logs failures instead of returning them.
pub fn save_single_pdf(canvas: &Canvas, path: &Path, info: &DocumentInfo) -> bool {
    match export_single_pdf(canvas, path, info) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("PDF export to {} failed: {}", path.display(), err);
            false
        }
    }
}
