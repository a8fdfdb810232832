//! Raster images and external document pages composited beneath the shapes.

use std::fs::File;
use std::path::Path;

/// A page from an external document (e.g. an opened PDF) drawn under the shapes.
///
/// Implementations render at the page's natural size with the origin in the
/// top-left corner; the canvas clips the result to the page bounds.
pub trait EmbeddedPage {
    /// Page size in canvas pixels.
    fn size(&self) -> (f64, f64);

    /// Paints the page into `ctx`.
    fn render_into(&self, ctx: &cairo::Context) -> Result<(), cairo::Error>;
}

/// An [`EmbeddedPage`] backed by an already rasterised page.
#[derive(Debug, Clone)]
pub struct RasterPage {
    surface: cairo::ImageSurface,
}

impl RasterPage {
    pub fn new(surface: cairo::ImageSurface) -> Self {
        Self { surface }
    }
}

impl EmbeddedPage for RasterPage {
    fn size(&self) -> (f64, f64) {
        (self.surface.width() as f64, self.surface.height() as f64)
    }

    fn render_into(&self, ctx: &cairo::Context) -> Result<(), cairo::Error> {
        ctx.set_source_surface(&self.surface, 0.0, 0.0)?;
        ctx.paint()
    }
}

/// Raster image placed on the canvas, with its own display toggle.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    surface: cairo::ImageSurface,
    /// Top-left placement in canvas coordinates
    pub location: (i32, i32),
    /// Drawn only while `true`
    pub visible: bool,
}

impl EmbeddedImage {
    pub fn new(surface: cairo::ImageSurface) -> Self {
        Self {
            surface,
            location: (0, 0),
            visible: true,
        }
    }

    /// Loads a PNG file. A missing or malformed file yields `None` and a warning;
    /// callers simply have nothing to draw.
    pub fn load_png(path: &Path) -> Option<Self> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                log::warn!("Failed to open image {}: {}", path.display(), err);
                return None;
            }
        };
        match cairo::ImageSurface::create_from_png(&mut file) {
            Ok(surface) => {
                log::debug!(
                    "Loaded image {} ({}x{})",
                    path.display(),
                    surface.width(),
                    surface.height()
                );
                Some(Self::new(surface))
            }
            Err(err) => {
                log::warn!("Failed to decode image {}: {}", path.display(), err);
                None
            }
        }
    }

    pub fn surface(&self) -> &cairo::ImageSurface {
        &self.surface
    }

    pub fn size(&self) -> (i32, i32) {
        (self.surface.width(), self.surface.height())
    }
}
