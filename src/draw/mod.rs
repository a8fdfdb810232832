//! Canvas model and Cairo rendering.
//!
//! - [`Shape`]: a path stamped with style, color and width
//! - [`ShapeStore`]: committed, creating, affecting and guide shape lists
//! - [`Canvas`]: store, settings, cached raster and change tracking
//! - Rendering functions shared by screen and export paths

pub mod canvas;
pub mod color;
pub mod embed;
pub mod render;
pub mod shape;
pub mod store;

pub use canvas::{Canvas, CanvasNotice, CanvasSettings, RenderError, RenderMode};
pub use color::{ActiveSlot, Color, ColorSlots};
pub use embed::{EmbeddedImage, EmbeddedPage, RasterPage};
pub use render::{render_shape, render_shapes};
pub use shape::{Path, PathSegment, Shape, ShapeStyle};
pub use store::{Category, ShapeStore};

// Re-export color constants for public API
#[allow(unused_imports)]
pub use color::{BLACK, BLUE, GREEN, ORANGE, PINK, RED, TRANSPARENT, WHITE, YELLOW};
