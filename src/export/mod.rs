//! Bitmap and PDF export of the canvas.
//!
//! This module provides:
//! - Raster export (PNG through Cairo, JPEG and BMP through `image`)
//! - Single-page PDF rendering with document metadata, sized to the canvas
//!   or fitted onto a paper size
//! - Appending pages to a multi-page PDF, guarded by a lock file

pub mod bitmap;
pub mod file;
pub mod merge;
pub mod pdf;
pub mod types;


pub use bitmap::{encode_bitmap, export_bitmap, save_bitmap};
pub use file::{ensure_directory_exists, expand_tilde, generate_filename, write_atomic};
pub use merge::{OutputLock, append_pages, page_size};
pub use pdf::{export_fit_pdf, export_single_pdf, render_pdf_fit, render_pdf_page, save_single_pdf};
pub use types::{BitmapFormat, DocumentInfo, ExportError, PageSize, creator_string};
