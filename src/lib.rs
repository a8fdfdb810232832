//! Alchemy drawing canvas.
//!
//! Exposes the shape store and renderer, the input router that drives create
//! and affect modules, the session recorder and the bitmap/PDF exporters, so
//! hosts and external tools share one implementation with the `alchemy`
//! binary.

pub mod config;
pub mod draw;
pub mod drawing;
pub mod export;
pub mod input;
pub mod session;
pub mod util;

pub use config::Config;
