//! Input handling and module dispatch.
//!
//! This module translates host pointer and pen events into notifications for
//! the active create module and affect modules. It tracks the pointer phase,
//! hover state and pen readings along the way.

pub mod events;
pub mod freehand;
pub mod module;
pub mod router;

#[cfg(test)]
mod tests;

// Re-export commonly used types at module level
pub use events::{InputEvent, MouseButton, PenKind, PenLevels, PointerEvent, PointerKind};
pub use freehand::Freehand;
pub use module::{CanvasModule, ModuleContext, Modules, PointerNotification};
pub use router::{Hover, InputRouter, PenState, Phase};
