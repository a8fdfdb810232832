//! Built-in create module: freehand strokes following the pointer.

use super::events::PointerEvent;
use super::module::{CanvasModule, ModuleContext};
use crate::draw::{Category, Path};

/// Draws a polyline while a button is held and commits it on release.
///
/// With a pen, the stroke width scales with the pressure sampled at the press.
#[derive(Debug, Default)]
pub struct Freehand {
    drawing: bool,
}

impl Freehand {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CanvasModule for Freehand {
    fn name(&self) -> &str {
        "freehand"
    }

    fn on_pointer_pressed(&mut self, event: &PointerEvent, ctx: &mut ModuleContext<'_>) {
        let (x, y) = event.position();
        let mut path = Path::new();
        path.move_to(x, y);
        let mut shape = ctx.canvas.new_shape(path);
        if ctx.pen.is_pen() {
            shape.line_width *= ctx.pen.pressure().max(0.05);
        }
        ctx.canvas.push(Category::Creating, shape);
        self.drawing = true;
    }

    fn on_pointer_dragged(&mut self, event: &PointerEvent, ctx: &mut ModuleContext<'_>) {
        if !self.drawing {
            return;
        }
        let (x, y) = event.position();
        ctx.canvas.update_current(Category::Creating, |shape| {
            shape.path.line_to(x, y);
        });
    }

    fn on_pointer_released(&mut self, _event: &PointerEvent, ctx: &mut ModuleContext<'_>) {
        if std::mem::take(&mut self.drawing) {
            ctx.canvas.commit(Category::Creating);
        }
    }

    fn on_cleared(&mut self, _ctx: &mut ModuleContext<'_>) {
        self.drawing = false;
    }
}
