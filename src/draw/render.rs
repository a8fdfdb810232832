//! Cairo-based painting routines shared by the on-screen and export paths.

use super::color::Color;
use super::shape::{Path, PathSegment, Shape, ShapeStyle};

/// Fills the whole clip with `color`, replacing whatever is underneath.
pub fn render_background(ctx: &cairo::Context, color: Color) {
    let _ = ctx.save();
    ctx.set_operator(cairo::Operator::Source);
    color.apply_source(ctx);
    let _ = ctx.paint(); // Ignore errors - a failed paint leaves the surface transparent
    let _ = ctx.restore();
}

/// Renders shapes in order (first shape = bottom layer).
pub fn render_shapes<'a>(ctx: &cairo::Context, shapes: impl IntoIterator<Item = &'a Shape>) {
    for shape in shapes {
        render_shape(ctx, shape);
    }
}

/// Renders a single shape with its own color and width.
///
/// Strokes use round caps and bevel joins; fills use the path interior.
pub fn render_shape(ctx: &cairo::Context, shape: &Shape) {
    if shape.path.is_empty() {
        return;
    }

    shape.color.apply_source(ctx);
    trace_path(ctx, &shape.path);

    match shape.style {
        ShapeStyle::Stroke => {
            ctx.set_line_width(shape.line_width);
            ctx.set_line_cap(cairo::LineCap::Round);
            ctx.set_line_join(cairo::LineJoin::Bevel);
            let _ = ctx.stroke();
        }
        ShapeStyle::Fill => {
            ctx.set_fill_rule(cairo::FillRule::Winding);
            let _ = ctx.fill();
        }
    }
}

/// Appends `path` to the context's current path.
fn trace_path(ctx: &cairo::Context, path: &Path) {
    ctx.new_path();
    for segment in path.segments() {
        match *segment {
            PathSegment::MoveTo { x, y } => ctx.move_to(x, y),
            PathSegment::LineTo { x, y } => ctx.line_to(x, y),
            PathSegment::QuadTo { cx, cy, x, y } => {
                // Cairo only knows cubics; raise the degree from the current point
                let (x0, y0) = ctx.current_point().unwrap_or((cx, cy));
                ctx.curve_to(
                    x0 + 2.0 / 3.0 * (cx - x0),
                    y0 + 2.0 / 3.0 * (cy - y0),
                    x + 2.0 / 3.0 * (cx - x),
                    y + 2.0 / 3.0 * (cy - y),
                    x,
                    y,
                );
            }
            PathSegment::CurveTo {
                c1x,
                c1y,
                c2x,
                c2y,
                x,
                y,
            } => ctx.curve_to(c1x, c1y, c2x, c2y, x, y),
            PathSegment::Close => ctx.close_path(),
        }
    }
}

/// Small red dot in the bottom-left corner shown after a session page is saved.
pub fn render_record_indicator(ctx: &cairo::Context, canvas_height: f64) {
    let _ = ctx.save();
    ctx.set_source_rgba(1.0, 0.0, 0.0, 1.0);
    ctx.arc(8.5, canvas_height - 8.5, 3.5, 0.0, std::f64::consts::PI * 2.0);
    let _ = ctx.fill();
    let _ = ctx.restore();
}

/// Paints `surface` with its top-left corner at `(x, y)`.
pub fn render_surface(ctx: &cairo::Context, surface: &cairo::ImageSurface, x: f64, y: f64) {
    if let Err(err) = ctx.set_source_surface(surface, x, y) {
        log::warn!("Failed to use surface as paint source: {}", err);
        return;
    }
    let _ = ctx.paint();
}
