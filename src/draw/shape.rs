//! Shape definitions: a path plus the style it was stamped with.

use super::color::Color;
use crate::util::Rect;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a shape's path is painted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShapeStyle {
    /// Outline drawn with round caps and bevel joins
    #[default]
    Stroke,
    /// Interior filled with the shape color
    Fill,
}

impl ShapeStyle {
    pub fn toggled(self) -> Self {
        match self {
            ShapeStyle::Stroke => ShapeStyle::Fill,
            ShapeStyle::Fill => ShapeStyle::Stroke,
        }
    }
}

/// One segment of a [`Path`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathSegment {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    /// Quadratic Bezier with a single control point
    QuadTo {
        cx: f64,
        cy: f64,
        x: f64,
        y: f64,
    },
    /// Cubic Bezier with two control points
    CurveTo {
        c1x: f64,
        c1y: f64,
        c2x: f64,
        c2y: f64,
        x: f64,
        y: f64,
    },
    Close,
}

/// Ordered sequence of path segments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Polyline through the given points.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let mut path = Self::new();
        if let Some((&(x0, y0), rest)) = points.split_first() {
            path.move_to(x0, y0);
            for &(x, y) in rest {
                path.line_to(x, y);
            }
        }
        path
    }

    /// Closed axis-aligned rectangle.
    pub fn rectangle(x: f64, y: f64, w: f64, h: f64) -> Self {
        let mut path = Self::from_points(&[(x, y), (x + w, y), (x + w, y + h), (x, y + h)]);
        path.close();
        path
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.segments.push(PathSegment::MoveTo { x, y });
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.segments.push(PathSegment::LineTo { x, y });
        self
    }

    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) -> &mut Self {
        self.segments.push(PathSegment::QuadTo { cx, cy, x, y });
        self
    }

    pub fn curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) -> &mut Self {
        self.segments.push(PathSegment::CurveTo {
            c1x,
            c1y,
            c2x,
            c2y,
            x,
            y,
        });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.segments.push(PathSegment::Close);
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last point of the path, used by tools that extend a stroke.
    pub fn last_point(&self) -> Option<(f64, f64)> {
        self.segments.iter().rev().find_map(|segment| match *segment {
            PathSegment::MoveTo { x, y }
            | PathSegment::LineTo { x, y }
            | PathSegment::QuadTo { x, y, .. }
            | PathSegment::CurveTo { x, y, .. } => Some((x, y)),
            PathSegment::Close => None,
        })
    }

    /// Bounds of every point and control point as `(min_x, min_y, max_x, max_y)`.
    ///
    /// Control points make this conservative for curves, which is what damage
    /// tracking needs.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        let mut include = |x: f64, y: f64| {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                }
            });
        };

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo { x, y } | PathSegment::LineTo { x, y } => include(x, y),
                PathSegment::QuadTo { cx, cy, x, y } => {
                    include(cx, cy);
                    include(x, y);
                }
                PathSegment::CurveTo {
                    c1x,
                    c1y,
                    c2x,
                    c2y,
                    x,
                    y,
                } => {
                    include(c1x, c1y);
                    include(c2x, c2y);
                    include(x, y);
                }
                PathSegment::Close => {}
            }
        }

        bounds
    }
}

/// A drawable path stamped with its style, color and line width.
///
/// Shapes never read the canvas's current color or width: whatever was active
/// when the shape was created is stored here and used for every later render.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub path: Path,
    pub style: ShapeStyle,
    pub color: Color,
    /// Stroke width in pixels (ignored for fills)
    pub line_width: f64,
}

impl Shape {
    pub fn new(path: Path, style: ShapeStyle, color: Color, line_width: f64) -> Self {
        Self {
            path,
            style,
            color,
            line_width,
        }
    }

    pub fn stroke(path: Path, color: Color, line_width: f64) -> Self {
        Self::new(path, ShapeStyle::Stroke, color, line_width)
    }

    pub fn fill(path: Path, color: Color) -> Self {
        Self::new(path, ShapeStyle::Fill, color, 1.0)
    }

    /// Returns the axis-aligned bounding box, expanded to cover the stroke width.
    ///
    /// Returns `None` only for an empty path.
    pub fn bounding_box(&self) -> Option<Rect> {
        let (min_x, min_y, max_x, max_y) = self.path.bounds()?;
        let padding = match self.style {
            ShapeStyle::Stroke => stroke_padding(self.line_width),
            ShapeStyle::Fill => 1.0,
        };
        ensure_positive_rect_f64(
            min_x - padding,
            min_y - padding,
            max_x + padding,
            max_y + padding,
        )
    }
}

fn stroke_padding(width: f64) -> f64 {
    (width / 2.0).ceil().max(1.0)
}

fn ensure_positive_rect_f64(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Option<Rect> {
    let min_x = min_x.floor() as i32;
    let min_y = min_y.floor() as i32;
    let max_x = (max_x.ceil() as i32).max(min_x + 1);
    let max_y = (max_y.ceil() as i32).max(min_y + 1);
    Rect::from_min_max(min_x, min_y, max_x, max_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::color::WHITE;

    #[test]
    fn stroke_bounding_box_expands_with_width() {
        let shape = Shape::stroke(Path::from_points(&[(10.0, 20.0), (30.0, 40.0)]), WHITE, 6.0);

        let rect = shape.bounding_box().expect("stroke should have bounds");
        assert_eq!(rect.x, 7);
        assert_eq!(rect.y, 17);
        assert_eq!(rect.width, 26);
        assert_eq!(rect.height, 26);
    }

    #[test]
    fn curve_bounds_include_control_points() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).curve_to(10.0, -20.0, 30.0, 50.0, 40.0, 0.0);

        let (min_x, min_y, max_x, max_y) = path.bounds().unwrap();
        assert_eq!((min_x, min_y, max_x, max_y), (0.0, -20.0, 40.0, 50.0));
    }

    #[test]
    fn empty_path_has_no_bounds() {
        let shape = Shape::fill(Path::new(), WHITE);
        assert!(shape.bounding_box().is_none());
        assert!(shape.path.last_point().is_none());
    }

    #[test]
    fn single_point_stroke_is_not_degenerate() {
        let shape = Shape::stroke(Path::from_points(&[(5.0, 5.0)]), WHITE, 1.0);
        let rect = shape.bounding_box().unwrap();
        assert!(rect.width > 0 && rect.height > 0);
    }

    #[test]
    fn shapes_serialize_with_tagged_segments() {
        let shape = Shape::fill(Path::rectangle(0.0, 0.0, 4.0, 2.0), WHITE);
        let json = serde_json::to_string(&shape).unwrap();
        assert!(json.contains("\"op\":\"move_to\""));
        assert!(json.contains("\"style\":\"fill\""));
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shape);
    }
}
