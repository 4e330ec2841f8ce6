//! Shape annotations: rectangles, circles, lines and arrows.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{AnnotationGeometry, AnnotationUpdate, SerializableColor, point_to_segment_dist};

/// Kind of shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Line,
    Arrow,
}

impl ShapeKind {
    /// Whether the shape is a segment from its start to its end point.
    pub fn is_linear(self) -> bool {
        matches!(self, ShapeKind::Line | ShapeKind::Arrow)
    }
}

/// A shape spanning two corners in PDF-space.
///
/// `rect` keeps the gesture's start in `(x0, y0)` and its end in `(x1, y1)`
/// so that the signed width and height give a line or arrow its direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeMark {
    pub shape_kind: ShapeKind,
    pub rect: Rect,
    #[serde(default)]
    pub filled: bool,
    pub color: SerializableColor,
    pub stroke_width: f64,
}

impl ShapeMark {
    /// Create a shape from the gesture's start and end points.
    ///
    /// Rectangles and circles are normalized; lines and arrows keep their direction.
    pub fn from_corners(
        shape_kind: ShapeKind,
        start: Point,
        end: Point,
        color: SerializableColor,
        stroke_width: f64,
    ) -> Self {
        let rect = Rect::new(start.x, start.y, end.x, end.y);
        Self {
            shape_kind,
            rect: if shape_kind.is_linear() { rect } else { rect.abs() },
            filled: false,
            color,
            stroke_width,
        }
    }

    pub fn x(&self) -> f64 {
        self.rect.x0
    }

    pub fn y(&self) -> f64 {
        self.rect.y0
    }

    /// Signed width.
    pub fn width(&self) -> f64 {
        self.rect.x1 - self.rect.x0
    }

    /// Signed height.
    pub fn height(&self) -> f64 {
        self.rect.y1 - self.rect.y0
    }

    pub fn start(&self) -> Point {
        Point::new(self.rect.x0, self.rect.y0)
    }

    pub fn end(&self) -> Point {
        Point::new(self.rect.x1, self.rect.y1)
    }

    /// The two barbs of an arrow head at the end point.
    pub fn arrow_head(&self) -> Option<(Point, Point)> {
        let dir = self.end() - self.start();
        let len = dir.hypot();
        if len < f64::EPSILON {
            return None;
        }
        let unit = dir / len;
        let head = (self.stroke_width * 4.0).max(8.0).min(len);
        let back = self.end() - unit * head;
        let normal = Vec2::new(-unit.y, unit.x) * (head / 2.0);
        Some((back + normal, back - normal))
    }
}

impl AnnotationGeometry for ShapeMark {
    fn bounds(&self) -> Rect {
        let half = self.stroke_width / 2.0;
        self.rect.abs().inflate(half, half)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let reach = tolerance + self.stroke_width / 2.0;
        let rect = self.rect.abs();
        match self.shape_kind {
            ShapeKind::Line | ShapeKind::Arrow => {
                point_to_segment_dist(point, self.start(), self.end()) <= reach
            }
            ShapeKind::Rectangle => {
                if self.filled {
                    return rect.inflate(reach, reach).contains(point);
                }
                let corners = [
                    Point::new(rect.x0, rect.y0),
                    Point::new(rect.x1, rect.y0),
                    Point::new(rect.x1, rect.y1),
                    Point::new(rect.x0, rect.y1),
                ];
                (0..4).any(|i| point_to_segment_dist(point, corners[i], corners[(i + 1) % 4]) <= reach)
            }
            ShapeKind::Circle => {
                let center = rect.center();
                let rx = rect.width() / 2.0;
                let ry = rect.height() / 2.0;
                if rx < f64::EPSILON || ry < f64::EPSILON {
                    return (point - center).hypot() <= reach;
                }
                let dx = (point.x - center.x) / rx;
                let dy = (point.y - center.y) / ry;
                let norm = (dx * dx + dy * dy).sqrt();
                if self.filled && norm <= 1.0 {
                    return true;
                }
                // Approximate distance to the ellipse outline.
                (norm - 1.0).abs() * rx.min(ry) <= reach
            }
        }
    }

    fn translate(&mut self, delta: Vec2) {
        self.rect = self.rect + delta;
    }

    fn apply(&mut self, update: &AnnotationUpdate) {
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(width) = update.stroke_width {
            self.stroke_width = width;
        }
        if let Some(rect) = update.rect {
            self.rect = rect;
        }
        if let Some(filled) = update.filled {
            self.filled = filled;
        }
    }

    fn capture(&self, update: &AnnotationUpdate) -> AnnotationUpdate {
        AnnotationUpdate {
            color: update.color.map(|_| self.color),
            stroke_width: update.stroke_width.map(|_| self.stroke_width),
            rect: update.rect.map(|_| self.rect),
            filled: update.filled.map(|_| self.filled),
            ..AnnotationUpdate::default()
        }
    }

    fn translation_update(&self, delta: Vec2) -> AnnotationUpdate {
        AnnotationUpdate::default().with_rect(self.rect + delta)
    }
}
