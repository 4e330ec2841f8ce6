//! Freehand pen strokes.

use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{AnnotationGeometry, AnnotationUpdate, SerializableColor, point_to_polyline_dist};

/// A freehand stroke through a sequence of PDF-space points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenStroke {
    pub points: Vec<Point>,
    /// Stroke width in PDF units.
    pub stroke_width: f64,
    pub color: SerializableColor,
}

impl PenStroke {
    pub fn new(points: Vec<Point>, stroke_width: f64, color: SerializableColor) -> Self {
        Self {
            points,
            stroke_width,
            color,
        }
    }

    /// Polyline path through the points.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut points = self.points.iter();
        if let Some(first) = points.next() {
            path.move_to(*first);
            for p in points {
                path.line_to(*p);
            }
        }
        path
    }
}

impl AnnotationGeometry for PenStroke {
    fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };
        let rect = self
            .points
            .iter()
            .fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p));
        let half = self.stroke_width / 2.0;
        rect.inflate(half, half)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_polyline_dist(point, &self.points) <= tolerance + self.stroke_width / 2.0
    }

    fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
    }

    fn apply(&mut self, update: &AnnotationUpdate) {
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(width) = update.stroke_width {
            self.stroke_width = width;
        }
        if let Some(points) = &update.points {
            self.points = points.clone();
        }
    }

    fn capture(&self, update: &AnnotationUpdate) -> AnnotationUpdate {
        AnnotationUpdate {
            color: update.color.map(|_| self.color),
            stroke_width: update.stroke_width.map(|_| self.stroke_width),
            points: update.points.as_ref().map(|_| self.points.clone()),
            ..AnnotationUpdate::default()
        }
    }

    fn translation_update(&self, delta: Vec2) -> AnnotationUpdate {
        AnnotationUpdate::default().with_points(self.points.iter().map(|p| *p + delta).collect())
    }
}
