//! Annotation definitions.
//!
//! Every annotation stores its geometry in PDF-space so that it stays
//! attached to the page content at any zoom or rotation.

mod markup;
mod note;
mod pen;
mod shape;
mod text_edit;

pub use markup::TextMarkup;
pub use note::{NOTE_ICON_SIZE, StickyNote};
pub use pen::PenStroke;
pub use shape::{ShapeKind, ShapeMark};
pub use text_edit::TextEdit;

use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::DocumentId;

/// Unique identifier for annotations.
pub type AnnotationId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn yellow() -> Self {
        Self::new(255, 255, 0, 255)
    }

    pub const fn red() -> Self {
        Self::new(255, 0, 0, 255)
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
        match hex.len() {
            3 => Some(Self::new(
                channel(0..1)? * 17,
                channel(1..2)? * 17,
                channel(2..3)? * 17,
                255,
            )),
            6 => Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
            8 => Some(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbbaa`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Distance from a point to a line segment (a to b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [single] => (point - *single).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Partial update of an annotation.
///
/// Only the fields meaningful for the target variant are applied; the
/// rest are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SerializableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl AnnotationUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = Some(points);
        self
    }

    pub fn with_filled(mut self, filled: bool) -> Self {
        self.filled = Some(filled);
        self
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }
}

/// Geometry and update behavior shared by all annotation variants.
pub trait AnnotationGeometry {
    /// Bounding box in PDF-space.
    fn bounds(&self) -> Rect;

    /// Check if a PDF-space point hits this annotation.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Move the geometry by `delta` (PDF units).
    fn translate(&mut self, delta: Vec2);

    /// Apply the meaningful fields of `update`.
    fn apply(&mut self, update: &AnnotationUpdate);

    /// Current values of the meaningful fields `update` touches.
    fn capture(&self, update: &AnnotationUpdate) -> AnnotationUpdate;

    /// Update that moves this annotation by `delta`.
    fn translation_update(&self, delta: Vec2) -> AnnotationUpdate;
}

/// Variant payload of an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnnotationKind {
    Highlight(TextMarkup),
    Underline(TextMarkup),
    Strikeout(TextMarkup),
    PenStroke(PenStroke),
    Shape(ShapeMark),
    StickyNote(StickyNote),
    TextEdit(TextEdit),
}

impl AnnotationKind {
    fn geometry(&self) -> &dyn AnnotationGeometry {
        match self {
            AnnotationKind::Highlight(m)
            | AnnotationKind::Underline(m)
            | AnnotationKind::Strikeout(m) => m,
            AnnotationKind::PenStroke(p) => p,
            AnnotationKind::Shape(s) => s,
            AnnotationKind::StickyNote(n) => n,
            AnnotationKind::TextEdit(t) => t,
        }
    }

    fn geometry_mut(&mut self) -> &mut dyn AnnotationGeometry {
        match self {
            AnnotationKind::Highlight(m)
            | AnnotationKind::Underline(m)
            | AnnotationKind::Strikeout(m) => m,
            AnnotationKind::PenStroke(p) => p,
            AnnotationKind::Shape(s) => s,
            AnnotationKind::StickyNote(n) => n,
            AnnotationKind::TextEdit(t) => t,
        }
    }

    /// Short variant name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationKind::Highlight(_) => "highlight",
            AnnotationKind::Underline(_) => "underline",
            AnnotationKind::Strikeout(_) => "strikeout",
            AnnotationKind::PenStroke(_) => "pen_stroke",
            AnnotationKind::Shape(_) => "shape",
            AnnotationKind::StickyNote(_) => "sticky_note",
            AnnotationKind::TextEdit(_) => "text_edit",
        }
    }

    /// Editable text carried by the annotation, if it can be edited in place.
    pub fn editable_text(&self) -> Option<&str> {
        match self {
            AnnotationKind::StickyNote(n) => Some(&n.text),
            AnnotationKind::TextEdit(t) => Some(&t.edited_text),
            _ => None,
        }
    }

    pub fn color(&self) -> SerializableColor {
        match self {
            AnnotationKind::Highlight(m)
            | AnnotationKind::Underline(m)
            | AnnotationKind::Strikeout(m) => m.color,
            AnnotationKind::PenStroke(p) => p.color,
            AnnotationKind::Shape(s) => s.color,
            AnnotationKind::StickyNote(n) => n.color,
            AnnotationKind::TextEdit(t) => t.color,
        }
    }
}

/// A committed annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub document_id: DocumentId,
    pub page_index: usize,
    /// Monotonic creation counter; z-order tie-break.
    pub created_at: u64,
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn bounds(&self) -> Rect {
        self.kind.geometry().bounds()
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.kind.geometry().hit_test(point, tolerance)
    }

    /// Whether the annotation's bounds intersect a PDF-space rectangle.
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        let bounds = self.bounds();
        let rect = rect.abs();
        bounds.x0 <= rect.x1 && rect.x0 <= bounds.x1 && bounds.y0 <= rect.y1 && rect.y0 <= bounds.y1
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.kind.geometry_mut().translate(delta);
    }

    /// Merge a partial update into this annotation.
    pub fn apply_update(&mut self, update: &AnnotationUpdate) {
        self.kind.geometry_mut().apply(update);
    }

    /// Capture the current values of the fields `update` would change.
    ///
    /// Applying the result after `update` restores this annotation exactly.
    pub fn capture(&self, update: &AnnotationUpdate) -> AnnotationUpdate {
        self.kind.geometry().capture(update)
    }

    pub fn translation_update(&self, delta: Vec2) -> AnnotationUpdate {
        self.kind.geometry().translation_update(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(kind: AnnotationKind) -> Annotation {
        Annotation {
            id: Uuid::new_v4(),
            document_id: DocumentId::from("doc"),
            page_index: 0,
            created_at: 1,
            kind,
        }
    }

    fn all_kinds() -> Vec<AnnotationKind> {
        let rect = Rect::new(10.0, 10.0, 60.0, 30.0);
        vec![
            AnnotationKind::Highlight(TextMarkup::new(rect, SerializableColor::yellow())),
            AnnotationKind::Underline(TextMarkup::new(rect, SerializableColor::red())),
            AnnotationKind::Strikeout(TextMarkup::new(rect, SerializableColor::red())),
            AnnotationKind::PenStroke(PenStroke::new(
                vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
                2.0,
                SerializableColor::red(),
            )),
            AnnotationKind::Shape(ShapeMark::from_corners(
                ShapeKind::Arrow,
                Point::new(50.0, 50.0),
                Point::new(10.0, 20.0),
                SerializableColor::black(),
                2.0,
            )),
            AnnotationKind::StickyNote(StickyNote::new(Point::new(5.0, 5.0), "note", SerializableColor::yellow())),
            AnnotationKind::TextEdit(TextEdit::new("before", rect, 12.0, "Helvetica", SerializableColor::black())),
        ]
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(SerializableColor::from_hex("#FFFF00"), Some(SerializableColor::yellow()));
        assert_eq!(SerializableColor::from_hex("#f00"), Some(SerializableColor::red()));
        assert_eq!(
            SerializableColor::from_hex("#00000080"),
            Some(SerializableColor::new(0, 0, 0, 128))
        );
        assert_eq!(SerializableColor::from_hex("FFFF00"), None);
        assert_eq!(SerializableColor::from_hex("#zzzzzz"), None);
        let color = SerializableColor::new(1, 2, 3, 4);
        assert_eq!(SerializableColor::from_hex(&color.to_hex()), Some(color));
    }

    #[test]
    fn test_color_peniko_conversion() {
        let color = SerializableColor::new(10, 20, 30, 40);
        let peniko: Color = color.into();
        assert_eq!(SerializableColor::from(peniko), color);
    }

    #[test]
    fn test_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((point_to_segment_dist(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-9);
        assert!((point_to_segment_dist(Point::new(13.0, 4.0), a, b) - 5.0).abs() < 1e-9);
        assert_eq!(point_to_polyline_dist(Point::ORIGIN, &[]), f64::INFINITY);
    }

    #[test]
    fn test_capture_is_exact_inverse() {
        let update = AnnotationUpdate::default()
            .with_color(SerializableColor::new(1, 2, 3, 255))
            .with_stroke_width(7.0)
            .with_text("after")
            .with_rect(Rect::new(1.0, 2.0, 3.0, 4.0))
            .with_position(Point::new(9.0, 9.0))
            .with_points(vec![Point::new(1.0, 1.0), Point::new(2.0, 5.0)])
            .with_filled(true)
            .with_font_size(20.0)
            .with_font_family("Courier");

        for kind in all_kinds() {
            let original = annotation(kind);
            let inverse = original.capture(&update);
            let mut edited = original.clone();
            edited.apply_update(&update);
            assert_ne!(edited, original, "{} ignored every field", original.kind.name());
            edited.apply_update(&inverse);
            assert_eq!(edited, original, "{} did not restore", original.kind.name());
        }
    }

    #[test]
    fn test_translation_update_moves_bounds() {
        let delta = Vec2::new(5.0, -3.0);
        for kind in all_kinds() {
            let original = annotation(kind);
            let mut moved = original.clone();
            moved.apply_update(&original.translation_update(delta));
            let expected = original.bounds() + delta;
            let actual = moved.bounds();
            assert!((actual.x0 - expected.x0).abs() < 1e-9, "{}", original.kind.name());
            assert!((actual.y1 - expected.y1).abs() < 1e-9, "{}", original.kind.name());

            let mut translated = original.clone();
            translated.translate(delta);
            assert_eq!(translated, moved);
        }
    }

    #[test]
    fn test_serde_tagging() {
        let note = annotation(AnnotationKind::StickyNote(StickyNote::new(
            Point::new(1.0, 2.0),
            "hi",
            SerializableColor::yellow(),
        )));
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["kind"]["type"], "sticky_note");
        let back: Annotation = serde_json::from_value(json).unwrap();
        assert_eq!(back, note);
    }

    #[test]
    fn test_intersects_rect_accepts_reversed_rect() {
        let a = annotation(AnnotationKind::Highlight(TextMarkup::new(
            Rect::new(10.0, 10.0, 20.0, 20.0),
            SerializableColor::yellow(),
        )));
        assert!(a.intersects_rect(Rect::new(25.0, 25.0, 15.0, 15.0)));
        assert!(!a.intersects_rect(Rect::new(30.0, 30.0, 40.0, 40.0)));
    }
}
