use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

use super::{AnnotationGeometry, AnnotationUpdate, SerializableColor};

/// Side length of the sticky note icon, in PDF units.
pub const NOTE_ICON_SIZE: f64 = 24.0;

/// A sticky note pinned at a PDF-space position (its top-left corner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickyNote {
    pub position: Point,
    pub text: String,
    pub color: SerializableColor,
}

impl StickyNote {
    pub fn new(position: Point, text: impl Into<String>, color: SerializableColor) -> Self {
        Self {
            position,
            text: text.into(),
            color,
        }
    }

    /// Icon rectangle in PDF-space.
    pub fn icon_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, Size::new(NOTE_ICON_SIZE, NOTE_ICON_SIZE))
    }
}

impl AnnotationGeometry for StickyNote {
    fn bounds(&self) -> Rect {
        self.icon_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.icon_rect().inflate(tolerance, tolerance).contains(point)
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn apply(&mut self, update: &AnnotationUpdate) {
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(text) = &update.text {
            self.text = text.clone();
        }
        if let Some(position) = update.position {
            self.position = position;
        }
    }

    fn capture(&self, update: &AnnotationUpdate) -> AnnotationUpdate {
        AnnotationUpdate {
            color: update.color.map(|_| self.color),
            text: update.text.as_ref().map(|_| self.text.clone()),
            position: update.position.map(|_| self.position),
            ..AnnotationUpdate::default()
        }
    }

    fn translation_update(&self, delta: Vec2) -> AnnotationUpdate {
        AnnotationUpdate::default().with_position(self.position + delta)
    }
}
