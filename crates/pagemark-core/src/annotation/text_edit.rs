//! In-place text edit overlays.
//!
//! A text edit covers a region of the page and renders replacement text
//! on top of it. The underlying page content is never modified.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{AnnotationGeometry, AnnotationUpdate, SerializableColor};

/// Replacement text drawn over a page region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEdit {
    /// Page text the edit replaces (empty for newly placed text).
    pub original_text: String,
    pub edited_text: String,
    /// Font size in PDF units.
    pub font_size: f64,
    pub font_family: String,
    /// Covered region in PDF-space.
    pub rect: Rect,
    pub color: SerializableColor,
}

impl TextEdit {
    /// Create an edit whose text starts out equal to `original_text`.
    pub fn new(
        original_text: impl Into<String>,
        rect: Rect,
        font_size: f64,
        font_family: impl Into<String>,
        color: SerializableColor,
    ) -> Self {
        let original_text = original_text.into();
        Self {
            edited_text: original_text.clone(),
            original_text,
            font_size,
            font_family: font_family.into(),
            rect: rect.abs(),
            color,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.edited_text != self.original_text
    }

    /// Baseline origin of the first line of text.
    pub fn text_origin(&self) -> Point {
        Point::new(self.rect.x0, self.rect.y0 + self.font_size)
    }
}

impl AnnotationGeometry for TextEdit {
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.rect.inflate(tolerance, tolerance).contains(point)
    }

    fn translate(&mut self, delta: Vec2) {
        self.rect = self.rect + delta;
    }

    fn apply(&mut self, update: &AnnotationUpdate) {
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(text) = &update.text {
            self.edited_text = text.clone();
        }
        if let Some(rect) = update.rect {
            self.rect = rect;
        }
        if let Some(size) = update.font_size {
            self.font_size = size;
        }
        if let Some(family) = &update.font_family {
            self.font_family = family.clone();
        }
    }

    fn capture(&self, update: &AnnotationUpdate) -> AnnotationUpdate {
        AnnotationUpdate {
            color: update.color.map(|_| self.color),
            text: update.text.as_ref().map(|_| self.edited_text.clone()),
            rect: update.rect.map(|_| self.rect),
            font_size: update.font_size.map(|_| self.font_size),
            font_family: update.font_family.as_ref().map(|_| self.font_family.clone()),
            ..AnnotationUpdate::default()
        }
    }

    fn translation_update(&self, delta: Vec2) -> AnnotationUpdate {
        AnnotationUpdate::default().with_rect(self.rect + delta)
    }
}
