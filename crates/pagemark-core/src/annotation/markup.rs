//! Text markup annotations (highlight, underline, strikeout).

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{AnnotationGeometry, AnnotationUpdate, SerializableColor};

/// A rectangle over page text, drawn as a highlight, underline or strikeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMarkup {
    /// Covered area in PDF-space.
    pub rect: Rect,
    pub color: SerializableColor,
    /// Covered page text, when the text layer was known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl TextMarkup {
    pub fn new(rect: Rect, color: SerializableColor) -> Self {
        Self {
            rect: rect.abs(),
            color,
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Baseline segment used for underlines.
    pub fn underline(&self) -> (Point, Point) {
        (
            Point::new(self.rect.x0, self.rect.y1),
            Point::new(self.rect.x1, self.rect.y1),
        )
    }

    /// Midline segment used for strikeouts.
    pub fn strikeout(&self) -> (Point, Point) {
        let y = self.rect.center().y;
        (Point::new(self.rect.x0, y), Point::new(self.rect.x1, y))
    }
}

impl AnnotationGeometry for TextMarkup {
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
        if let Some(rect) = update.rect {
            self.rect = rect;
        }
        if let Some(text) = &update.text {
            self.text = (!text.is_empty()).then(|| text.clone());
        }
    }

    fn capture(&self, update: &AnnotationUpdate) -> AnnotationUpdate {
        AnnotationUpdate {
            color: update.color.map(|_| self.color),
            rect: update.rect.map(|_| self.rect),
            // Empty text clears the covered text.
            text: update
                .text
                .as_ref()
                .map(|_| self.text.clone().unwrap_or_default()),
            ..AnnotationUpdate::default()
        }
    }

    fn translation_update(&self, delta: Vec2) -> AnnotationUpdate {
        AnnotationUpdate::default().with_rect(self.rect + delta)
    }
}
