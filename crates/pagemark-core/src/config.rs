//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::annotation::SerializableColor;

/// Default colors and widths for newly drawn annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolStyles {
    pub highlight_color: SerializableColor,
    pub underline_color: SerializableColor,
    pub strikeout_color: SerializableColor,
    pub pen_color: SerializableColor,
    pub pen_width: f64,
    pub shape_color: SerializableColor,
    pub shape_width: f64,
    pub note_color: SerializableColor,
    pub text_color: SerializableColor,
    pub font_size: f64,
    pub font_family: String,
}

impl Default for ToolStyles {
    fn default() -> Self {
        Self {
            // Highlights are drawn translucent over the page.
            highlight_color: SerializableColor::yellow().with_alpha(102),
            underline_color: SerializableColor::new(59, 130, 246, 255),
            strikeout_color: SerializableColor::red(),
            pen_color: SerializableColor::red(),
            pen_width: 2.0,
            shape_color: SerializableColor::red(),
            shape_width: 2.0,
            note_color: SerializableColor::new(255, 235, 59, 255),
            text_color: SerializableColor::black(),
            font_size: 12.0,
            font_family: "Helvetica".to_string(),
        }
    }
}

/// Engine-wide settings. Every field has a default, so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum document zoom.
    pub min_zoom: f64,
    /// Maximum document zoom.
    pub max_zoom: f64,
    /// Multiplicative step used by zoom in/out.
    pub zoom_step: f64,
    /// Zoom given to newly opened documents.
    pub default_zoom: f64,
    /// Maximum number of undo entries kept.
    pub history_limit: usize,
    /// Hit-test tolerance in screen pixels.
    pub hit_tolerance: f64,
    /// Gestures smaller than this (screen pixels) are discarded.
    pub min_gesture_size: f64,
    pub styles: ToolStyles,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 4.0,
            zoom_step: 1.25,
            default_zoom: 1.0,
            history_limit: 100,
            hit_tolerance: 6.0,
            min_gesture_size: 2.0,
            styles: ToolStyles::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Clamp a zoom value to the configured range.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Repair inconsistent values instead of failing on them.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            log::warn!("Invalid min_zoom {}, using default", self.min_zoom);
            self.min_zoom = defaults.min_zoom;
        }
        if !(self.max_zoom.is_finite() && self.max_zoom >= self.min_zoom) {
            log::warn!("Invalid max_zoom {}, using default", self.max_zoom);
            self.max_zoom = defaults.max_zoom.max(self.min_zoom);
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            log::warn!("Invalid zoom_step {}, using default", self.zoom_step);
            self.zoom_step = defaults.zoom_step;
        }
        self.default_zoom = if self.default_zoom.is_finite() {
            self.clamp_zoom(self.default_zoom)
        } else {
            self.clamp_zoom(defaults.default_zoom)
        };
        self
    }
}
