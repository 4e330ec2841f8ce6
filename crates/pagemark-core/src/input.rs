//! Pointer and keyboard events delivered to the engine.

use kurbo::Point;
use serde::{Deserialize, Serialize};

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };

    pub const CTRL_SHIFT: Self = Self {
        shift: true,
        ctrl: true,
        alt: false,
        meta: false,
    };

    /// Ctrl on Windows/Linux or Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Kind of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    DoubleClick,
}

/// A pointer event over a page surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub kind: PointerKind,
    /// Position relative to the page surface's top-left corner, in screen pixels.
    pub position: Point,
    pub page_index: usize,
    #[serde(default)]
    pub button: MouseButton,
}

impl PointerInput {
    pub fn new(kind: PointerKind, position: Point, page_index: usize) -> Self {
        Self {
            kind,
            position,
            page_index,
            button: MouseButton::Left,
        }
    }

    pub fn down(position: Point, page_index: usize) -> Self {
        Self::new(PointerKind::Down, position, page_index)
    }

    pub fn moved(position: Point, page_index: usize) -> Self {
        Self::new(PointerKind::Move, position, page_index)
    }

    pub fn up(position: Point, page_index: usize) -> Self {
        Self::new(PointerKind::Up, position, page_index)
    }

    pub fn double_click(position: Point, page_index: usize) -> Self {
        Self::new(PointerKind::DoubleClick, position, page_index)
    }
}

/// Keys the engine reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Enter,
    Backspace,
    Delete,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Home,
    End,
    /// A printable character.
    Char(char),
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Option<Self> {
        let key = match key {
            "Escape" | "Esc" => Key::Escape,
            "Enter" => Key::Enter,
            "Backspace" => Key::Backspace,
            "Delete" => Key::Delete,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "PageUp" => Key::PageUp,
            "PageDown" => Key::PageDown,
            "Home" => Key::Home,
            "End" => Key::End,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

/// A key press with modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    pub fn ctrl(key: Key) -> Self {
        Self::new(key, Modifiers::CTRL)
    }
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: u128 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Turns a second nearby press into a double click, for hosts without a native dblclick event.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last_click: Option<(Instant, Point, usize)>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a pointer-down. Returns the event to deliver.
    pub fn press(&mut self, input: PointerInput) -> PointerInput {
        self.press_at(input, Instant::now())
    }

    fn press_at(&mut self, input: PointerInput, now: Instant) -> PointerInput {
        if input.kind != PointerKind::Down {
            return input;
        }
        if let Some((time, position, page)) = self.last_click.take() {
            let elapsed = now.duration_since(time).as_millis();
            let distance = (input.position - position).hypot();
            if elapsed < DOUBLE_CLICK_TIME_MS && distance < DOUBLE_CLICK_DISTANCE && page == input.page_index {
                return PointerInput {
                    kind: PointerKind::DoubleClick,
                    ..input
                };
            }
        }
        self.last_click = Some((now, input.position, input.page_index));
        input
    }
}
