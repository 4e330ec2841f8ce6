//! Keyboard shortcut registry and documentation.

use crate::input::{Key, KeyEvent};
use crate::tools::ToolKind;

/// Engine action bound to a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Undo,
    Redo,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    RotateClockwise,
    RotateCounterClockwise,
    DeleteSelection,
    /// Clear the selection and return to the select tool.
    Cancel,
    SetTool(ToolKind),
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub action: Action,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: Key, ctrl: bool, shift: bool, action: Action, description: &'static str) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        parts.push(match &self.key {
            Key::Char(c) => c.to_ascii_uppercase().to_string(),
            other => format!("{other:?}"),
        });
        parts.join("+")
    }

    fn matches(&self, event: &KeyEvent) -> bool {
        if self.ctrl != event.modifiers.command() || event.modifiers.alt {
            return false;
        }
        match (&self.key, &event.key) {
            (Key::Char(expected), Key::Char(pressed)) => {
                // Symbols such as '+' need Shift on most layouts, so it only counts for letters.
                let shift_ok = !expected.is_ascii_alphabetic() || self.shift == event.modifiers.shift;
                shift_ok && expected.eq_ignore_ascii_case(pressed)
            }
            (expected, pressed) => expected == pressed && self.shift == event.modifiers.shift,
        }
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new(Key::Char('z'), true, false, Action::Undo, "Undo"),
            Shortcut::new(Key::Char('z'), true, true, Action::Redo, "Redo"),
            Shortcut::new(Key::Char('y'), true, false, Action::Redo, "Redo"),
            Shortcut::new(Key::ArrowRight, false, false, Action::NextPage, "Next page"),
            Shortcut::new(Key::ArrowDown, false, false, Action::NextPage, "Next page"),
            Shortcut::new(Key::PageDown, false, false, Action::NextPage, "Next page"),
            Shortcut::new(Key::ArrowLeft, false, false, Action::PreviousPage, "Previous page"),
            Shortcut::new(Key::ArrowUp, false, false, Action::PreviousPage, "Previous page"),
            Shortcut::new(Key::PageUp, false, false, Action::PreviousPage, "Previous page"),
            Shortcut::new(Key::Home, false, false, Action::FirstPage, "First page"),
            Shortcut::new(Key::End, false, false, Action::LastPage, "Last page"),
            Shortcut::new(Key::Char('+'), true, false, Action::ZoomIn, "Zoom in"),
            Shortcut::new(Key::Char('='), true, false, Action::ZoomIn, "Zoom in"),
            Shortcut::new(Key::Char('-'), true, false, Action::ZoomOut, "Zoom out"),
            Shortcut::new(Key::Char('0'), true, false, Action::ZoomReset, "Reset zoom"),
            Shortcut::new(Key::Char('r'), true, false, Action::RotateClockwise, "Rotate clockwise"),
            Shortcut::new(
                Key::Char('r'),
                true,
                true,
                Action::RotateCounterClockwise,
                "Rotate counter-clockwise",
            ),
            Shortcut::new(Key::Delete, false, false, Action::DeleteSelection, "Delete selected annotation"),
            Shortcut::new(Key::Backspace, false, false, Action::DeleteSelection, "Delete selected annotation"),
            Shortcut::new(Key::Escape, false, false, Action::Cancel, "Cancel current action"),
            Shortcut::new(Key::Char('v'), false, false, Action::SetTool(ToolKind::Select), "Select tool"),
            Shortcut::new(Key::Char('h'), true, false, Action::SetTool(ToolKind::Highlight), "Highlight tool"),
            Shortcut::new(Key::Char('p'), false, false, Action::SetTool(ToolKind::Pen), "Pen tool"),
            Shortcut::new(Key::Char('n'), false, false, Action::SetTool(ToolKind::StickyNote), "Sticky note tool"),
            Shortcut::new(Key::Char('t'), false, false, Action::SetTool(ToolKind::TextEdit), "Text edit tool"),
        ]
    }

    /// The action bound to a key press, if any.
    pub fn resolve(event: &KeyEvent) -> Option<Action> {
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.matches(event))
            .map(|shortcut| shortcut.action)
    }

    /// Log all shortcuts.
    pub fn log_all() {
        for shortcut in Self::all() {
            log::info!("  {:20} {}", shortcut.format(), shortcut.description);
        }
    }
}
