//! Undo/redo stacks of reversible patches.

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use crate::events::{EngineEvent, EventBus};

/// Default maximum number of undo entries.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Something a patch can be applied to.
pub trait ApplyPatch<P> {
    fn apply_patch(&mut self, patch: &P);
}

/// A committed change and the patch that reverts it.
#[derive(Debug, Clone)]
pub struct HistoryEntry<P> {
    pub forward: P,
    pub inverse: P,
    pub timestamp: Instant,
}

impl<P> HistoryEntry<P> {
    pub fn new(forward: P, inverse: P) -> Self {
        Self {
            forward,
            inverse,
            timestamp: Instant::now(),
        }
    }
}

/// Past and future stacks over an opaque patch type.
///
/// `push` records an entry whose forward patch has already been applied.
/// Undoing an empty stack is a no-op.
#[derive(Debug)]
pub struct HistoryEngine<P> {
    past: Vec<HistoryEntry<P>>,
    future: Vec<HistoryEntry<P>>,
    limit: usize,
    events: Option<EventBus>,
    published: (bool, bool),
}

impl<P> Default for HistoryEngine<P> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl<P> HistoryEngine<P> {
    pub fn new(limit: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            limit: limit.max(1),
            events: None,
            published: (false, false),
        }
    }

    /// Publish availability changes on `events`.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Append an entry and clear the redo stack. The oldest entry is dropped past the limit.
    pub fn push(&mut self, entry: HistoryEntry<P>) {
        self.past.push(entry);
        if self.past.len() > self.limit {
            let excess = self.past.len() - self.limit;
            self.past.drain(..excess);
        }
        self.future.clear();
        self.publish();
    }

    /// Shorthand for pushing a new entry.
    pub fn record(&mut self, forward: P, inverse: P) {
        self.push(HistoryEntry::new(forward, inverse));
    }

    /// Apply the inverse of the latest entry. Returns false if there is nothing to undo.
    pub fn undo<T: ApplyPatch<P> + ?Sized>(&mut self, target: &mut T) -> bool {
        let Some(entry) = self.past.pop() else {
            return false;
        };
        target.apply_patch(&entry.inverse);
        self.future.push(entry);
        self.publish();
        true
    }

    /// Re-apply the latest undone entry. Returns false if there is nothing to redo.
    pub fn redo<T: ApplyPatch<P> + ?Sized>(&mut self, target: &mut T) -> bool {
        let Some(entry) = self.future.pop() else {
            return false;
        };
        target.apply_patch(&entry.forward);
        self.past.push(entry);
        self.publish();
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.publish();
    }

    /// Keep only the entries for which `keep` returns true, in both stacks.
    pub fn retain(&mut self, mut keep: impl FnMut(&HistoryEntry<P>) -> bool) {
        self.past.retain(&mut keep);
        self.future.retain(&mut keep);
        self.publish();
    }

    fn publish(&mut self) {
        let state = (self.can_undo(), self.can_redo());
        if state == self.published {
            return;
        }
        self.published = state;
        if let Some(events) = &self.events {
            events.emit(EngineEvent::HistoryChanged {
                can_undo: state.0,
                can_redo: state.1,
            });
        }
    }
}
