//! Push-model change notifications.
//!
//! Events are queued and dispatched in order. A handler that emits another
//! event never re-enters a running dispatch: the new event is appended to
//! the queue and delivered after the current one.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::annotation::AnnotationId;
use crate::document::DocumentId;

/// A change in engine state.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A document was opened or closed.
    DocumentsChanged,
    /// The active document changed.
    ActiveDocumentChanged { id: Option<DocumentId> },
    /// Page, zoom, rotation, name or content of a document changed.
    DocumentUpdated { id: DocumentId },
    /// Committed annotations on a page changed.
    AnnotationsChanged {
        document_id: DocumentId,
        page_index: usize,
    },
    /// The ephemeral gesture preview on a page changed.
    PreviewChanged {
        document_id: DocumentId,
        page_index: usize,
    },
    /// The selected annotation changed.
    SelectionChanged { id: Option<AnnotationId> },
    /// Undo/redo availability changed.
    HistoryChanged { can_undo: bool, can_redo: bool },
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&EngineEvent)>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Handler)>,
    /// Subscriptions removed while their handler list was taken for dispatch.
    removed: Vec<SubscriptionId>,
    queue: VecDeque<EngineEvent>,
    dispatching: bool,
}

/// Single-threaded event bus. Clones share the same subscribers and queue.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("subscribers", &inner.subscribers.len())
            .field("queued", &inner.queue.len())
            .field("dispatching", &inner.dispatching)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every event.
    pub fn subscribe(&self, handler: impl FnMut(&EngineEvent) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Safe to call from inside a handler.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sub, _)| *sub != id);
        if inner.subscribers.len() == before && inner.dispatching {
            inner.removed.push(id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Queue an event and, unless a dispatch is already running, deliver the queue.
    pub fn emit(&self, event: EngineEvent) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.queue.push_back(event);
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }
        self.drain();
    }

    fn drain(&self) {
        loop {
            let (event, mut handlers) = {
                let mut inner = self.inner.borrow_mut();
                let Some(event) = inner.queue.pop_front() else {
                    inner.dispatching = false;
                    inner.removed.clear();
                    return;
                };
                (event, std::mem::take(&mut inner.subscribers))
            };

            for (id, handler) in handlers.iter_mut() {
                if self.inner.borrow().removed.contains(id) {
                    continue;
                }
                handler(&event);
            }

            let mut inner = self.inner.borrow_mut();
            let removed = std::mem::take(&mut inner.removed);
            handlers.retain(|(id, _)| !removed.contains(id));
            // Handlers subscribed during dispatch were pushed onto the empty list.
            let added = std::mem::take(&mut inner.subscribers);
            handlers.extend(added);
            inner.subscribers = handlers;
        }
    }
}
