//! Cancellable, document-scoped background work.
//!
//! Async work (thumbnails, text layers, OCR, page renders) runs against a
//! [`TaskTicket`] rather than a borrow of the session. Closing or leaving a
//! document cancels its tickets, and completing a cancelled ticket is a no-op.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::document::DocumentId;

/// Cooperative cancellation flag shared by all clones.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Kind of background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Thumbnail,
    TextLayer,
    Ocr,
    Render,
    PageEdit,
}

/// Snapshot handed to a running task.
#[derive(Debug, Clone)]
pub struct TaskTicket {
    pub id: u64,
    pub kind: TaskKind,
    pub document_id: DocumentId,
    pub page_index: Option<usize>,
    /// Content revision of the document when the task started.
    pub revision: u64,
    token: CancellationToken,
}

impl TaskTicket {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[derive(Debug)]
struct PendingTask {
    document_id: DocumentId,
    kind: TaskKind,
    token: CancellationToken,
}

/// In-flight tasks by id.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    next_id: u64,
    pending: HashMap<u64, PendingTask>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task and return its ticket.
    pub fn begin(
        &mut self,
        document_id: DocumentId,
        kind: TaskKind,
        page_index: Option<usize>,
        revision: u64,
    ) -> TaskTicket {
        self.next_id += 1;
        let token = CancellationToken::new();
        self.pending.insert(
            self.next_id,
            PendingTask {
                document_id: document_id.clone(),
                kind,
                token: token.clone(),
            },
        );
        TaskTicket {
            id: self.next_id,
            kind,
            document_id,
            page_index,
            revision,
            token,
        }
    }

    /// Finish a task. Returns false if it was cancelled or is unknown,
    /// in which case its result must be dropped.
    pub fn complete(&mut self, ticket: &TaskTicket) -> bool {
        let Some(task) = self.pending.remove(&ticket.id) else {
            log::debug!("Dropping result of unknown task {}", ticket.id);
            return false;
        };
        !task.token.is_cancelled()
    }

    pub fn cancel(&mut self, id: u64) -> bool {
        match self.pending.remove(&id) {
            Some(task) => {
                task.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every task of a document. Returns the number cancelled.
    pub fn cancel_document(&mut self, document_id: &DocumentId) -> usize {
        let ids: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, task)| task.document_id == *document_id)
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            if let Some(task) = self.pending.remove(id) {
                log::debug!("Cancelling {:?} task {id} of {document_id}", task.kind);
                task.token.cancel();
            }
        }
        ids.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        for (_, task) in self.pending.drain() {
            task.token.cancel();
        }
        count
    }

    pub fn pending_for(&self, document_id: &DocumentId) -> usize {
        self.pending
            .values()
            .filter(|task| task.document_id == *document_id)
            .count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shared_between_clones() {
        let token = CancellationToken::new();
        let worker = token.clone();
        assert!(!worker.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(worker.is_cancelled());
    }

    #[test]
    fn test_complete_live_task() {
        let mut tasks = TaskRegistry::new();
        let ticket = tasks.begin(DocumentId::from("a"), TaskKind::TextLayer, Some(0), 0);
        assert_eq!(tasks.len(), 1);
        assert!(tasks.complete(&ticket));
        assert!(tasks.is_empty());
        // A second completion is stale.
        assert!(!tasks.complete(&ticket));
    }

    #[test]
    fn test_cancel_document_only_affects_that_document() {
        let mut tasks = TaskRegistry::new();
        let a = DocumentId::from("a");
        let b = DocumentId::from("b");
        let ta = tasks.begin(a.clone(), TaskKind::Thumbnail, Some(0), 0);
        let tb = tasks.begin(b.clone(), TaskKind::Thumbnail, Some(0), 0);

        assert_eq!(tasks.cancel_document(&a), 1);
        assert!(ta.is_cancelled());
        assert!(!tb.is_cancelled());
        assert!(!tasks.complete(&ta));
        assert_eq!(tasks.pending_for(&b), 1);
        assert!(tasks.complete(&tb));
    }

    #[test]
    fn test_cancel_all() {
        let mut tasks = TaskRegistry::new();
        let t1 = tasks.begin(DocumentId::from("a"), TaskKind::Ocr, None, 0);
        let t2 = tasks.begin(DocumentId::from("b"), TaskKind::Render, Some(1), 0);
        assert_eq!(tasks.cancel_all(), 2);
        assert!(t1.is_cancelled() && t2.token().is_cancelled());
        assert!(!tasks.cancel(t1.id));
    }
}
