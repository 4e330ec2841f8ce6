//! Annotation storage keyed by document and page.

use std::collections::HashMap;

use kurbo::Point;
use uuid::Uuid;

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, AnnotationUpdate};
use crate::document::DocumentId;
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventBus};
use crate::pages::PageChange;

/// All committed annotations of all open documents.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    annotations: HashMap<AnnotationId, Annotation>,
    next_created_at: u64,
    events: EventBus,
}

impl AnnotationStore {
    pub fn new(events: EventBus) -> Self {
        Self {
            annotations: HashMap::new(),
            next_created_at: 0,
            events,
        }
    }

    /// Build a new annotation with a fresh id and creation stamp. It is not added.
    pub fn create(&mut self, document_id: DocumentId, page_index: usize, kind: AnnotationKind) -> Annotation {
        self.next_created_at += 1;
        Annotation {
            id: Uuid::new_v4(),
            document_id,
            page_index,
            created_at: self.next_created_at,
            kind,
        }
    }

    /// Insert an annotation on a document with `page_count` pages.
    ///
    /// An annotation with the same id is replaced.
    pub fn add(&mut self, annotation: Annotation, page_count: usize) -> EngineResult<()> {
        if annotation.page_index >= page_count {
            return Err(EngineError::InvalidPageIndex {
                page_index: annotation.page_index,
                page_count,
            });
        }
        self.next_created_at = self.next_created_at.max(annotation.created_at);
        let document_id = annotation.document_id.clone();
        let page_index = annotation.page_index;
        log::debug!(
            "Adding {} annotation {} to {}#{}",
            annotation.kind.name(),
            annotation.id,
            document_id,
            page_index
        );
        if let Some(previous) = self.annotations.insert(annotation.id, annotation) {
            if previous.page_index != page_index || previous.document_id != document_id {
                self.notify(previous.document_id, previous.page_index);
            }
        }
        self.notify(document_id, page_index);
        Ok(())
    }

    /// Merge a partial update. Returns the captured inverse, or `None` if the id is unknown.
    pub fn update(&mut self, id: AnnotationId, update: &AnnotationUpdate) -> Option<AnnotationUpdate> {
        let annotation = self.annotations.get_mut(&id)?;
        let inverse = annotation.capture(update);
        annotation.apply_update(update);
        let (document_id, page_index) = (annotation.document_id.clone(), annotation.page_index);
        self.notify(document_id, page_index);
        Some(inverse)
    }

    /// Remove an annotation, returning it. No-op if absent.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let removed = self.annotations.remove(&id)?;
        self.notify(removed.document_id.clone(), removed.page_index);
        Some(removed)
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Annotations on a page, bottom to top (`created_at` ascending, ties by id).
    pub fn query_by_page(&self, document_id: &DocumentId, page_index: usize) -> Vec<&Annotation> {
        let mut page: Vec<&Annotation> = self
            .annotations
            .values()
            .filter(|a| a.document_id == *document_id && a.page_index == page_index)
            .collect();
        sort_z_order(&mut page);
        page
    }

    /// All annotations of a document, ordered by page then z-order.
    pub fn for_document(&self, document_id: &DocumentId) -> Vec<&Annotation> {
        let mut all: Vec<&Annotation> = self
            .annotations
            .values()
            .filter(|a| a.document_id == *document_id)
            .collect();
        all.sort_by(|a, b| {
            a.page_index
                .cmp(&b.page_index)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        all
    }

    /// Topmost annotation on a page under a PDF-space point.
    pub fn hit_test(
        &self,
        document_id: &DocumentId,
        page_index: usize,
        point: Point,
        tolerance: f64,
    ) -> Option<&Annotation> {
        self.query_by_page(document_id, page_index)
            .into_iter()
            .rev()
            .find(|a| a.hit_test(point, tolerance))
    }

    /// Drop every annotation of a closed document.
    pub(crate) fn purge_document(&mut self, document_id: &DocumentId) -> usize {
        let mut pages: Vec<usize> = Vec::new();
        self.annotations.retain(|_, a| {
            if a.document_id == *document_id {
                pages.push(a.page_index);
                false
            } else {
                true
            }
        });
        let purged = pages.len();
        pages.sort_unstable();
        pages.dedup();
        for page_index in pages {
            self.notify(document_id.clone(), page_index);
        }
        if purged > 0 {
            log::debug!("Purged {purged} annotations of {document_id}");
        }
        purged
    }

    /// Follow a page operation: annotations move to their page's new index,
    /// and those on pages that no longer exist are dropped and returned.
    pub(crate) fn remap_pages(&mut self, document_id: &DocumentId, change: &PageChange) -> Vec<Annotation> {
        let ids: Vec<AnnotationId> = self
            .annotations
            .values()
            .filter(|a| a.document_id == *document_id)
            .map(|a| a.id)
            .collect();
        let mut dropped = Vec::new();
        let mut touched: Vec<usize> = Vec::new();
        for id in ids {
            let Some(annotation) = self.annotations.get_mut(&id) else {
                continue;
            };
            let old_index = annotation.page_index;
            match change.new_index(old_index) {
                Some(new_index) if new_index == old_index => {}
                Some(new_index) => {
                    annotation.page_index = new_index;
                    touched.push(old_index);
                    touched.push(new_index);
                }
                None => {
                    if let Some(a) = self.annotations.remove(&id) {
                        touched.push(old_index);
                        dropped.push(a);
                    }
                }
            }
        }
        touched.sort_unstable();
        touched.dedup();
        for page_index in touched {
            self.notify(document_id.clone(), page_index);
        }
        dropped
    }

    fn notify(&self, document_id: DocumentId, page_index: usize) {
        self.events.emit(EngineEvent::AnnotationsChanged {
            document_id,
            page_index,
        });
    }
}

/// Sort annotations bottom to top.
pub(crate) fn sort_z_order(annotations: &mut [&Annotation]) {
    annotations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}
