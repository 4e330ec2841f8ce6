//! The set of open documents and the active selection.

use bytes::Bytes;
use kurbo::Size;

use crate::config::EngineConfig;
use crate::coords::Rotation;
use crate::document::{Document, DocumentId, DocumentUpdate};
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventBus};
use crate::loader::LoadedDocument;
use crate::store::AnnotationStore;

/// Open documents in opening order.
#[derive(Debug)]
pub struct DocumentRegistry {
    documents: Vec<Document>,
    active: Option<DocumentId>,
    min_zoom: f64,
    max_zoom: f64,
    default_zoom: f64,
    events: EventBus,
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::new(&EngineConfig::default(), EventBus::new())
    }
}

impl DocumentRegistry {
    pub fn new(config: &EngineConfig, events: EventBus) -> Self {
        Self {
            documents: Vec::new(),
            active: None,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            default_zoom: config.default_zoom,
            events,
        }
    }

    /// Register a loaded document and make it active.
    pub fn open(&mut self, loaded: LoadedDocument) -> DocumentId {
        let LoadedDocument {
            id,
            name,
            bytes,
            page_sizes,
            access,
        } = loaded;
        log::debug!("Opening {name} as {id} ({} pages, {access:?})", page_sizes.len());
        self.documents.push(Document {
            id: id.clone(),
            name,
            bytes,
            page_sizes,
            current_page: 0,
            zoom: self.default_zoom,
            rotation: Rotation::Deg0,
            access,
            revision: 0,
        });
        self.events.emit(EngineEvent::DocumentsChanged);
        self.set_active_unchecked(Some(id.clone()));
        id
    }

    /// Close a document and purge its annotations.
    ///
    /// If it was active, the first remaining document becomes active.
    pub fn close(&mut self, id: &DocumentId, store: &mut AnnotationStore) -> Option<Document> {
        let position = self.documents.iter().position(|d| d.id == *id)?;
        let document = self.documents.remove(position);
        store.purge_document(id);
        log::debug!("Closed {} ({})", document.name, document.id);
        self.events.emit(EngineEvent::DocumentsChanged);
        if self.active.as_ref() == Some(id) {
            let next = self.documents.first().map(|d| d.id.clone());
            self.set_active_unchecked(next);
        }
        Some(document)
    }

    /// Make a document active. Returns false (and changes nothing) if the id is unknown.
    pub fn set_active(&mut self, id: &DocumentId) -> bool {
        if !self.contains(id) {
            log::debug!("Ignoring activation of unknown document {id}");
            return false;
        }
        if self.active.as_ref() != Some(id) {
            self.set_active_unchecked(Some(id.clone()));
        }
        true
    }

    fn set_active_unchecked(&mut self, id: Option<DocumentId>) {
        self.active = id.clone();
        self.events.emit(EngineEvent::ActiveDocumentChanged { id });
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.documents.iter().any(|d| d.id == *id)
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == *id)
    }

    fn get_mut(&mut self, id: &DocumentId) -> EngineResult<&mut Document> {
        self.documents
            .iter_mut()
            .find(|d| d.id == *id)
            .ok_or_else(|| EngineError::UnknownDocument(id.clone()))
    }

    /// Look up a document, failing with `UnknownDocument`.
    pub fn require(&self, id: &DocumentId) -> EngineResult<&Document> {
        self.get(id).ok_or_else(|| EngineError::UnknownDocument(id.clone()))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn active_id(&self) -> Option<&DocumentId> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&Document> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    /// Navigate to a page, clamped to the document's pages. Returns the page set.
    pub fn set_page(&mut self, id: &DocumentId, page_index: usize) -> EngineResult<usize> {
        let document = self.get_mut(id)?;
        let clamped = page_index.min(document.page_count().saturating_sub(1));
        if document.current_page != clamped {
            document.current_page = clamped;
            self.notify(id);
        }
        Ok(clamped)
    }

    /// Set the zoom, clamped to the configured range. Non-finite values are ignored.
    pub fn set_zoom(&mut self, id: &DocumentId, zoom: f64) -> EngineResult<f64> {
        let (min_zoom, max_zoom) = (self.min_zoom, self.max_zoom);
        let document = self.get_mut(id)?;
        if !zoom.is_finite() {
            log::warn!("Ignoring non-finite zoom {zoom} for {id}");
            return Ok(document.zoom);
        }
        let clamped = zoom.clamp(min_zoom, max_zoom);
        if document.zoom != clamped {
            document.zoom = clamped;
            self.notify(id);
        }
        Ok(clamped)
    }

    /// Set the rotation. Returns the previous rotation.
    pub fn set_rotation(&mut self, id: &DocumentId, rotation: Rotation) -> EngineResult<Rotation> {
        let document = self.get_mut(id)?;
        let previous = document.rotation;
        if previous != rotation {
            document.rotation = rotation;
            self.notify(id);
        }
        Ok(previous)
    }

    /// Apply a metadata update and return the update that reverts it.
    pub fn apply_update(&mut self, id: &DocumentId, update: &DocumentUpdate) -> EngineResult<DocumentUpdate> {
        let document = self.get(id).ok_or_else(|| EngineError::UnknownDocument(id.clone()))?;
        let inverse = DocumentUpdate {
            name: update.name.as_ref().map(|_| document.name.clone()),
            rotation: update.rotation.map(|_| document.rotation),
            current_page: update.current_page.map(|_| document.current_page),
            zoom: update.zoom.map(|_| document.zoom),
        };
        if let Some(name) = &update.name {
            let document = self.get_mut(id)?;
            if document.name != *name {
                document.name = name.clone();
                self.notify(id);
            }
        }
        if let Some(rotation) = update.rotation {
            self.set_rotation(id, rotation)?;
        }
        if let Some(page) = update.current_page {
            self.set_page(id, page)?;
        }
        if let Some(zoom) = update.zoom {
            self.set_zoom(id, zoom)?;
        }
        Ok(inverse)
    }

    /// Replace a document's content after a page operation.
    pub(crate) fn replace_content(&mut self, id: &DocumentId, bytes: Bytes, page_sizes: Vec<Size>) -> EngineResult<u64> {
        let document = self.get_mut(id)?;
        document.bytes = bytes;
        document.page_sizes = page_sizes;
        document.current_page = document.current_page.min(document.page_count().saturating_sub(1));
        document.revision += 1;
        let revision = document.revision;
        log::debug!("Replaced content of {id}, revision {revision}");
        self.notify(id);
        Ok(revision)
    }

    fn notify(&self, id: &DocumentId) {
        self.events.emit(EngineEvent::DocumentUpdated { id: id.clone() });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::document::DocumentAccess;

    pub(crate) fn loaded(id: &str, pages: usize) -> LoadedDocument {
        LoadedDocument {
            id: DocumentId::from(id),
            name: format!("{id}.pdf"),
            bytes: Bytes::from_static(b"%PDF-1.7"),
            page_sizes: vec![Size::new(612.0, 792.0); pages],
            access: DocumentAccess::Editable,
        }
    }

    #[test]
    fn test_open_makes_active() {
        let mut registry = DocumentRegistry::default();
        let a = registry.open(loaded("a", 1));
        assert_eq!(registry.active_id(), Some(&a));
        let b = registry.open(loaded("b", 1));
        assert_eq!(registry.active_id(), Some(&b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_close_active_selects_first_remaining() {
        let mut registry = DocumentRegistry::default();
        let mut store = AnnotationStore::default();
        let a = registry.open(loaded("a", 1));
        let b = registry.open(loaded("b", 1));
        let c = registry.open(loaded("c", 1));
        registry.set_active(&a);

        registry.close(&a, &mut store);
        assert_eq!(registry.active_id(), Some(&b));

        // Closing a non-active document keeps the selection.
        registry.close(&c, &mut store);
        assert_eq!(registry.active_id(), Some(&b));

        registry.close(&b, &mut store);
        assert_eq!(registry.active_id(), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_set_active_unknown_is_noop() {
        let mut registry = DocumentRegistry::default();
        let a = registry.open(loaded("a", 1));
        assert!(!registry.set_active(&DocumentId::from("missing")));
        assert_eq!(registry.active_id(), Some(&a));
    }

    #[test]
    fn test_set_page_clamps() {
        let mut registry = DocumentRegistry::default();
        let a = registry.open(loaded("a", 3));
        assert_eq!(registry.set_page(&a, 10).unwrap(), 2);
        assert_eq!(registry.set_page(&a, 1).unwrap(), 1);
        assert!(matches!(
            registry.set_page(&DocumentId::from("x"), 0),
            Err(EngineError::UnknownDocument(_))
        ));
    }

    #[test]
    fn test_set_zoom_clamps_and_ignores_nan() {
        let mut registry = DocumentRegistry::default();
        let a = registry.open(loaded("a", 1));
        assert_eq!(registry.set_zoom(&a, 100.0).unwrap(), 4.0);
        assert_eq!(registry.set_zoom(&a, 0.0).unwrap(), 0.1);
        assert_eq!(registry.set_zoom(&a, f64::NAN).unwrap(), 0.1);
        assert_eq!(registry.get(&a).unwrap().zoom(), 0.1);
    }

    #[test]
    fn test_apply_update_inverse() {
        let mut registry = DocumentRegistry::default();
        let a = registry.open(loaded("a", 1));
        let update = DocumentUpdate {
            name: Some("renamed.pdf".to_string()),
            rotation: Some(Rotation::Deg90),
            ..DocumentUpdate::default()
        };
        let inverse = registry.apply_update(&a, &update).unwrap();
        assert_eq!(registry.get(&a).unwrap().name, "renamed.pdf");
        assert_eq!(registry.get(&a).unwrap().rotation(), Rotation::Deg90);
        registry.apply_update(&a, &inverse).unwrap();
        assert_eq!(registry.get(&a).unwrap().name, "a.pdf");
        assert_eq!(registry.get(&a).unwrap().rotation(), Rotation::Deg0);
    }

    #[test]
    fn test_replace_content_clamps_page() {
        let mut registry = DocumentRegistry::default();
        let a = registry.open(loaded("a", 5));
        registry.set_page(&a, 4).unwrap();
        let revision = registry
            .replace_content(&a, Bytes::from_static(b"new"), vec![Size::new(10.0, 10.0); 2])
            .unwrap();
        let doc = registry.get(&a).unwrap();
        assert_eq!(revision, 1);
        assert_eq!(doc.current_page(), 1);
        assert_eq!(doc.page_count(), 2);
    }
}
