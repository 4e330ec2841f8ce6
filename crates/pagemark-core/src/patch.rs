//! Reversible changes to annotations and document metadata.

use crate::annotation::{Annotation, AnnotationId, AnnotationUpdate};
use crate::document::{DocumentId, DocumentUpdate};
use crate::history::ApplyPatch;
use crate::registry::DocumentRegistry;
use crate::store::AnnotationStore;

/// A single reversible change.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    AddAnnotation(Annotation),
    RemoveAnnotation {
        document_id: DocumentId,
        id: AnnotationId,
    },
    UpdateAnnotation {
        document_id: DocumentId,
        id: AnnotationId,
        update: AnnotationUpdate,
    },
    UpdateDocument {
        id: DocumentId,
        update: DocumentUpdate,
    },
}

impl Patch {
    /// Document the patch belongs to.
    pub fn document_id(&self) -> &DocumentId {
        match self {
            Patch::AddAnnotation(annotation) => &annotation.document_id,
            Patch::RemoveAnnotation { document_id, .. } | Patch::UpdateAnnotation { document_id, .. } => document_id,
            Patch::UpdateDocument { id, .. } => id,
        }
    }

    /// Forward and inverse patches for adding an annotation.
    pub fn add(annotation: Annotation) -> (Patch, Patch) {
        let inverse = Patch::RemoveAnnotation {
            document_id: annotation.document_id.clone(),
            id: annotation.id,
        };
        (Patch::AddAnnotation(annotation), inverse)
    }

    /// Forward and inverse patches for removing an annotation.
    pub fn remove(annotation: Annotation) -> (Patch, Patch) {
        let (add, remove) = Self::add(annotation);
        (remove, add)
    }
}

/// The state patches apply to.
pub struct Workspace<'a> {
    pub annotations: &'a mut AnnotationStore,
    pub documents: &'a mut DocumentRegistry,
}

impl ApplyPatch<Patch> for Workspace<'_> {
    fn apply_patch(&mut self, patch: &Patch) {
        match patch {
            Patch::AddAnnotation(annotation) => {
                let Some(document) = self.documents.get(&annotation.document_id) else {
                    log::error!("History references closed document {}", annotation.document_id);
                    return;
                };
                if let Err(e) = self.annotations.add(annotation.clone(), document.page_count()) {
                    log::error!("Failed to restore annotation {}: {e}", annotation.id);
                }
            }
            Patch::RemoveAnnotation { id, .. } => {
                if self.annotations.remove(*id).is_none() {
                    log::error!("History references missing annotation {id}");
                }
            }
            Patch::UpdateAnnotation { id, update, .. } => {
                if self.annotations.update(*id, update).is_none() {
                    log::error!("History references missing annotation {id}");
                }
            }
            Patch::UpdateDocument { id, update } => {
                if let Err(e) = self.documents.apply_update(id, update) {
                    log::error!("Failed to apply document patch: {e}");
                }
            }
        }
    }
}
