//! Asynchronous document decoding.
//!
//! Loading never touches the registry: it produces a [`LoadedDocument`]
//! that is registered synchronously afterwards, so no engine state is
//! borrowed across an await point.

use bytes::Bytes;
use kurbo::Size;

use crate::backend::{BackendError, PdfEditor, PdfRenderer};
use crate::document::{DocumentAccess, DocumentId};
use crate::error::{EngineError, EngineResult};

/// A decoded document, ready to be registered.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub id: DocumentId,
    pub name: String,
    pub bytes: Bytes,
    pub page_sizes: Vec<Size>,
    pub access: DocumentAccess,
}

impl LoadedDocument {
    /// The warning to report when the document could only be opened view-only.
    pub fn restriction(&self) -> Option<EngineError> {
        match self.access {
            DocumentAccess::Editable => None,
            DocumentAccess::ViewOnly { .. } => Some(EngineError::EncryptedDocument {
                name: self.name.clone(),
            }),
        }
    }
}

/// Decode `bytes` through the rendering library and check it opens in the mutation library.
///
/// Waits for the renderer to become ready first. Each collaborator receives its
/// own copy of the buffer. A document the editor rejects as encrypted opens
/// view-only; any other failure fails the load.
pub async fn load_document(
    renderer: &dyn PdfRenderer,
    editor: &dyn PdfEditor,
    bytes: Vec<u8>,
    name: impl Into<String>,
) -> EngineResult<LoadedDocument> {
    let name = name.into();
    let load_error = |reason: String| EngineError::DocumentLoad {
        name: name.clone(),
        reason,
    };

    renderer
        .ready()
        .await
        .map_err(|e| load_error(format!("renderer not ready: {e}")))?;

    let id = DocumentId::generate();
    let bytes = Bytes::from(bytes);
    let info = renderer
        .load(&id, bytes.to_vec())
        .await
        .map_err(|e| load_error(e.to_string()))?;
    if info.page_sizes.is_empty() {
        renderer.unload(&id);
        return Err(load_error("document has no pages".to_string()));
    }

    let access = match editor.load(bytes.to_vec()).await {
        Ok(_) => DocumentAccess::Editable,
        Err(BackendError::Encrypted) => {
            log::warn!("{name} is encrypted, opening view-only");
            DocumentAccess::ViewOnly {
                reason: "encrypted".to_string(),
            }
        }
        Err(e) => {
            renderer.unload(&id);
            return Err(load_error(e.to_string()));
        }
    };

    log::debug!("Loaded {name}: {} pages", info.page_sizes.len());
    Ok(LoadedDocument {
        id,
        name,
        bytes,
        page_sizes: info.page_sizes,
        access,
    })
}
