//! Open document state.

use std::fmt;

use bytes::Bytes;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coords::{PageView, Rotation};

/// Opaque document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the document may be edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentAccess {
    Editable,
    /// Opened for viewing only, e.g. because the editor could not decrypt it.
    ViewOnly { reason: String },
}

impl DocumentAccess {
    pub fn is_editable(&self) -> bool {
        matches!(self, DocumentAccess::Editable)
    }
}

/// An open PDF document.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    /// Original file content. Never mutated after load.
    pub(crate) bytes: Bytes,
    /// Intrinsic size of each page in PDF units.
    pub(crate) page_sizes: Vec<Size>,
    pub(crate) current_page: usize,
    pub(crate) zoom: f64,
    pub(crate) rotation: Rotation,
    pub access: DocumentAccess,
    /// Bumped whenever the content is replaced.
    pub(crate) revision: u64,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    pub fn page_sizes(&self) -> &[Size] {
        &self.page_sizes
    }

    pub fn page_size(&self, page_index: usize) -> Option<Size> {
        self.page_sizes.get(page_index).copied()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_editable(&self) -> bool {
        self.access.is_editable()
    }

    /// Length of the original content in bytes.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Independent copy of the content for consumers that need their own buffer.
    pub fn duplicate_bytes(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// View of a page at the document's zoom and rotation.
    pub fn page_view(&self, page_index: usize) -> Option<PageView> {
        self.page_size(page_index)
            .map(|size| PageView::new(self.zoom, self.rotation, size))
    }
}

/// Partial update of document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
}

impl DocumentUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
