//! Engine error types.

use thiserror::Error;

use crate::backend::BackendError;
use crate::document::DocumentId;

/// Errors surfaced by engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Failed to load document {name}: {reason}")]
    DocumentLoad { name: String, reason: String },
    #[error("Document {name} is encrypted and was opened view-only")]
    EncryptedDocument { name: String },
    #[error("Document {0} does not support editing")]
    EditNotSupported(DocumentId),
    #[error("Page index {page_index} out of range (page count {page_count})")]
    InvalidPageIndex { page_index: usize, page_count: usize },
    #[error("Unknown document: {0}")]
    UnknownDocument(DocumentId),
    #[error("Document {0} changed while the operation was running")]
    StaleSnapshot(DocumentId),
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
