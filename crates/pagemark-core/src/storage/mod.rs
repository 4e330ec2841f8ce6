//! Annotation persistence.
//!
//! Annotations are saved per document as an [`AnnotationSet`] keyed by the
//! document name, since document ids only live for one session.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod indexeddb;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use indexeddb::IndexedDbStorage;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotation::Annotation;
pub use crate::backend::BoxFuture;

/// Current [`AnnotationSet`] format version.
pub const FORMAT_VERSION: u32 = 1;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Annotations not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// The saved annotations of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    #[serde(default = "format_version")]
    pub version: u32,
    pub document_name: String,
    pub annotations: Vec<Annotation>,
}

fn format_version() -> u32 {
    FORMAT_VERSION
}

impl AnnotationSet {
    pub fn new(document_name: impl Into<String>, annotations: Vec<Annotation>) -> Self {
        Self {
            version: FORMAT_VERSION,
            document_name: document_name.into(),
            annotations,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Trait for annotation storage backends.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait Storage: Send + Sync {
    /// Save a document's annotations under `key`.
    fn save(&self, key: &str, set: &AnnotationSet) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the annotations saved under `key`.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<AnnotationSet>>;

    /// Delete saved annotations. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all keys.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Trait for annotation storage backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait Storage {
    /// Save a document's annotations under `key`.
    fn save(&self, key: &str, set: &AnnotationSet) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the annotations saved under `key`.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<AnnotationSet>>;

    /// Delete saved annotations. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all keys.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// The platform's default storage backend.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_storage() -> StorageResult<FileStorage> {
    FileStorage::default_location()
}

/// The platform's default storage backend.
#[cfg(target_arch = "wasm32")]
pub fn create_default_storage() -> StorageResult<IndexedDbStorage> {
    Ok(IndexedDbStorage::new())
}
