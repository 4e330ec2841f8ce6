//! Contracts for the external collaborators.
//!
//! Rasterization, page mutation, OCR and format conversion are provided by
//! the host (usually JavaScript libraries or a server). The engine only
//! talks to them through these traits.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;

use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coords::Rotation;
use crate::document::DocumentId;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Errors reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Corrupt document: {0}")]
    Corrupt(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("Backend failed: {0}")]
    Failed(String),
}

/// Result type for collaborator calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// What the rendering library reports about a loaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Page sizes from the scale-1 viewport of each page.
    pub page_sizes: Vec<Size>,
}

/// A run of page text with its PDF-space bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub rect: Rect,
}

/// A rasterized page in RGBA8, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PageImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { width, height, pixels }
    }
}

/// Rendering library: decoding, page geometry, rasterization and text extraction.
pub trait PdfRenderer {
    /// Resolves once the library (and its worker) is initialised.
    fn ready(&self) -> BoxFuture<'_, BackendResult<()>>;

    /// Decode a document and report its pages. The library keeps it under `id`.
    fn load(&self, id: &DocumentId, bytes: Vec<u8>) -> BoxFuture<'_, BackendResult<DocumentInfo>>;

    /// Rasterize one page at `zoom` with the page turned by `rotation`.
    fn render(
        &self,
        id: &DocumentId,
        page_index: usize,
        zoom: f64,
        rotation: Rotation,
    ) -> BoxFuture<'_, BackendResult<PageImage>>;

    /// Text runs of one page.
    fn text_content(&self, id: &DocumentId, page_index: usize) -> BoxFuture<'_, BackendResult<Vec<TextRun>>>;

    /// Release a document previously loaded under `id`.
    fn unload(&self, id: &DocumentId);
}

/// A document opened by the mutation library.
pub trait EditableDocument {
    fn page_count(&self) -> usize;

    /// Append copies of `pages` from `source`.
    fn copy_pages_from<'a>(
        &'a mut self,
        source: &'a dyn EditableDocument,
        pages: &'a [usize],
    ) -> BoxFuture<'a, BackendResult<()>>;

    fn remove_page(&mut self, page_index: usize) -> BackendResult<()>;

    /// Insert an empty page before `page_index`; `page_count()` appends.
    fn insert_blank_page(&mut self, page_index: usize, size: Size) -> BackendResult<()>;

    /// Serialize to PDF bytes.
    fn save(&self) -> BoxFuture<'_, BackendResult<Vec<u8>>>;

    /// Concrete type access for `copy_pages_from` implementations.
    fn as_any(&self) -> &dyn Any;
}

/// Mutation library.
pub trait PdfEditor {
    /// Open a document for editing. Encrypted input fails with [`BackendError::Encrypted`].
    fn load(&self, bytes: Vec<u8>) -> BoxFuture<'_, BackendResult<Box<dyn EditableDocument>>>;

    /// Create an empty document.
    fn create(&self) -> BoxFuture<'_, BackendResult<Box<dyn EditableDocument>>>;
}

/// Text recognition over a rendered page image.
pub trait OcrEngine {
    /// Recognize text, reporting progress in `[0, 1]`.
    fn recognize<'a>(
        &'a self,
        image: Vec<u8>,
        language: &'a str,
        progress: &'a mut dyn FnMut(f32),
    ) -> BoxFuture<'a, BackendResult<String>>;
}

/// Compression strength for [`ConversionJob::Compress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Office formats a document can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficeFormat {
    Docx,
    Xlsx,
    Pptx,
}

impl OfficeFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OfficeFormat::Docx => "docx",
            OfficeFormat::Xlsx => "xlsx",
            OfficeFormat::Pptx => "pptx",
        }
    }
}

/// A file-in, file-out job run by an external process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum ConversionJob {
    Compress { level: CompressionLevel },
    Encrypt { password: String },
    Convert { format: OfficeFormat },
    /// Lock the document behind an owner password with the given rights.
    SetPermissions {
        owner_password: String,
        permissions: Permissions,
    },
}

/// Rights granted by [`ConversionJob::SetPermissions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permissions {
    pub print: bool,
    pub copy: bool,
    pub modify: bool,
}

impl Permissions {
    pub fn all() -> Self {
        Self {
            print: true,
            copy: true,
            modify: true,
        }
    }
}

impl ConversionJob {
    /// Reject jobs the service cannot run as given.
    pub fn validate(&self) -> BackendResult<()> {
        match self {
            ConversionJob::Encrypt { password } if password.is_empty() => {
                Err(BackendError::Unsupported("encryption needs a password".to_string()))
            }
            ConversionJob::SetPermissions { owner_password, .. } if owner_password.is_empty() => {
                Err(BackendError::Unsupported("permissions need an owner password".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// External conversion service.
pub trait ConversionService {
    fn run<'a>(&'a self, input: Vec<u8>, job: &'a ConversionJob) -> BoxFuture<'a, BackendResult<Vec<u8>>>;
}
