//! Pagemark Core Library
//!
//! Platform-agnostic state engine for the Pagemark PDF annotator: open
//! documents, typed annotations stored in PDF-space, gesture handling,
//! and reversible history.

pub mod annotation;
pub mod backend;
pub mod config;
pub mod coords;
pub mod document;
pub mod error;
pub mod events;
pub mod history;
pub mod input;
pub mod loader;
pub mod pages;
pub mod patch;
pub mod registry;
pub mod session;
pub mod shortcuts;
pub mod storage;
pub mod store;
pub mod tasks;
pub mod tools;

#[cfg(test)]
mod testing;

pub use annotation::{Annotation, AnnotationId, AnnotationKind, AnnotationUpdate, SerializableColor};
pub use config::EngineConfig;
pub use coords::{PageView, Rotation, to_pdf, to_screen};
pub use document::{Document, DocumentAccess, DocumentId, DocumentUpdate};
pub use error::{EngineError, EngineResult};
pub use events::{EngineEvent, EventBus, SubscriptionId};
pub use history::{ApplyPatch, HistoryEngine, HistoryEntry};
pub use input::{Key, KeyEvent, Modifiers, PointerInput, PointerKind};
pub use loader::{LoadedDocument, load_document};
pub use patch::{Patch, Workspace};
pub use registry::DocumentRegistry;
pub use session::{Command, CommandQueue, Session};
pub use store::AnnotationStore;
pub use tasks::{CancellationToken, TaskKind, TaskRegistry, TaskTicket};
pub use tools::{Preview, ToolKind, ToolManager, ToolOutcome, ToolState};
