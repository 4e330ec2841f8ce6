//! The engine service object.
//!
//! A [`Session`] owns every component (registry, store, history, tools,
//! tasks) and routes input through them: tool gestures become patches,
//! patches are applied and recorded, and changes are published on the
//! session's [`EventBus`].

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use bytes::Bytes;

use crate::annotation::{AnnotationId, AnnotationKind, AnnotationUpdate};
use crate::backend::{PdfRenderer, TextRun};
use crate::config::EngineConfig;
use crate::coords::{Rotation, fit_width_zoom};
use crate::document::{Document, DocumentId, DocumentUpdate};
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventBus, SubscriptionId};
use crate::history::HistoryEngine;
use crate::input::{KeyEvent, PointerInput};
use crate::loader::LoadedDocument;
use crate::pages::{EditSnapshot, PageEdit};
use crate::patch::{Patch, Workspace};
use crate::registry::DocumentRegistry;
use crate::shortcuts::{Action, ShortcutRegistry};
use crate::storage::AnnotationSet;
use crate::store::AnnotationStore;
use crate::tasks::{TaskKind, TaskRegistry, TaskTicket};
use crate::tools::{Mutation, Preview, ToolContext, ToolKind, ToolManager, ToolOutcome};

/// A deferred engine command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Undo,
    Redo,
    SetActive(DocumentId),
    Close(DocumentId),
    SetPage { document_id: DocumentId, page_index: usize },
    SetZoom { document_id: DocumentId, zoom: f64 },
    SetTool(ToolKind),
    Select(Option<AnnotationId>),
    DeleteSelection,
}

/// Commands raised while the session is borrowed (e.g. from inside a render
/// pass or an event handler). Drained by [`Session::run_deferred`].
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    inner: Rc<RefCell<VecDeque<Command>>>,
}

impl CommandQueue {
    pub fn push(&self, command: Command) {
        self.inner.borrow_mut().push_back(command);
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    fn take(&self) -> VecDeque<Command> {
        std::mem::take(&mut *self.inner.borrow_mut())
    }
}

/// The annotator engine.
#[derive(Debug)]
pub struct Session {
    config: EngineConfig,
    events: EventBus,
    documents: DocumentRegistry,
    annotations: AnnotationStore,
    history: HistoryEngine<Patch>,
    tools: ToolManager,
    tasks: TaskRegistry,
    selection: Option<AnnotationId>,
    text_layers: HashMap<(DocumentId, usize), Vec<TextRun>>,
    commands: CommandQueue,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        let events = EventBus::new();
        log::debug!("Session started: {config:?}");
        Self {
            documents: DocumentRegistry::new(&config, events.clone()),
            annotations: AnnotationStore::new(events.clone()),
            history: HistoryEngine::new(config.history_limit).with_events(events.clone()),
            tools: ToolManager::new(&config),
            tasks: TaskRegistry::new(),
            selection: None,
            text_layers: HashMap::new(),
            commands: CommandQueue::default(),
            events,
            config,
        }
    }

    /// Close every document and cancel all work.
    pub fn dispose(&mut self) {
        let cancelled = self.tasks.cancel_all();
        let ids: Vec<DocumentId> = self.documents.documents().iter().map(|d| d.id.clone()).collect();
        for id in &ids {
            if let Err(e) = self.close(id) {
                log::error!("Failed to close {id} on dispose: {e}");
            }
        }
        self.history.clear();
        self.commands.take();
        log::debug!("Session disposed ({} documents, {cancelled} tasks)", ids.len());
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self, handler: impl FnMut(&EngineEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    pub fn documents(&self) -> &DocumentRegistry {
        &self.documents
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn history(&self) -> &HistoryEngine<Patch> {
        &self.history
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn selection(&self) -> Option<AnnotationId> {
        self.selection
    }

    /// Handle for queueing commands from inside callbacks.
    pub fn commands(&self) -> CommandQueue {
        self.commands.clone()
    }

    pub fn active_id(&self) -> Option<&DocumentId> {
        self.documents.active_id()
    }

    pub fn active(&self) -> Option<&Document> {
        self.documents.active()
    }

    fn require_active(&self) -> Option<DocumentId> {
        self.documents.active_id().cloned()
    }

    // --- documents ---

    /// Register a loaded document. It becomes the active document.
    pub fn open(&mut self, loaded: LoadedDocument) -> DocumentId {
        if let Some(warning) = loaded.restriction() {
            log::warn!("{warning}");
        }
        self.leave_active();
        self.documents.open(loaded)
    }

    /// Close a document: cancel its tasks, purge its annotations and drop its history.
    ///
    /// The renderer's copy stays loaded; use [`Session::close_and_unload`]
    /// to release it too.
    pub fn close(&mut self, id: &DocumentId) -> EngineResult<()> {
        self.documents.require(id)?;
        self.cancel_gesture_on(id);
        self.tasks.cancel_document(id);
        self.documents.close(id, &mut self.annotations);
        self.history.retain(|entry| entry.forward.document_id() != id);
        self.text_layers.retain(|(document_id, _), _| document_id != id);
        self.validate_selection();
        Ok(())
    }

    /// Close a document and release the copy the renderer holds under its id.
    pub fn close_and_unload(&mut self, id: &DocumentId, renderer: &dyn PdfRenderer) -> EngineResult<()> {
        self.close(id)?;
        renderer.unload(id);
        Ok(())
    }

    /// Make a document active. Returns false if it is unknown.
    pub fn set_active(&mut self, id: &DocumentId) -> bool {
        if !self.documents.contains(id) {
            return self.documents.set_active(id);
        }
        if self.documents.active_id() != Some(id) {
            self.leave_active();
        }
        self.documents.set_active(id)
    }

    /// Cancel work tied to the document being switched away from.
    fn leave_active(&mut self) {
        let Some(previous) = self.require_active() else {
            return;
        };
        self.cancel_gesture_on(&previous);
        let cancelled = self.tasks.cancel_document(&previous);
        if cancelled > 0 {
            log::debug!("Cancelled {cancelled} tasks of {previous}");
        }
        self.select(None);
    }

    pub fn set_page(&mut self, id: &DocumentId, page_index: usize) -> EngineResult<usize> {
        self.documents.set_page(id, page_index)
    }

    pub fn set_zoom(&mut self, id: &DocumentId, zoom: f64) -> EngineResult<f64> {
        self.documents.set_zoom(id, zoom)
    }

    pub fn zoom_in(&mut self, id: &DocumentId) -> EngineResult<f64> {
        let zoom = self.documents.require(id)?.zoom() * self.config.zoom_step;
        self.set_zoom(id, zoom)
    }

    pub fn zoom_out(&mut self, id: &DocumentId) -> EngineResult<f64> {
        let zoom = self.documents.require(id)?.zoom() / self.config.zoom_step;
        self.set_zoom(id, zoom)
    }

    pub fn zoom_reset(&mut self, id: &DocumentId) -> EngineResult<f64> {
        self.set_zoom(id, self.config.default_zoom)
    }

    /// Zoom so the current page fills `viewport_width` minus `padding` on each side.
    pub fn fit_width(&mut self, id: &DocumentId, viewport_width: f64, padding: f64) -> EngineResult<f64> {
        let document = self.documents.require(id)?;
        let page_size = document
            .page_size(document.current_page())
            .ok_or(EngineError::InvalidPageIndex {
                page_index: document.current_page(),
                page_count: document.page_count(),
            })?;
        let zoom = fit_width_zoom(page_size, document.rotation(), viewport_width, padding);
        self.set_zoom(id, zoom)
    }

    /// Rotate a quarter turn. Undoable.
    pub fn rotate(&mut self, id: &DocumentId, clockwise: bool) -> EngineResult<Rotation> {
        let current = self.documents.require(id)?.rotation();
        let rotation = if clockwise {
            current.clockwise()
        } else {
            current.counter_clockwise()
        };
        self.update_document(
            id,
            DocumentUpdate {
                rotation: Some(rotation),
                ..DocumentUpdate::default()
            },
        )?;
        Ok(rotation)
    }

    /// Rename a document. Undoable.
    pub fn rename(&mut self, id: &DocumentId, name: impl Into<String>) -> EngineResult<()> {
        self.update_document(
            id,
            DocumentUpdate {
                name: Some(name.into()),
                ..DocumentUpdate::default()
            },
        )
    }

    fn update_document(&mut self, id: &DocumentId, update: DocumentUpdate) -> EngineResult<()> {
        let inverse = self.documents.apply_update(id, &update)?;
        if inverse == update {
            return Ok(());
        }
        self.history.record(
            Patch::UpdateDocument {
                id: id.clone(),
                update,
            },
            Patch::UpdateDocument {
                id: id.clone(),
                update: inverse,
            },
        );
        Ok(())
    }

    // --- annotations ---

    /// Add an annotation as one undoable step.
    ///
    /// Text edits need an editable document; other annotations are overlays
    /// and are allowed on view-only documents.
    pub fn add_annotation(
        &mut self,
        document_id: &DocumentId,
        page_index: usize,
        kind: AnnotationKind,
    ) -> EngineResult<AnnotationId> {
        let document = self.documents.require(document_id)?;
        if matches!(kind, AnnotationKind::TextEdit(_)) && !document.is_editable() {
            return Err(EngineError::EditNotSupported(document_id.clone()));
        }
        let page_count = document.page_count();
        let annotation = self.annotations.create(document_id.clone(), page_index, kind);
        let id = annotation.id;
        self.annotations.add(annotation.clone(), page_count)?;
        let (forward, inverse) = Patch::add(annotation);
        self.history.record(forward, inverse);
        Ok(id)
    }

    /// Merge a partial update as one undoable step. Returns false if the id is unknown.
    pub fn update_annotation(&mut self, id: AnnotationId, update: AnnotationUpdate) -> bool {
        if update.is_empty() {
            return false;
        }
        let Some(document_id) = self.annotations.get(id).map(|a| a.document_id.clone()) else {
            log::debug!("Ignoring update of unknown annotation {id}");
            return false;
        };
        let Some(inverse) = self.annotations.update(id, &update) else {
            return false;
        };
        self.history.record(
            Patch::UpdateAnnotation {
                document_id: document_id.clone(),
                id,
                update,
            },
            Patch::UpdateAnnotation {
                document_id,
                id,
                update: inverse,
            },
        );
        true
    }

    /// Remove an annotation as one undoable step. Returns false if the id is unknown.
    pub fn delete_annotation(&mut self, id: AnnotationId) -> bool {
        let Some(annotation) = self.annotations.remove(id) else {
            return false;
        };
        let (forward, inverse) = Patch::remove(annotation);
        self.history.record(forward, inverse);
        self.validate_selection();
        true
    }

    pub fn delete_selection(&mut self) -> bool {
        match self.selection {
            Some(id) => self.delete_annotation(id),
            None => false,
        }
    }

    pub fn undo(&mut self) -> bool {
        let mut workspace = Workspace {
            annotations: &mut self.annotations,
            documents: &mut self.documents,
        };
        let undone = self.history.undo(&mut workspace);
        self.validate_selection();
        undone
    }

    pub fn redo(&mut self) -> bool {
        let mut workspace = Workspace {
            annotations: &mut self.annotations,
            documents: &mut self.documents,
        };
        let redone = self.history.redo(&mut workspace);
        self.validate_selection();
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Select an annotation. Unknown ids clear the selection.
    pub fn select(&mut self, id: Option<AnnotationId>) {
        let id = id.filter(|id| self.annotations.get(*id).is_some());
        if self.selection != id {
            self.selection = id;
            self.events.emit(EngineEvent::SelectionChanged { id });
        }
    }

    fn validate_selection(&mut self) {
        if let Some(id) = self.selection {
            if self.annotations.get(id).is_none() {
                self.select(None);
            }
        }
    }

    // --- input ---

    pub fn set_tool(&mut self, tool: ToolKind) {
        let outcome = self.tools.set_tool(tool);
        self.dispatch(outcome);
    }

    /// Feed a pointer event over a page of the active document.
    pub fn pointer_event(&mut self, input: PointerInput) -> EngineResult<()> {
        let Some(document) = self.documents.active() else {
            return Ok(());
        };
        if input.page_index >= document.page_count() {
            return Err(EngineError::InvalidPageIndex {
                page_index: input.page_index,
                page_count: document.page_count(),
            });
        }
        // A gesture in flight keeps the context of the page it started on.
        let page_index = match self.tools.state().page() {
            Some((document_id, page_index)) if *document_id == document.id => page_index,
            _ => input.page_index,
        };
        let view = document.page_view(page_index).ok_or(EngineError::InvalidPageIndex {
            page_index,
            page_count: document.page_count(),
        })?;
        let page = self.annotations.query_by_page(&document.id, page_index);
        let text_runs = self
            .text_layers
            .get(&(document.id.clone(), page_index))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let ctx = ToolContext {
            document_id: &document.id,
            view,
            annotations: &page,
            text_runs,
            editable: document.is_editable(),
        };
        let outcome = self.tools.pointer(input, &ctx)?;
        self.handle_outcome(outcome)
    }

    /// Feed a key press. The tool in flight sees it first, then shortcuts.
    /// Returns whether the key was consumed.
    pub fn key_event(&mut self, event: &KeyEvent) -> EngineResult<bool> {
        if let Some(outcome) = self.tools.key(event) {
            self.handle_outcome(outcome)?;
            return Ok(true);
        }
        match ShortcutRegistry::resolve(event) {
            Some(action) => {
                self.perform(action)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Focus left the page surface.
    pub fn blur(&mut self) -> EngineResult<()> {
        let outcome = self.tools.blur();
        self.handle_outcome(outcome)
    }

    /// Replace the text being edited.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        let outcome = self.tools.set_draft(text);
        self.dispatch(outcome);
    }

    /// The gesture preview, if it belongs to the active document.
    pub fn preview(&self) -> Option<Preview> {
        let (document_id, _) = self.tools.state().page()?;
        if self.documents.active_id() != Some(document_id) {
            return None;
        }
        self.tools.preview()
    }

    /// Run a shortcut action against the active document.
    pub fn perform(&mut self, action: Action) -> EngineResult<()> {
        match action {
            Action::Undo => {
                self.undo();
            }
            Action::Redo => {
                self.redo();
            }
            Action::DeleteSelection => {
                self.delete_selection();
            }
            Action::Cancel => {
                self.select(None);
                self.set_tool(ToolKind::Select);
            }
            Action::SetTool(tool) => self.set_tool(tool),
            _ => {
                let Some(id) = self.require_active() else {
                    return Ok(());
                };
                let document = self.documents.require(&id)?;
                let (page, last) = (document.current_page(), document.page_count().saturating_sub(1));
                match action {
                    Action::NextPage => {
                        self.set_page(&id, page + 1)?;
                    }
                    Action::PreviousPage => {
                        self.set_page(&id, page.saturating_sub(1))?;
                    }
                    Action::FirstPage => {
                        self.set_page(&id, 0)?;
                    }
                    Action::LastPage => {
                        self.set_page(&id, last)?;
                    }
                    Action::ZoomIn => {
                        self.zoom_in(&id)?;
                    }
                    Action::ZoomOut => {
                        self.zoom_out(&id)?;
                    }
                    Action::ZoomReset => {
                        self.zoom_reset(&id)?;
                    }
                    Action::RotateClockwise => {
                        self.rotate(&id, true)?;
                    }
                    Action::RotateCounterClockwise => {
                        self.rotate(&id, false)?;
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Apply a tool outcome whose failures can only be logged.
    fn dispatch(&mut self, outcome: ToolOutcome) {
        if let Err(e) = self.handle_outcome(outcome) {
            log::warn!("Tool outcome rejected: {e}");
        }
    }

    fn handle_outcome(&mut self, outcome: ToolOutcome) -> EngineResult<()> {
        match outcome {
            ToolOutcome::None => {}
            ToolOutcome::Preview {
                document_id,
                page_index,
            }
            | ToolOutcome::Cancelled {
                document_id,
                page_index,
            } => self.emit_preview(document_id, page_index),
            ToolOutcome::Select(id) => self.select(id),
            ToolOutcome::Commit(Mutation::Add {
                document_id,
                page_index,
                kind,
            }) => {
                self.emit_preview(document_id.clone(), page_index);
                self.add_annotation(&document_id, page_index, kind)?;
            }
            ToolOutcome::Commit(Mutation::Update { document_id, id, update }) => {
                if let Some(page_index) = self.annotations.get(id).map(|a| a.page_index) {
                    self.emit_preview(document_id, page_index);
                }
                self.update_annotation(id, update);
            }
        }
        Ok(())
    }

    fn emit_preview(&self, document_id: DocumentId, page_index: usize) {
        self.events.emit(EngineEvent::PreviewChanged {
            document_id,
            page_index,
        });
    }

    fn cancel_gesture_on(&mut self, id: &DocumentId) {
        if self.tools.state().page().is_some_and(|(document_id, _)| document_id == id) {
            let outcome = self.tools.cancel();
            self.dispatch(outcome);
        }
    }

    // --- background work ---

    /// Start a document-scoped task at the document's current revision.
    pub fn begin_task(
        &mut self,
        document_id: &DocumentId,
        kind: TaskKind,
        page_index: Option<usize>,
    ) -> EngineResult<TaskTicket> {
        let document = self.documents.require(document_id)?;
        if let Some(page_index) = page_index {
            if page_index >= document.page_count() {
                return Err(EngineError::InvalidPageIndex {
                    page_index,
                    page_count: document.page_count(),
                });
            }
        }
        Ok(self.tasks.begin(document_id.clone(), kind, page_index, document.revision()))
    }

    /// Finish a task. Returns true only if its result still applies: not
    /// cancelled, document still open with unchanged content, page still valid.
    pub fn finish_task(&mut self, ticket: &TaskTicket) -> bool {
        if !self.tasks.complete(ticket) {
            return false;
        }
        let Some(document) = self.documents.get(&ticket.document_id) else {
            return false;
        };
        if document.revision() != ticket.revision {
            log::debug!("Dropping {:?} result for stale revision of {}", ticket.kind, ticket.document_id);
            return false;
        }
        ticket.page_index.is_none_or(|page| page < document.page_count())
    }

    /// Store a page's text layer if its task is still current.
    pub fn complete_text_layer(&mut self, ticket: &TaskTicket, runs: Vec<TextRun>) -> bool {
        let Some(page_index) = ticket.page_index else {
            log::error!("Text layer task {} has no page", ticket.id);
            return false;
        };
        if !self.finish_task(ticket) {
            return false;
        }
        self.text_layers.insert((ticket.document_id.clone(), page_index), runs);
        true
    }

    pub fn text_layer(&self, document_id: &DocumentId, page_index: usize) -> Option<&[TextRun]> {
        self.text_layers
            .get(&(document_id.clone(), page_index))
            .map(Vec::as_slice)
    }

    // --- page operations ---

    /// Take a detached copy of a document for a page operation.
    pub fn snapshot_for_edit(&mut self, id: &DocumentId) -> EngineResult<EditSnapshot> {
        let document = self.documents.require(id)?;
        if !document.is_editable() {
            return Err(EngineError::EditNotSupported(id.clone()));
        }
        let (name, bytes, page_count, revision) = (
            document.name.clone(),
            document.duplicate_bytes(),
            document.page_count(),
            document.revision(),
        );
        let ticket = self.tasks.begin(id.clone(), TaskKind::PageEdit, None, revision);
        Ok(EditSnapshot {
            document_id: id.clone(),
            name,
            bytes,
            page_count,
            ticket,
        })
    }

    /// Install the result of a page operation.
    ///
    /// Fails with `StaleSnapshot` if the task was cancelled or the document
    /// changed since the snapshot. Annotations follow their pages; those on
    /// removed pages are dropped. The document's history is discarded.
    /// Returns the new content, which the renderer must be given with
    /// [`pages::reload`](crate::pages::reload).
    pub fn apply_page_edit(&mut self, edit: PageEdit) -> EngineResult<Bytes> {
        let id = edit.ticket.document_id.clone();
        if !self.tasks.complete(&edit.ticket) {
            return Err(EngineError::StaleSnapshot(id));
        }
        let document = self.documents.require(&id)?;
        if document.revision() != edit.ticket.revision {
            return Err(EngineError::StaleSnapshot(id));
        }
        let expected = edit.change.page_count_after(document.page_count());
        if edit.page_sizes.len() != expected {
            log::warn!(
                "Page edit of {id} left {} pages, expected {expected}",
                edit.page_sizes.len()
            );
        }
        if edit.page_sizes.is_empty() {
            return Err(EngineError::DocumentLoad {
                name: document.name.clone(),
                reason: "page operation left no pages".to_string(),
            });
        }
        let current_page = edit.change.follow(document.current_page());

        self.cancel_gesture_on(&id);
        self.tasks.cancel_document(&id);
        let bytes = Bytes::from(edit.bytes);
        self.documents.replace_content(&id, bytes.clone(), edit.page_sizes)?;
        self.documents.set_page(&id, current_page)?;
        let dropped = self.annotations.remap_pages(&id, &edit.change);
        self.history.retain(|entry| entry.forward.document_id() != &id);
        self.text_layers.retain(|(document_id, _), _| *document_id != id);
        self.validate_selection();
        log::debug!(
            "Applied {:?} to {id}, dropped {} annotations",
            edit.change,
            dropped.len()
        );
        Ok(bytes)
    }

    // --- persistence ---

    /// Snapshot a document's annotations for storage.
    pub fn export_annotations(&self, id: &DocumentId) -> EngineResult<AnnotationSet> {
        let document = self.documents.require(id)?;
        let annotations = self
            .annotations
            .for_document(id)
            .into_iter()
            .cloned()
            .collect();
        Ok(AnnotationSet::new(document.name.clone(), annotations))
    }

    /// Add saved annotations to a document with fresh ids, keeping their
    /// stacking order. Annotations on pages the document lacks, and text
    /// edits on a view-only document, are skipped. Not recorded in history.
    /// Returns the number imported.
    pub fn import_annotations(&mut self, id: &DocumentId, set: AnnotationSet) -> EngineResult<usize> {
        let document = self.documents.require(id)?;
        let (page_count, editable) = (document.page_count(), document.is_editable());
        let mut saved = set.annotations;
        saved.sort_by_key(|a| a.created_at);
        let mut imported = 0;
        for annotation in saved {
            if annotation.page_index >= page_count {
                log::warn!(
                    "Skipping saved {} on page {} of {id} ({page_count} pages)",
                    annotation.kind.name(),
                    annotation.page_index
                );
                continue;
            }
            if !editable && matches!(annotation.kind, AnnotationKind::TextEdit(_)) {
                log::warn!("Skipping saved text edit on view-only {id}");
                continue;
            }
            let fresh = self.annotations.create(id.clone(), annotation.page_index, annotation.kind);
            self.annotations.add(fresh, page_count)?;
            imported += 1;
        }
        Ok(imported)
    }

    // --- deferred commands ---

    /// Execute queued commands. Commands queued while these run wait for the next call.
    pub fn run_deferred(&mut self) -> usize {
        let batch = self.commands.take();
        let count = batch.len();
        for command in batch {
            if let Err(e) = self.execute(command) {
                log::warn!("Deferred command failed: {e}");
            }
        }
        count
    }

    pub fn execute(&mut self, command: Command) -> EngineResult<()> {
        match command {
            Command::Undo => {
                self.undo();
            }
            Command::Redo => {
                self.redo();
            }
            Command::SetActive(id) => {
                self.set_active(&id);
            }
            Command::Close(id) => self.close(&id)?,
            Command::SetPage {
                document_id,
                page_index,
            } => {
                self.set_page(&document_id, page_index)?;
            }
            Command::SetZoom { document_id, zoom } => {
                self.set_zoom(&document_id, zoom)?;
            }
            Command::SetTool(tool) => self.set_tool(tool),
            Command::Select(id) => self.select(id),
            Command::DeleteSelection => {
                self.delete_selection();
            }
        }
        Ok(())
    }
}
