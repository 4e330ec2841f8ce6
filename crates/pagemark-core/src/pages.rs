//! Page operations and file conversions.
//!
//! Every operation works on an [`EditSnapshot`] taken from the session: a
//! duplicate of the document bytes plus the content revision and a task
//! ticket. Nothing here borrows the session, so results are re-validated
//! with [`Session::apply_page_edit`](crate::Session::apply_page_edit) when
//! they come back.

use bytes::Bytes;
use kurbo::Size;

use crate::backend::{
    BackendError, ConversionJob, ConversionService, EditableDocument, OcrEngine, PageImage, PdfEditor, PdfRenderer,
};
use crate::coords::PageView;
use crate::document::DocumentId;
use crate::error::{EngineError, EngineResult};
use crate::tasks::TaskTicket;

/// A detached copy of a document for an async page operation.
#[derive(Debug, Clone)]
pub struct EditSnapshot {
    pub document_id: DocumentId,
    pub name: String,
    /// Private copy of the document bytes.
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub ticket: TaskTicket,
}

impl EditSnapshot {
    /// Content revision the snapshot was taken at.
    pub fn revision(&self) -> u64 {
        self.ticket.revision
    }
}

/// How a page operation moved the pages of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageChange {
    /// Pages deleted, ascending and deduplicated.
    Removed(Vec<usize>),
    /// `count` blank pages inserted before page `at`.
    Inserted { at: usize, count: usize },
    /// New page order: entry `i` is the old index of new page `i`.
    Reordered(Vec<usize>),
}

impl PageChange {
    /// Where old page `old` ended up, or `None` if it was removed.
    pub fn new_index(&self, old: usize) -> Option<usize> {
        match self {
            PageChange::Removed(removed) => {
                if removed.contains(&old) {
                    return None;
                }
                Some(old - removed.iter().filter(|&&r| r < old).count())
            }
            PageChange::Inserted { at, count } => Some(if old >= *at { old + count } else { old }),
            PageChange::Reordered(order) => order.iter().position(|&p| p == old),
        }
    }

    /// Page to show after the change when `current` was showing. A removed
    /// current page falls back to the surviving page before it.
    pub fn follow(&self, current: usize) -> usize {
        match (self, self.new_index(current)) {
            (_, Some(index)) => index,
            (PageChange::Removed(removed), None) => {
                let shift = removed.iter().filter(|&&r| r < current).count();
                current.saturating_sub(shift + 1)
            }
            (_, None) => current,
        }
    }

    /// Page count after the change.
    pub fn page_count_after(&self, before: usize) -> usize {
        match self {
            PageChange::Removed(removed) => before.saturating_sub(removed.len()),
            PageChange::Inserted { count, .. } => before + count,
            PageChange::Reordered(order) => order.len(),
        }
    }
}

/// New content for a document after a page operation.
#[derive(Debug, Clone)]
pub struct PageEdit {
    pub ticket: TaskTicket,
    pub bytes: Vec<u8>,
    pub page_sizes: Vec<Size>,
    pub change: PageChange,
}

fn validate_pages(pages: &[usize], page_count: usize) -> EngineResult<Vec<usize>> {
    let mut sorted = pages.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if let Some(&page_index) = sorted.iter().find(|&&p| p >= page_count) {
        return Err(EngineError::InvalidPageIndex { page_index, page_count });
    }
    Ok(sorted)
}

fn cancelled(ticket: &TaskTicket) -> EngineError {
    EngineError::StaleSnapshot(ticket.document_id.clone())
}

fn unsupported(reason: &str) -> EngineError {
    EngineError::Backend(BackendError::Unsupported(reason.to_string()))
}

/// Save an edited document and measure its pages.
///
/// The renderer decodes the result under a throwaway id that is released
/// straight away. The live copy under the document's id is only replaced by
/// [`reload`] once the session has accepted the edit.
async fn finish_edit(
    renderer: &dyn PdfRenderer,
    document: &dyn EditableDocument,
    snapshot: EditSnapshot,
    change: PageChange,
) -> EngineResult<PageEdit> {
    let bytes = document.save().await?;
    if snapshot.ticket.is_cancelled() {
        return Err(cancelled(&snapshot.ticket));
    }
    let staging = DocumentId::generate();
    let info = renderer.load(&staging, bytes.clone()).await;
    renderer.unload(&staging);
    let info = info?;
    log::debug!(
        "Edited pages of {} ({change:?}), {} pages now",
        snapshot.name,
        info.page_sizes.len()
    );
    Ok(PageEdit {
        ticket: snapshot.ticket,
        bytes,
        page_sizes: info.page_sizes,
        change,
    })
}

/// Delete pages from a snapshot.
pub async fn remove_pages(
    renderer: &dyn PdfRenderer,
    editor: &dyn PdfEditor,
    snapshot: EditSnapshot,
    pages: &[usize],
) -> EngineResult<PageEdit> {
    let removed = validate_pages(pages, snapshot.page_count)?;
    if removed.is_empty() {
        return Err(unsupported("no pages to remove"));
    }
    if removed.len() == snapshot.page_count {
        return Err(unsupported("a document must keep at least one page"));
    }

    let mut document = editor.load(snapshot.bytes.clone()).await?;
    for &page_index in removed.iter().rev() {
        document.remove_page(page_index)?;
    }
    finish_edit(renderer, document.as_ref(), snapshot, PageChange::Removed(removed)).await
}

/// Insert a blank page of `size` before page `at`. `at == page_count` appends.
pub async fn insert_blank_page(
    renderer: &dyn PdfRenderer,
    editor: &dyn PdfEditor,
    snapshot: EditSnapshot,
    at: usize,
    size: Size,
) -> EngineResult<PageEdit> {
    if at > snapshot.page_count {
        return Err(EngineError::InvalidPageIndex {
            page_index: at,
            page_count: snapshot.page_count,
        });
    }
    if size.width <= 0.0 || size.height <= 0.0 {
        return Err(unsupported("blank page needs a positive size"));
    }
    let mut document = editor.load(snapshot.bytes.clone()).await?;
    document.insert_blank_page(at, size)?;
    finish_edit(renderer, document.as_ref(), snapshot, PageChange::Inserted { at, count: 1 }).await
}

/// Rearrange pages. `order[i]` is the current index of the page that becomes page `i`;
/// it must name every page exactly once.
pub async fn reorder_pages(
    renderer: &dyn PdfRenderer,
    editor: &dyn PdfEditor,
    snapshot: EditSnapshot,
    order: &[usize],
) -> EngineResult<PageEdit> {
    let distinct = validate_pages(order, snapshot.page_count)?;
    if order.len() != snapshot.page_count || distinct.len() != order.len() {
        return Err(unsupported("page order must name every page once"));
    }
    let source = editor.load(snapshot.bytes.clone()).await?;
    let mut target = editor.create().await?;
    target.copy_pages_from(source.as_ref(), order).await?;
    finish_edit(
        renderer,
        target.as_ref(),
        snapshot,
        PageChange::Reordered(order.to_vec()),
    )
    .await
}

/// Point the renderer at a document's new content after
/// [`Session::apply_page_edit`](crate::Session::apply_page_edit) accepted it.
pub async fn reload(renderer: &dyn PdfRenderer, document_id: &DocumentId, bytes: Bytes) -> EngineResult<()> {
    let info = renderer.load(document_id, bytes.to_vec()).await?;
    log::debug!("Reloaded {document_id}: {} pages", info.page_sizes.len());
    Ok(())
}

/// Rasterize a page at the zoom and rotation of `view`. Returns `None` if the
/// ticket was cancelled while the renderer worked.
pub async fn rasterize(
    renderer: &dyn PdfRenderer,
    ticket: &TaskTicket,
    view: PageView,
) -> EngineResult<Option<PageImage>> {
    let Some(page_index) = ticket.page_index else {
        return Err(unsupported("render task has no page"));
    };
    let image = renderer
        .render(&ticket.document_id, page_index, view.zoom, view.rotation)
        .await?;
    if ticket.is_cancelled() {
        log::trace!("Dropping raster of {}#{page_index}", ticket.document_id);
        return Ok(None);
    }
    Ok(Some(image))
}

/// Copy pages of a snapshot into a new PDF.
pub async fn extract_pages(editor: &dyn PdfEditor, snapshot: &EditSnapshot, pages: &[usize]) -> EngineResult<Vec<u8>> {
    if pages.is_empty() {
        return Err(EngineError::Backend(BackendError::Unsupported("no pages to extract".to_string())));
    }
    validate_pages(pages, snapshot.page_count)?;
    let source = editor.load(snapshot.bytes.clone()).await?;
    let mut target = editor.create().await?;
    target.copy_pages_from(source.as_ref(), pages).await?;
    if snapshot.ticket.is_cancelled() {
        return Err(cancelled(&snapshot.ticket));
    }
    Ok(target.save().await?)
}

/// Concatenate whole PDFs, in order, into a new PDF.
pub async fn merge(editor: &dyn PdfEditor, sources: Vec<Vec<u8>>) -> EngineResult<Vec<u8>> {
    if sources.is_empty() {
        return Err(EngineError::Backend(BackendError::Unsupported("nothing to merge".to_string())));
    }
    let mut target = editor.create().await?;
    for bytes in sources {
        let source = editor.load(bytes).await?;
        let pages: Vec<usize> = (0..source.page_count()).collect();
        target.copy_pages_from(source.as_ref(), &pages).await?;
    }
    log::debug!("Merged into {} pages", target.page_count());
    Ok(target.save().await?)
}

/// Run a conversion job. Returns `None` if the ticket was
/// cancelled while the job ran.
pub async fn convert(
    service: &dyn ConversionService,
    ticket: &TaskTicket,
    input: Vec<u8>,
    job: &ConversionJob,
) -> EngineResult<Option<Vec<u8>>> {
    job.validate()?;
    let output = service.run(input, job).await?;
    if ticket.is_cancelled() {
        log::debug!("Dropping result of cancelled conversion task {}", ticket.id);
        return Ok(None);
    }
    Ok(Some(output))
}

/// Recognize the text of a page image. Returns `None` if the ticket was
/// cancelled while recognition ran.
pub async fn recognize_page(
    ocr: &dyn OcrEngine,
    ticket: &TaskTicket,
    image: Vec<u8>,
    language: &str,
    progress: &mut dyn FnMut(f32),
) -> EngineResult<Option<String>> {
    let text = ocr.recognize(image, language, progress).await?;
    if ticket.is_cancelled() {
        return Ok(None);
    }
    Ok(Some(text))
}
