//! Test helpers: a minimal executor and in-memory collaborators.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use kurbo::{Rect, Size};

use crate::backend::{
    BackendError, BackendResult, BoxFuture, DocumentInfo, EditableDocument, PageImage, PdfEditor, PdfRenderer,
    TextRun,
};
use crate::coords::{PageView, Rotation};
use crate::document::DocumentId;

pub fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}

/// A fake PDF understood by the mock collaborators.
pub fn fake_pdf(pages: usize, encrypted: bool) -> Vec<u8> {
    let suffix = if encrypted { " encrypted" } else { "" };
    format!("%PDF-fake pages={pages}{suffix}").into_bytes()
}

fn parse_fake_pdf(bytes: &[u8]) -> BackendResult<(usize, bool)> {
    let text = std::str::from_utf8(bytes).map_err(|_| BackendError::Corrupt("not utf-8".to_string()))?;
    let rest = text
        .strip_prefix("%PDF-fake pages=")
        .ok_or_else(|| BackendError::Corrupt("missing header".to_string()))?;
    let mut parts = rest.split(' ');
    let pages = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| BackendError::Corrupt("bad page count".to_string()))?;
    Ok((pages, parts.next() == Some("encrypted")))
}

/// Future that stays pending for a number of polls.
struct Delay {
    remaining: usize,
    polls: Rc<Cell<usize>>,
}

impl Future for Delay {
    type Output = BackendResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.polls.set(self.polls.get() + 1);
        if self.remaining == 0 {
            return Poll::Ready(Ok(()));
        }
        self.remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Renderer that reports US Letter pages and one text run per page.
#[derive(Default)]
pub struct MockRenderer {
    pending_polls: usize,
    ready_polls: Rc<Cell<usize>>,
    documents: RefCell<HashMap<DocumentId, usize>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pending_polls(mut self, polls: usize) -> Self {
        self.pending_polls = polls;
        self
    }

    pub fn ready_polls(&self) -> usize {
        self.ready_polls.get()
    }

    pub fn is_loaded(&self, id: &DocumentId) -> bool {
        self.documents.borrow().contains_key(id)
    }

    pub fn loaded_count(&self) -> usize {
        self.documents.borrow().len()
    }

    /// The text run reported for every page.
    pub fn text_run(page_index: usize) -> TextRun {
        TextRun {
            text: format!("Page {} text", page_index + 1),
            rect: Rect::new(72.0, 72.0, 300.0, 90.0),
        }
    }
}

impl PdfRenderer for MockRenderer {
    fn ready(&self) -> BoxFuture<'_, BackendResult<()>> {
        Box::pin(Delay {
            remaining: self.pending_polls,
            polls: self.ready_polls.clone(),
        })
    }

    fn load(&self, id: &DocumentId, bytes: Vec<u8>) -> BoxFuture<'_, BackendResult<DocumentInfo>> {
        let id = id.clone();
        Box::pin(async move {
            let (pages, _) = parse_fake_pdf(&bytes)?;
            if pages > 0 {
                self.documents.borrow_mut().insert(id, pages);
            }
            Ok(DocumentInfo {
                page_sizes: vec![Size::new(612.0, 792.0); pages],
            })
        })
    }

    fn render(
        &self,
        id: &DocumentId,
        page_index: usize,
        zoom: f64,
        rotation: Rotation,
    ) -> BoxFuture<'_, BackendResult<PageImage>> {
        let pages = self.documents.borrow().get(id).copied();
        Box::pin(async move {
            match pages {
                Some(count) if page_index < count => {
                    let size = PageView::new(zoom, rotation, Size::new(612.0, 792.0)).screen_size();
                    let (width, height) = (size.width.ceil() as u32, size.height.ceil() as u32);
                    Ok(PageImage::new(width, height, vec![255; (width * height * 4) as usize]))
                }
                Some(_) => Err(BackendError::Failed("page out of range".to_string())),
                None => Err(BackendError::Failed("document not loaded".to_string())),
            }
        })
    }

    fn text_content(&self, id: &DocumentId, page_index: usize) -> BoxFuture<'_, BackendResult<Vec<TextRun>>> {
        let pages = self.documents.borrow().get(id).copied();
        Box::pin(async move {
            match pages {
                Some(count) if page_index < count => Ok(vec![Self::text_run(page_index)]),
                Some(_) => Err(BackendError::Failed("page out of range".to_string())),
                None => Err(BackendError::Failed("document not loaded".to_string())),
            }
        })
    }

    fn unload(&self, id: &DocumentId) {
        self.documents.borrow_mut().remove(id);
    }
}

/// Editable fake document: each entry names the source page it came from.
#[derive(Debug, Clone, Default)]
pub struct FakeEditable {
    pub pages: Vec<usize>,
}

impl FakeEditable {
    /// Entry of a page created blank.
    pub const BLANK: usize = usize::MAX;
}

impl EditableDocument for FakeEditable {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn copy_pages_from<'a>(
        &'a mut self,
        source: &'a dyn EditableDocument,
        pages: &'a [usize],
    ) -> BoxFuture<'a, BackendResult<()>> {
        Box::pin(async move {
            let source = source
                .as_any()
                .downcast_ref::<FakeEditable>()
                .ok_or_else(|| BackendError::Unsupported("foreign document".to_string()))?;
            for &page in pages {
                let origin = source
                    .pages
                    .get(page)
                    .copied()
                    .ok_or_else(|| BackendError::Failed(format!("no page {page}")))?;
                self.pages.push(origin);
            }
            Ok(())
        })
    }

    fn remove_page(&mut self, page_index: usize) -> BackendResult<()> {
        if page_index >= self.pages.len() {
            return Err(BackendError::Failed(format!("no page {page_index}")));
        }
        self.pages.remove(page_index);
        Ok(())
    }

    fn insert_blank_page(&mut self, page_index: usize, _size: Size) -> BackendResult<()> {
        if page_index > self.pages.len() {
            return Err(BackendError::Failed(format!("cannot insert at {page_index}")));
        }
        self.pages.insert(page_index, Self::BLANK);
        Ok(())
    }

    fn save(&self) -> BoxFuture<'_, BackendResult<Vec<u8>>> {
        let pages = self.pages.len();
        Box::pin(async move { Ok(fake_pdf(pages, false)) })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Editor that refuses encrypted fake PDFs.
pub struct MockEditor;

impl PdfEditor for MockEditor {
    fn load(&self, bytes: Vec<u8>) -> BoxFuture<'_, BackendResult<Box<dyn EditableDocument>>> {
        Box::pin(async move {
            let (pages, encrypted) = parse_fake_pdf(&bytes)?;
            if encrypted {
                return Err(BackendError::Encrypted);
            }
            Ok(Box::new(FakeEditable {
                pages: (0..pages).collect(),
            }) as Box<dyn EditableDocument>)
        })
    }

    fn create(&self) -> BoxFuture<'_, BackendResult<Box<dyn EditableDocument>>> {
        Box::pin(async move { Ok(Box::new(FakeEditable::default()) as Box<dyn EditableDocument>) })
    }
}
