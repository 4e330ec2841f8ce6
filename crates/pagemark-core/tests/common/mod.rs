//! Shared helpers for integration tests: an executor and fake PDF collaborators.
#![allow(dead_code)]

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::task::{Context, Poll};

use kurbo::{Rect, Size};
use pagemark_core::backend::{
    BackendError, BackendResult, BoxFuture, DocumentInfo, EditableDocument, PageImage, PdfEditor, PdfRenderer,
    TextRun,
};
use pagemark_core::{DocumentId, PageView, Rotation};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

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

/// A stand-in PDF: a header line naming the page count.
pub fn pdf(pages: usize) -> Vec<u8> {
    format!("%PDF-test pages={pages}").into_bytes()
}

pub fn encrypted_pdf(pages: usize) -> Vec<u8> {
    format!("%PDF-test pages={pages} encrypted").into_bytes()
}

fn parse(bytes: &[u8]) -> BackendResult<(usize, bool)> {
    let text = std::str::from_utf8(bytes).map_err(|e| BackendError::Corrupt(e.to_string()))?;
    let rest = text
        .strip_prefix("%PDF-test pages=")
        .ok_or_else(|| BackendError::Corrupt("not a PDF".to_string()))?;
    let mut parts = rest.split(' ');
    let pages = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| BackendError::Corrupt("bad page count".to_string()))?;
    Ok((pages, parts.next() == Some("encrypted")))
}

pub const PAGE_SIZE: Size = Size::new(612.0, 792.0);

/// Renderer with Letter pages and a single text run per page.
#[derive(Default)]
pub struct TestRenderer {
    loaded: RefCell<HashMap<DocumentId, usize>>,
}

impl TestRenderer {
    /// Page count of the copy held under `id`, if any.
    pub fn pages_of(&self, id: &DocumentId) -> Option<usize> {
        self.loaded.borrow().get(id).copied()
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.borrow().len()
    }

    pub fn run(page_index: usize) -> TextRun {
        TextRun {
            text: format!("Heading {}", page_index + 1),
            rect: Rect::new(72.0, 72.0, 272.0, 90.0),
        }
    }
}

impl PdfRenderer for TestRenderer {
    fn ready(&self) -> BoxFuture<'_, BackendResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn load(&self, id: &DocumentId, bytes: Vec<u8>) -> BoxFuture<'_, BackendResult<DocumentInfo>> {
        let id = id.clone();
        Box::pin(async move {
            let (pages, _) = parse(&bytes)?;
            self.loaded.borrow_mut().insert(id, pages);
            Ok(DocumentInfo {
                page_sizes: vec![PAGE_SIZE; pages],
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
        let known = self.pages_of(id).is_some_and(|pages| page_index < pages);
        Box::pin(async move {
            if !known {
                return Err(BackendError::Failed("unknown page".to_string()));
            }
            let size = PageView::new(zoom, rotation, PAGE_SIZE).screen_size();
            let (width, height) = (size.width.round() as u32, size.height.round() as u32);
            Ok(PageImage::new(width, height, vec![0; (width * height * 4) as usize]))
        })
    }

    fn text_content(&self, id: &DocumentId, page_index: usize) -> BoxFuture<'_, BackendResult<Vec<TextRun>>> {
        let known = self.loaded.borrow().get(id).is_some_and(|&pages| page_index < pages);
        Box::pin(async move {
            if known {
                Ok(vec![Self::run(page_index)])
            } else {
                Err(BackendError::Failed("unknown page".to_string()))
            }
        })
    }

    fn unload(&self, id: &DocumentId) {
        self.loaded.borrow_mut().remove(id);
    }
}

#[derive(Default)]
pub struct TestDocument {
    pages: usize,
}

impl EditableDocument for TestDocument {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn copy_pages_from<'a>(
        &'a mut self,
        _source: &'a dyn EditableDocument,
        pages: &'a [usize],
    ) -> BoxFuture<'a, BackendResult<()>> {
        Box::pin(async move {
            self.pages += pages.len();
            Ok(())
        })
    }

    fn remove_page(&mut self, page_index: usize) -> BackendResult<()> {
        if page_index >= self.pages {
            return Err(BackendError::Failed(format!("no page {page_index}")));
        }
        self.pages -= 1;
        Ok(())
    }

    fn insert_blank_page(&mut self, page_index: usize, _size: Size) -> BackendResult<()> {
        if page_index > self.pages {
            return Err(BackendError::Failed(format!("cannot insert at {page_index}")));
        }
        self.pages += 1;
        Ok(())
    }

    fn save(&self) -> BoxFuture<'_, BackendResult<Vec<u8>>> {
        Box::pin(async move { Ok(pdf(self.pages)) })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Editor that cannot open encrypted files.
pub struct TestEditor;

impl PdfEditor for TestEditor {
    fn load(&self, bytes: Vec<u8>) -> BoxFuture<'_, BackendResult<Box<dyn EditableDocument>>> {
        Box::pin(async move {
            let (pages, encrypted) = parse(&bytes)?;
            if encrypted {
                return Err(BackendError::Encrypted);
            }
            Ok(Box::new(TestDocument { pages }) as Box<dyn EditableDocument>)
        })
    }

    fn create(&self) -> BoxFuture<'_, BackendResult<Box<dyn EditableDocument>>> {
        Box::pin(async { Ok(Box::new(TestDocument::default()) as Box<dyn EditableDocument>) })
    }
}
