//! Layered per-page composition driven by engine events.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use pagemark_core::{Annotation, AnnotationId, DocumentId, EngineEvent, EventBus, Preview, Session, SubscriptionId};
use peniko::Color;

use crate::display_list::{DrawCommand, Layer, PageDrawList};
use crate::draw::{draw_annotation, draw_draft_text, draw_marquee, draw_selection};

/// Result of re-composing one page.
#[derive(Debug, Clone)]
pub enum PageFrame {
    /// New draw list for the page.
    Draw(PageDrawList),
    /// The page has no overlay content left; the host clears its overlay.
    Clear { document_id: DocumentId, page_index: usize },
}

/// Pages whose last composition is still current.
#[derive(Debug, Default)]
struct CleanPages(HashSet<(DocumentId, usize)>);

impl CleanPages {
    fn invalidate(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::AnnotationsChanged {
                document_id,
                page_index,
            }
            | EngineEvent::PreviewChanged {
                document_id,
                page_index,
            } => {
                self.0.remove(&(document_id.clone(), *page_index));
            }
            EngineEvent::DocumentUpdated { id } => self.0.retain(|(doc, _)| doc != id),
            EngineEvent::DocumentsChanged
            | EngineEvent::ActiveDocumentChanged { .. }
            | EngineEvent::SelectionChanged { .. } => self.0.clear(),
            EngineEvent::HistoryChanged { .. } => {}
        }
    }
}

/// Builds draw lists for the visible pages of the active document.
///
/// Layers, bottom to top: page raster, committed annotations, gesture
/// preview, selection outline. Only pages invalidated by an event since
/// their last composition are rebuilt.
pub struct Compositor {
    /// Selection, marquee and draft-box color.
    pub accent: Color,
    clean: Rc<RefCell<CleanPages>>,
    subscription: Option<(EventBus, SubscriptionId)>,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            accent: Color::from_rgba8(59, 130, 246, 255),
            clean: Rc::default(),
            subscription: None,
        }
    }

    /// Create a compositor that listens to a session's events.
    pub fn attached(session: &Session) -> Self {
        let mut compositor = Self::new();
        compositor.attach(session.events());
        compositor
    }

    /// Subscribe to an event bus, replacing any previous subscription.
    pub fn attach(&mut self, events: &EventBus) {
        self.detach();
        let clean = Rc::clone(&self.clean);
        let id = events.subscribe(move |event| clean.borrow_mut().invalidate(event));
        self.subscription = Some((events.clone(), id));
        self.invalidate_all();
    }

    pub fn detach(&mut self) {
        if let Some((events, id)) = self.subscription.take() {
            events.unsubscribe(id);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Force every page to be re-composed.
    pub fn invalidate_all(&mut self) {
        self.clean.borrow_mut().0.clear();
    }

    /// Whether a page needs to be re-composed.
    pub fn is_dirty(&self, document_id: &DocumentId, page_index: usize) -> bool {
        !self.clean.borrow().0.contains(&(document_id.clone(), page_index))
    }

    /// Re-compose the dirty pages among `visible` for the active document.
    ///
    /// Pages with an unusable surface produce no frame.
    pub fn render(&mut self, session: &Session, visible: impl IntoIterator<Item = usize>) -> Vec<PageFrame> {
        let Some(document_id) = session.active_id().cloned() else {
            return Vec::new();
        };
        let mut frames = Vec::new();
        for page_index in visible {
            if !self.is_dirty(&document_id, page_index) {
                continue;
            }
            if let Some(frame) = self.render_page(session, page_index) {
                frames.push(frame);
            }
            self.clean.borrow_mut().0.insert((document_id.clone(), page_index));
        }
        frames
    }

    fn render_page(&self, session: &Session, page_index: usize) -> Option<PageFrame> {
        let document = session.active()?;
        let Some(view) = document.page_view(page_index) else {
            log::warn!("Page {page_index} is not part of {}", document.name);
            return None;
        };
        let size = view.screen_size();
        if size.width <= 0.0 || size.height <= 0.0 {
            log::trace!("Skipping page {page_index}: zero-sized surface");
            return None;
        }
        Some(match self.compose_page(session, page_index) {
            Some(list) => PageFrame::Draw(list),
            None => PageFrame::Clear {
                document_id: document.id.clone(),
                page_index,
            },
        })
    }

    /// Build the draw list for one page of the active document, ignoring
    /// dirty state. `None` if the page has no overlay content or no surface.
    pub fn compose_page(&self, session: &Session, page_index: usize) -> Option<PageDrawList> {
        let document = session.active()?;
        let view = document.page_view(page_index)?;
        let size = view.screen_size();
        if size.width <= 0.0 || size.height <= 0.0 {
            return None;
        }

        let annotations = session.annotations().query_by_page(&document.id, page_index);
        let preview = session.preview().filter(|p| p.page_index() == page_index);
        let selected = session
            .selection()
            .and_then(|id| session.annotations().get(id))
            .filter(|a| a.page_index == page_index && a.document_id == document.id);
        if annotations.is_empty() && preview.is_none() && selected.is_none() {
            return None;
        }

        let mut list = PageDrawList::new(document.id.clone(), page_index, size);
        list.push(DrawCommand::PageRaster {
            page_index,
            rect: view.rect_to_screen(view.page_rect()),
            zoom: view.zoom,
            rotation: view.rotation,
        });

        // An annotation being dragged is drawn at its new position in the preview layer.
        let moving: Option<AnnotationId> = match &preview {
            Some(Preview::Move { id, .. }) => Some(*id),
            _ => None,
        };
        for annotation in annotations.iter().filter(|a| Some(a.id) != moving) {
            draw_annotation(&annotation.kind, &view, Layer::Annotations, &mut list);
        }

        let mut selection_bounds = selected.map(Annotation::bounds);
        match &preview {
            None => {}
            Some(Preview::Annotation { kind, .. }) => draw_annotation(kind, &view, Layer::Preview, &mut list),
            Some(Preview::Marquee { rect, .. }) => draw_marquee(*rect, &view, self.accent, &mut list),
            Some(Preview::Move { id, delta, .. }) => {
                if let Some(annotation) = annotations.iter().find(|a| a.id == *id) {
                    let mut moved = (*annotation).clone();
                    moved.translate(*delta);
                    draw_annotation(&moved.kind, &view, Layer::Preview, &mut list);
                    if selected.is_some_and(|s| s.id == *id) {
                        selection_bounds = Some(moved.bounds());
                    }
                }
            }
            Some(Preview::Text {
                rect, text, font_size, ..
            }) => {
                let styles = &session.tools().styles;
                draw_draft_text(
                    *rect,
                    text,
                    *font_size,
                    &styles.font_family,
                    styles.text_color.into(),
                    self.accent,
                    &view,
                    &mut list,
                );
            }
        }

        if let Some(bounds) = selection_bounds {
            draw_selection(bounds, &view, self.accent, &mut list);
        }
        Some(list)
    }
}

impl Drop for Compositor {
    fn drop(&mut self) {
        self.detach();
    }
}
