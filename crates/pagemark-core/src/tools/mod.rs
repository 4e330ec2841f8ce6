//! Tool state machine.
//!
//! Turns pointer and keyboard gestures over a page into mutation requests.
//! Screen positions are converted to PDF-space as soon as they arrive, so
//! everything the machine stores and emits is in page units.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::annotation::{
    Annotation, AnnotationId, AnnotationKind, AnnotationUpdate, PenStroke, ShapeKind, ShapeMark, StickyNote,
    TextEdit, TextMarkup,
};
use crate::backend::TextRun;
use crate::config::{EngineConfig, ToolStyles};
use crate::coords::PageView;
use crate::document::DocumentId;
use crate::error::{EngineError, EngineResult};
use crate::input::{Key, KeyEvent, PointerInput, PointerKind};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Highlight,
    Underline,
    Strikeout,
    Pen,
    Rectangle,
    Circle,
    Line,
    Arrow,
    StickyNote,
    TextEdit,
}

impl ToolKind {
    /// Tools that create an annotation with a press-drag-release gesture.
    pub fn is_drawing(self) -> bool {
        !matches!(self, ToolKind::Select | ToolKind::TextEdit)
    }

    pub fn is_markup(self) -> bool {
        matches!(self, ToolKind::Highlight | ToolKind::Underline | ToolKind::Strikeout)
    }

    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            ToolKind::Rectangle => Some(ShapeKind::Rectangle),
            ToolKind::Circle => Some(ShapeKind::Circle),
            ToolKind::Line => Some(ShapeKind::Line),
            ToolKind::Arrow => Some(ShapeKind::Arrow),
            _ => None,
        }
    }
}

/// What a text edit session will commit to.
#[derive(Debug, Clone, PartialEq)]
pub enum EditTarget {
    /// An existing sticky note or text edit.
    Existing(AnnotationId),
    /// A new text edit over `rect`, replacing `original_text`.
    New { rect: Rect, original_text: String },
}

/// State of a tool interaction. All points are in PDF-space.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolState {
    #[default]
    Idle,
    Drawing {
        tool: ToolKind,
        document_id: DocumentId,
        page_index: usize,
        start: Point,
        current: Point,
        /// Pen path so far.
        points: Vec<Point>,
    },
    Selecting {
        document_id: DocumentId,
        page_index: usize,
        start: Point,
        current: Point,
        /// Annotation being dragged, or `None` for a marquee.
        moving: Option<AnnotationId>,
    },
    EditingText {
        document_id: DocumentId,
        page_index: usize,
        target: EditTarget,
        rect: Rect,
        draft: String,
        original: String,
    },
}

impl ToolState {
    /// Page the gesture in flight belongs to.
    pub fn page(&self) -> Option<(&DocumentId, usize)> {
        match self {
            ToolState::Idle => None,
            ToolState::Drawing {
                document_id,
                page_index,
                ..
            }
            | ToolState::Selecting {
                document_id,
                page_index,
                ..
            }
            | ToolState::EditingText {
                document_id,
                page_index,
                ..
            } => Some((document_id, *page_index)),
        }
    }
}

/// Page context for a gesture.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub document_id: &'a DocumentId,
    pub view: PageView,
    /// Committed annotations on the page, bottom to top.
    pub annotations: &'a [&'a Annotation],
    /// Text layer of the page, if known.
    pub text_runs: &'a [TextRun],
    pub editable: bool,
}

/// A change requested by a finished gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Add {
        document_id: DocumentId,
        page_index: usize,
        kind: AnnotationKind,
    },
    Update {
        document_id: DocumentId,
        id: AnnotationId,
        update: AnnotationUpdate,
    },
}

/// Result of feeding an event to the tool machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Nothing changed.
    None,
    /// The ephemeral preview on a page changed.
    Preview { document_id: DocumentId, page_index: usize },
    /// A gesture finished and requests exactly one mutation.
    Commit(Mutation),
    /// Selection should change.
    Select(Option<AnnotationId>),
    /// The gesture in flight was discarded.
    Cancelled { document_id: DocumentId, page_index: usize },
}

/// Ephemeral gesture feedback for the renderer. PDF-space.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    /// The annotation the gesture would create.
    Annotation { page_index: usize, kind: AnnotationKind },
    /// Selection marquee.
    Marquee { page_index: usize, rect: Rect },
    /// An annotation being dragged.
    Move { page_index: usize, id: AnnotationId, delta: Vec2 },
    /// Text being typed.
    Text {
        page_index: usize,
        rect: Rect,
        text: String,
        font_size: f64,
    },
}

impl Preview {
    pub fn page_index(&self) -> usize {
        match self {
            Preview::Annotation { page_index, .. }
            | Preview::Marquee { page_index, .. }
            | Preview::Move { page_index, .. }
            | Preview::Text { page_index, .. } => *page_index,
        }
    }
}

/// Manages the current tool and its state.
#[derive(Debug, Clone)]
pub struct ToolManager {
    current_tool: ToolKind,
    state: ToolState,
    /// Styles applied to new annotations.
    pub styles: ToolStyles,
    /// Hit tolerance in screen pixels.
    hit_tolerance: f64,
    /// Smallest accepted gesture in screen pixels.
    min_gesture_size: f64,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ToolManager {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            current_tool: ToolKind::default(),
            state: ToolState::Idle,
            styles: config.styles.clone(),
            hit_tolerance: config.hit_tolerance,
            min_gesture_size: config.min_gesture_size,
        }
    }

    pub fn current_tool(&self) -> ToolKind {
        self.current_tool
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ToolState::Idle
    }

    /// Switch tools, discarding any gesture in flight.
    pub fn set_tool(&mut self, tool: ToolKind) -> ToolOutcome {
        let outcome = self.cancel();
        if self.current_tool != tool {
            log::debug!("Tool {:?} -> {tool:?}", self.current_tool);
            self.current_tool = tool;
        }
        outcome
    }

    /// Discard the gesture in flight.
    pub fn cancel(&mut self) -> ToolOutcome {
        match std::mem::take(&mut self.state) {
            ToolState::Idle => ToolOutcome::None,
            state => {
                let (document_id, page_index) = state
                    .page()
                    .map(|(d, p)| (d.clone(), p))
                    .unwrap_or_else(|| (DocumentId::from(""), 0));
                ToolOutcome::Cancelled {
                    document_id,
                    page_index,
                }
            }
        }
    }

    /// Handle a pointer event on a page.
    ///
    /// While a gesture is in flight `ctx` describes the gesture's page, which
    /// may differ from `input.page_index`.
    pub fn pointer(&mut self, input: PointerInput, ctx: &ToolContext<'_>) -> EngineResult<ToolOutcome> {
        let point = ctx.view.to_pdf(input.position);
        match input.kind {
            PointerKind::Down => self.pointer_down(point, input.page_index, ctx),
            PointerKind::Move => Ok(self.pointer_move(point, input.page_index)),
            PointerKind::Up => Ok(self.pointer_up(point, input.page_index, ctx)),
            PointerKind::DoubleClick => self.double_click(point, input.page_index, ctx),
        }
    }

    fn tolerance(&self, view: &PageView) -> f64 {
        self.hit_tolerance / view.zoom
    }

    fn pointer_down(&mut self, point: Point, page_index: usize, ctx: &ToolContext<'_>) -> EngineResult<ToolOutcome> {
        if !self.is_idle() {
            log::debug!("Ignoring pointer-down while {:?} is in flight", self.current_tool);
            return Ok(ToolOutcome::None);
        }
        let document_id = ctx.document_id.clone();
        match self.current_tool {
            ToolKind::Select => {
                let hit = topmost_hit(ctx.annotations, point, self.tolerance(&ctx.view));
                self.state = ToolState::Selecting {
                    document_id: document_id.clone(),
                    page_index,
                    start: point,
                    current: point,
                    moving: hit,
                };
                Ok(match hit {
                    Some(id) => ToolOutcome::Select(Some(id)),
                    None => ToolOutcome::Preview {
                        document_id,
                        page_index,
                    },
                })
            }
            ToolKind::TextEdit => {
                let target = self
                    .text_target(point, ctx)
                    .unwrap_or_else(|| self.new_text_target(point));
                self.begin_text_edit(target, page_index, ctx)
            }
            tool => {
                self.state = ToolState::Drawing {
                    tool,
                    document_id: document_id.clone(),
                    page_index,
                    start: point,
                    current: point,
                    points: vec![point],
                };
                Ok(ToolOutcome::Preview {
                    document_id,
                    page_index,
                })
            }
        }
    }

    fn pointer_move(&mut self, point: Point, event_page: usize) -> ToolOutcome {
        match &mut self.state {
            ToolState::Drawing {
                tool,
                document_id,
                page_index,
                current,
                points,
                ..
            } if *page_index == event_page => {
                *current = point;
                if *tool == ToolKind::Pen && points.last() != Some(&point) {
                    points.push(point);
                }
                ToolOutcome::Preview {
                    document_id: document_id.clone(),
                    page_index: *page_index,
                }
            }
            ToolState::Selecting {
                document_id,
                page_index,
                current,
                ..
            } if *page_index == event_page => {
                *current = point;
                ToolOutcome::Preview {
                    document_id: document_id.clone(),
                    page_index: *page_index,
                }
            }
            _ => ToolOutcome::None,
        }
    }

    fn pointer_up(&mut self, point: Point, event_page: usize, ctx: &ToolContext<'_>) -> ToolOutcome {
        // Moves on other pages were ignored; releasing there ends the gesture at its last point.
        if matches!(self.state, ToolState::Drawing { .. } | ToolState::Selecting { .. }) {
            self.pointer_move(point, event_page);
        }
        match std::mem::take(&mut self.state) {
            ToolState::Drawing {
                tool,
                document_id,
                page_index,
                start,
                current,
                points,
            } => match self.finish_drawing(tool, start, current, points, ctx) {
                Some(kind) => {
                    log::debug!("Committing {} on {document_id}#{page_index}", kind.name());
                    ToolOutcome::Commit(Mutation::Add {
                        document_id,
                        page_index,
                        kind,
                    })
                }
                None => {
                    log::debug!("Discarding degenerate {tool:?} gesture");
                    ToolOutcome::Cancelled {
                        document_id,
                        page_index,
                    }
                }
            },
            ToolState::Selecting {
                document_id,
                start,
                current,
                moving,
                ..
            } => {
                let delta = current - start;
                let dragged = delta.hypot() * ctx.view.zoom >= self.min_gesture_size;
                match moving {
                    Some(id) if dragged => {
                        match ctx.annotations.iter().find(|a| a.id == id) {
                            Some(annotation) => ToolOutcome::Commit(Mutation::Update {
                                document_id,
                                id,
                                update: annotation.translation_update(delta),
                            }),
                            None => {
                                log::warn!("Moved annotation {id} is no longer on the page");
                                ToolOutcome::Select(None)
                            }
                        }
                    }
                    Some(id) => ToolOutcome::Select(Some(id)),
                    None if dragged => {
                        let marquee = Rect::from_points(start, current);
                        ToolOutcome::Select(
                            ctx.annotations
                                .iter()
                                .rev()
                                .find(|a| a.intersects_rect(marquee))
                                .map(|a| a.id),
                        )
                    }
                    None => ToolOutcome::Select(None),
                }
            }
            state => {
                self.state = state;
                ToolOutcome::None
            }
        }
    }

    fn double_click(&mut self, point: Point, page_index: usize, ctx: &ToolContext<'_>) -> EngineResult<ToolOutcome> {
        if !self.is_idle() {
            return Ok(ToolOutcome::None);
        }
        match self.text_target(point, ctx) {
            Some(target) => self.begin_text_edit(target, page_index, ctx),
            None => Ok(ToolOutcome::None),
        }
    }

    /// The text-capable region under a point: an existing note or text edit, or a page text run.
    fn text_target(&self, point: Point, ctx: &ToolContext<'_>) -> Option<EditTarget> {
        let tolerance = self.tolerance(&ctx.view);
        let existing = ctx
            .annotations
            .iter()
            .rev()
            .find(|a| a.kind.editable_text().is_some() && a.hit_test(point, tolerance));
        if let Some(annotation) = existing {
            return Some(EditTarget::Existing(annotation.id));
        }
        ctx.text_runs
            .iter()
            .find(|run| run.rect.contains(point))
            .map(|run| EditTarget::New {
                rect: run.rect,
                original_text: run.text.clone(),
            })
    }

    fn new_text_target(&self, point: Point) -> EditTarget {
        let size = self.styles.font_size;
        EditTarget::New {
            rect: Rect::from_origin_size(point, Size::new(size * 10.0, size * 1.4)),
            original_text: String::new(),
        }
    }

    fn begin_text_edit(
        &mut self,
        target: EditTarget,
        page_index: usize,
        ctx: &ToolContext<'_>,
    ) -> EngineResult<ToolOutcome> {
        let (rect, original, needs_edit_access) = match &target {
            EditTarget::Existing(id) => {
                let Some(annotation) = ctx.annotations.iter().find(|a| a.id == *id) else {
                    return Ok(ToolOutcome::None);
                };
                let text = annotation.kind.editable_text().unwrap_or_default().to_string();
                let is_text_edit = matches!(annotation.kind, AnnotationKind::TextEdit(_));
                (annotation.bounds(), text, is_text_edit)
            }
            EditTarget::New { rect, original_text } => (*rect, original_text.clone(), true),
        };
        if needs_edit_access && !ctx.editable {
            return Err(EngineError::EditNotSupported(ctx.document_id.clone()));
        }
        log::debug!("Editing text on {}#{page_index}", ctx.document_id);
        self.state = ToolState::EditingText {
            document_id: ctx.document_id.clone(),
            page_index,
            target,
            rect,
            draft: original.clone(),
            original,
        };
        Ok(ToolOutcome::Preview {
            document_id: ctx.document_id.clone(),
            page_index,
        })
    }

    /// Handle a key press. Returns `None` if the tool machine did not consume the key.
    pub fn key(&mut self, event: &KeyEvent) -> Option<ToolOutcome> {
        if let ToolState::EditingText {
            document_id,
            page_index,
            draft,
            ..
        } = &mut self.state
        {
            let preview = ToolOutcome::Preview {
                document_id: document_id.clone(),
                page_index: *page_index,
            };
            return match &event.key {
                Key::Escape => Some(self.cancel()),
                Key::Enter if event.modifiers.shift => {
                    draft.push('\n');
                    Some(preview)
                }
                Key::Enter => Some(self.commit_text()),
                Key::Backspace => {
                    draft.pop();
                    Some(preview)
                }
                Key::Char(c) if !event.modifiers.command() => {
                    draft.push(*c);
                    Some(preview)
                }
                _ => Some(ToolOutcome::None),
            };
        }
        match event.key {
            Key::Escape if !self.is_idle() => Some(self.cancel()),
            _ => None,
        }
    }

    /// Focus left the page: commit a text edit, discard any other gesture.
    pub fn blur(&mut self) -> ToolOutcome {
        if matches!(self.state, ToolState::EditingText { .. }) {
            self.commit_text()
        } else {
            self.cancel()
        }
    }

    /// Replace the draft of the text edit in flight (e.g. from an IME or text field).
    pub fn set_draft(&mut self, text: impl Into<String>) -> ToolOutcome {
        match &mut self.state {
            ToolState::EditingText {
                document_id,
                page_index,
                draft,
                ..
            } => {
                *draft = text.into();
                ToolOutcome::Preview {
                    document_id: document_id.clone(),
                    page_index: *page_index,
                }
            }
            _ => ToolOutcome::None,
        }
    }

    fn commit_text(&mut self) -> ToolOutcome {
        let ToolState::EditingText {
            document_id,
            page_index,
            target,
            rect,
            draft,
            original,
        } = std::mem::take(&mut self.state)
        else {
            return ToolOutcome::None;
        };
        if draft == original {
            return ToolOutcome::Cancelled {
                document_id,
                page_index,
            };
        }
        let mutation = match target {
            EditTarget::Existing(id) => Mutation::Update {
                document_id,
                id,
                update: AnnotationUpdate::default().with_text(draft),
            },
            EditTarget::New { original_text, .. } => {
                let mut edit = TextEdit::new(
                    original_text,
                    rect,
                    self.styles.font_size,
                    self.styles.font_family.clone(),
                    self.styles.text_color,
                );
                edit.edited_text = draft;
                Mutation::Add {
                    document_id,
                    page_index,
                    kind: AnnotationKind::TextEdit(edit),
                }
            }
        };
        ToolOutcome::Commit(mutation)
    }

    /// Build the annotation for a finished drawing gesture, or `None` if it is degenerate.
    fn finish_drawing(
        &self,
        tool: ToolKind,
        start: Point,
        current: Point,
        points: Vec<Point>,
        ctx: &ToolContext<'_>,
    ) -> Option<AnnotationKind> {
        let min = self.min_gesture_size / ctx.view.zoom;
        let drag = Rect::from_points(start, current);
        match tool {
            ToolKind::Pen if points.len() < 2 => None,
            ToolKind::StickyNote | ToolKind::Pen => Some(self.build(tool, start, current, points)),
            _ if tool.is_markup() => {
                if drag.width().max(drag.height()) < min {
                    return None;
                }
                let markup = snap_to_text(drag, ctx.text_runs, self.markup_color(tool));
                if markup.rect.area() <= 0.0 {
                    return None;
                }
                Some(wrap_markup(tool, markup))
            }
            ToolKind::Line | ToolKind::Arrow => {
                ((current - start).hypot() >= min).then(|| self.build(tool, start, current, points))
            }
            _ => (drag.width() >= min && drag.height() >= min).then(|| self.build(tool, start, current, points)),
        }
    }

    fn markup_color(&self, tool: ToolKind) -> crate::annotation::SerializableColor {
        match tool {
            ToolKind::Underline => self.styles.underline_color,
            ToolKind::Strikeout => self.styles.strikeout_color,
            _ => self.styles.highlight_color,
        }
    }

    fn build(&self, tool: ToolKind, start: Point, current: Point, points: Vec<Point>) -> AnnotationKind {
        match tool {
            ToolKind::Pen => {
                AnnotationKind::PenStroke(PenStroke::new(points, self.styles.pen_width, self.styles.pen_color))
            }
            ToolKind::StickyNote => {
                AnnotationKind::StickyNote(StickyNote::new(start, String::new(), self.styles.note_color))
            }
            ToolKind::Highlight | ToolKind::Underline | ToolKind::Strikeout => wrap_markup(
                tool,
                TextMarkup::new(Rect::from_points(start, current), self.markup_color(tool)),
            ),
            _ => {
                let shape_kind = tool.shape_kind().unwrap_or(ShapeKind::Rectangle);
                AnnotationKind::Shape(ShapeMark::from_corners(
                    shape_kind,
                    start,
                    current,
                    self.styles.shape_color,
                    self.styles.shape_width,
                ))
            }
        }
    }

    /// Current ephemeral preview, if a gesture is in flight.
    pub fn preview(&self) -> Option<Preview> {
        match &self.state {
            ToolState::Idle => None,
            ToolState::Drawing {
                tool,
                page_index,
                start,
                current,
                points,
                ..
            } => Some(Preview::Annotation {
                page_index: *page_index,
                kind: self.build(*tool, *start, *current, points.clone()),
            }),
            ToolState::Selecting {
                page_index,
                start,
                current,
                moving,
                ..
            } => Some(match moving {
                Some(id) => Preview::Move {
                    page_index: *page_index,
                    id: *id,
                    delta: *current - *start,
                },
                None => Preview::Marquee {
                    page_index: *page_index,
                    rect: Rect::from_points(*start, *current),
                },
            }),
            ToolState::EditingText {
                page_index,
                rect,
                draft,
                ..
            } => Some(Preview::Text {
                page_index: *page_index,
                rect: *rect,
                text: draft.clone(),
                font_size: self.styles.font_size,
            }),
        }
    }
}

fn wrap_markup(tool: ToolKind, markup: TextMarkup) -> AnnotationKind {
    match tool {
        ToolKind::Underline => AnnotationKind::Underline(markup),
        ToolKind::Strikeout => AnnotationKind::Strikeout(markup),
        _ => AnnotationKind::Highlight(markup),
    }
}

/// Topmost annotation under a point.
fn topmost_hit(annotations: &[&Annotation], point: Point, tolerance: f64) -> Option<AnnotationId> {
    annotations
        .iter()
        .rev()
        .find(|a| a.hit_test(point, tolerance))
        .map(|a| a.id)
}

/// Snap a dragged rectangle to the text runs it crosses, capturing their text.
fn snap_to_text(drag: Rect, runs: &[TextRun], color: crate::annotation::SerializableColor) -> TextMarkup {
    let covered: Vec<&TextRun> = runs
        .iter()
        .filter(|run| run.rect.intersect(drag).area() > 0.0)
        .collect();
    let Some(first) = covered.first() else {
        return TextMarkup::new(drag, color);
    };
    let rect = covered.iter().fold(first.rect, |acc, run| acc.union(run.rect));
    let text = covered
        .iter()
        .map(|run| run.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    TextMarkup::new(rect, color).with_text(text)
}
