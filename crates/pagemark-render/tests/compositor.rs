use bytes::Bytes;
use kurbo::{PathEl, Point, Size};
use pagemark_core::{
    AnnotationKind, Command, CommandQueue, DocumentAccess, DocumentId, LoadedDocument, PointerInput, Session,
    ToolKind,
};
use pagemark_render::{Compositor, DrawCommand, Layer, PageDrawList, PageFrame, RenderResult, Renderer, render_all};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn open(session: &mut Session, name: &str, pages: usize) -> DocumentId {
    session.open(LoadedDocument {
        id: DocumentId::generate(),
        name: name.to_string(),
        bytes: Bytes::from_static(b"%PDF-1.7"),
        page_sizes: vec![Size::new(612.0, 792.0); pages],
        access: DocumentAccess::Editable,
    })
}

fn draw_stroke(session: &mut Session, page_index: usize, points: &[Point]) {
    session.set_tool(ToolKind::Pen);
    session.pointer_event(PointerInput::down(points[0], page_index)).unwrap();
    for p in &points[1..] {
        session.pointer_event(PointerInput::moved(*p, page_index)).unwrap();
    }
    let last = points[points.len() - 1];
    session.pointer_event(PointerInput::up(last, page_index)).unwrap();
}

/// The single committed stroke on a page: its screen points and width.
fn stroke_on(frames: &[PageFrame], page_index: usize) -> (Vec<Point>, f64) {
    let list = frames
        .iter()
        .find_map(|f| match f {
            PageFrame::Draw(list) if list.page_index == page_index => Some(list),
            _ => None,
        })
        .expect("page was not redrawn");
    let strokes: Vec<&DrawCommand> = list.layer(Layer::Annotations).collect();
    let [DrawCommand::Stroke { path, width, .. }] = strokes.as_slice() else {
        panic!("expected one stroke, got {strokes:?}");
    };
    let points = path
        .elements()
        .iter()
        .filter_map(|el| match el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => Some(*p),
            _ => None,
        })
        .collect();
    (points, *width)
}

#[test]
fn zooming_scales_committed_strokes_exactly() {
    init_logging();
    let mut session = Session::default();
    let doc = open(&mut session, "a.pdf", 3);
    let mut compositor = Compositor::attached(&session);
    assert_eq!(session.active().unwrap().zoom(), 1.0);

    draw_stroke(
        &mut session,
        0,
        &[Point::new(30.0, 40.0), Point::new(75.0, 90.0), Point::new(120.0, 60.0)],
    );
    let frames = compositor.render(&session, 0..3);
    let (at_one, width_one) = stroke_on(&frames, 0);
    assert_eq!(at_one.len(), 3);

    session.set_zoom(&doc, 2.0).unwrap();
    let frames = compositor.render(&session, 0..3);
    let (at_two, width_two) = stroke_on(&frames, 0);

    assert_eq!(at_two.len(), at_one.len());
    for (a, b) in at_one.iter().zip(&at_two) {
        assert_eq!(*b, Point::new(a.x * 2.0, a.y * 2.0));
    }
    assert_eq!(width_two, width_one * 2.0);

    // Stored geometry did not move.
    let stored = session.annotations().query_by_page(&doc, 0);
    let AnnotationKind::PenStroke(stroke) = &stored[0].kind else {
        panic!("expected a pen stroke");
    };
    assert_eq!(stroke.points[0], Point::new(30.0, 40.0));
}

#[test]
fn rotation_recomposes_without_touching_the_store() {
    init_logging();
    let mut session = Session::default();
    let doc = open(&mut session, "scan.pdf", 1);
    let mut compositor = Compositor::attached(&session);
    draw_stroke(&mut session, 0, &[Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
    compositor.render(&session, [0]);

    session.rotate(&doc, true).unwrap();
    assert!(compositor.is_dirty(&doc, 0));
    let frames = compositor.render(&session, [0]);
    let (points, _) = stroke_on(&frames, 0);
    // The page's top edge runs down the right side of the rotated surface.
    assert_eq!(points, vec![Point::new(792.0, 0.0), Point::new(792.0, 100.0)]);

    let stored = session.annotations().query_by_page(&doc, 0);
    let AnnotationKind::PenStroke(stroke) = &stored[0].kind else {
        panic!("expected a pen stroke");
    };
    assert_eq!(stroke.points, vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
}

#[test]
fn undo_clears_the_page_overlay() {
    init_logging();
    let mut session = Session::default();
    let doc = open(&mut session, "notes.pdf", 2);
    let mut compositor = Compositor::attached(&session);
    draw_stroke(&mut session, 1, &[Point::new(10.0, 10.0), Point::new(40.0, 40.0)]);
    let frames = compositor.render(&session, 0..2);
    assert!(frames.iter().any(|f| matches!(f, PageFrame::Draw(l) if l.page_index == 1)));

    session.undo();
    let frames = compositor.render(&session, 0..2);
    assert_eq!(frames.len(), 1);
    assert!(matches!(
        &frames[0],
        PageFrame::Clear { document_id, page_index: 1 } if *document_id == doc
    ));
}

#[test]
fn switching_documents_recomposes_the_new_active_pages() {
    init_logging();
    let mut session = Session::default();
    let first = open(&mut session, "first.pdf", 1);
    draw_stroke(&mut session, 0, &[Point::new(10.0, 10.0), Point::new(40.0, 40.0)]);
    let second = open(&mut session, "second.pdf", 1);
    let mut compositor = Compositor::attached(&session);

    let frames = compositor.render(&session, [0]);
    assert!(matches!(&frames[0], PageFrame::Clear { document_id, .. } if *document_id == second));

    session.set_active(&first);
    let frames = compositor.render(&session, [0]);
    assert!(matches!(&frames[0], PageFrame::Draw(list) if list.document_id == first));
}

/// Backend that records pages and asks to jump to each page it draws.
struct Recorder {
    drawn: Vec<usize>,
    queue: CommandQueue,
}

impl Renderer for Recorder {
    fn render_page(&mut self, list: &PageDrawList) -> RenderResult<()> {
        self.drawn.push(list.page_index);
        self.queue.push(Command::SetPage {
            document_id: list.document_id.clone(),
            page_index: list.page_index,
        });
        Ok(())
    }
}

#[test]
fn commands_raised_while_rendering_are_deferred() {
    init_logging();
    let mut session = Session::default();
    let doc = open(&mut session, "long.pdf", 5);
    let mut compositor = Compositor::attached(&session);
    draw_stroke(&mut session, 3, &[Point::new(10.0, 10.0), Point::new(40.0, 40.0)]);

    let lists: Vec<PageDrawList> = compositor
        .render(&session, 0..5)
        .into_iter()
        .filter_map(|f| match f {
            PageFrame::Draw(list) => Some(list),
            PageFrame::Clear { .. } => None,
        })
        .collect();
    let mut recorder = Recorder {
        drawn: Vec::new(),
        queue: session.commands(),
    };
    assert_eq!(render_all(&mut recorder, &lists).unwrap(), 1);
    assert_eq!(recorder.drawn, vec![3]);
    assert_eq!(session.active().unwrap().current_page(), 0);

    assert_eq!(session.run_deferred(), 1);
    assert_eq!(session.documents().get(&doc).unwrap().current_page(), 3);
}
