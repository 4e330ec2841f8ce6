mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{TestEditor, TestRenderer, block_on, encrypted_pdf, init_logging, pdf};
use kurbo::{Point, Rect};
use pagemark_core::annotation::{SerializableColor, TextMarkup};
use pagemark_core::backend::PdfRenderer;
use pagemark_core::{
    AnnotationKind, EngineError, EngineEvent, Key, KeyEvent, PointerInput, Session, TaskKind, ToolKind,
    load_document,
};

fn open(session: &mut Session, renderer: &TestRenderer, pages: usize, name: &str) -> pagemark_core::DocumentId {
    let loaded = block_on(load_document(renderer, &TestEditor, pdf(pages), name)).unwrap();
    session.open(loaded)
}

#[test]
fn annotate_undo_redo_through_gestures() {
    init_logging();
    let renderer = TestRenderer::default();
    let mut session = Session::default();
    let doc = open(&mut session, &renderer, 3, "contract.pdf");
    session.set_zoom(&doc, 2.0).unwrap();

    session.set_tool(ToolKind::Pen);
    session.pointer_event(PointerInput::down(Point::new(40.0, 40.0), 0)).unwrap();
    session.pointer_event(PointerInput::moved(Point::new(120.0, 60.0), 0)).unwrap();
    session.pointer_event(PointerInput::moved(Point::new(180.0, 40.0), 0)).unwrap();
    session.pointer_event(PointerInput::up(Point::new(180.0, 40.0), 0)).unwrap();

    session.set_tool(ToolKind::Arrow);
    session.pointer_event(PointerInput::down(Point::new(150.0, 150.0), 1)).unwrap();
    session.pointer_event(PointerInput::up(Point::new(300.0, 150.0), 1)).unwrap();

    assert_eq!(session.history().undo_len(), 2);
    let pen = session.annotations().query_by_page(&doc, 0);
    let AnnotationKind::PenStroke(stroke) = &pen[0].kind else {
        panic!("expected a pen stroke");
    };
    assert_eq!(stroke.points[0], Point::new(20.0, 20.0));
    assert_eq!(stroke.points.len(), 3);
    assert_eq!(stroke.points[2], Point::new(90.0, 20.0));

    assert!(session.key_event(&KeyEvent::ctrl(Key::Char('z'))).unwrap());
    assert!(session.annotations().query_by_page(&doc, 1).is_empty());
    assert!(session.key_event(&KeyEvent::ctrl(Key::Char('y'))).unwrap());
    assert_eq!(session.annotations().query_by_page(&doc, 1).len(), 1);

    // A new edit after undo clears the redo stack.
    session.undo();
    session
        .add_annotation(
            &doc,
            2,
            AnnotationKind::Highlight(TextMarkup::new(Rect::new(0.0, 0.0, 40.0, 12.0), SerializableColor::yellow())),
        )
        .unwrap();
    assert!(!session.can_redo());
}

#[test]
fn encrypted_document_opens_view_only() {
    init_logging();
    let renderer = TestRenderer::default();
    let loaded = block_on(load_document(&renderer, &TestEditor, encrypted_pdf(2), "secret.pdf")).unwrap();
    assert!(matches!(loaded.restriction(), Some(EngineError::EncryptedDocument { .. })));

    let mut session = Session::default();
    let doc = session.open(loaded);
    session.set_tool(ToolKind::TextEdit);
    let result = session.pointer_event(PointerInput::down(Point::new(80.0, 80.0), 0));
    assert_eq!(result, Err(EngineError::EditNotSupported(doc.clone())));
    assert!(matches!(session.snapshot_for_edit(&doc), Err(EngineError::EditNotSupported(_))));

    session.set_tool(ToolKind::Highlight);
    session.pointer_event(PointerInput::down(Point::new(10.0, 10.0), 0)).unwrap();
    session.pointer_event(PointerInput::up(Point::new(80.0, 30.0), 0)).unwrap();
    assert_eq!(session.annotations().len(), 1);
}

#[test]
fn closing_cascades_to_annotations_history_and_tasks() {
    init_logging();
    let renderer = TestRenderer::default();
    let mut session = Session::default();
    let a = open(&mut session, &renderer, 2, "a.pdf");
    let b = open(&mut session, &renderer, 2, "b.pdf");
    let c = open(&mut session, &renderer, 2, "c.pdf");

    let markup = || AnnotationKind::Highlight(TextMarkup::new(Rect::new(5.0, 5.0, 50.0, 15.0), SerializableColor::yellow()));
    session.add_annotation(&b, 0, markup()).unwrap();
    session.add_annotation(&c, 1, markup()).unwrap();

    session.set_active(&b);
    let ticket = session.begin_task(&b, TaskKind::TextLayer, Some(0)).unwrap();
    let runs = block_on(renderer.text_content(&b, 0)).unwrap();

    session.close(&b).unwrap();
    assert_eq!(session.active_id(), Some(&a));
    assert!(session.annotations().for_document(&b).is_empty());
    assert_eq!(session.history().undo_len(), 1);

    // The text layer arrives after the close and is dropped.
    assert!(ticket.is_cancelled());
    assert!(!session.complete_text_layer(&ticket, runs));
    assert!(session.text_layer(&b, 0).is_none());

    session.close(&a).unwrap();
    assert_eq!(session.active_id(), Some(&c));
    session.close(&c).unwrap();
    assert_eq!(session.active_id(), None);
    assert!(!session.can_undo());
}

#[test]
fn highlight_snaps_to_loaded_text_layer() {
    init_logging();
    let renderer = TestRenderer::default();
    let mut session = Session::default();
    let doc = open(&mut session, &renderer, 1, "notes.pdf");

    let ticket = session.begin_task(&doc, TaskKind::TextLayer, Some(0)).unwrap();
    let runs = block_on(renderer.text_content(&doc, 0)).unwrap();
    assert!(session.complete_text_layer(&ticket, runs));

    session.set_tool(ToolKind::Highlight);
    session.pointer_event(PointerInput::down(Point::new(100.0, 75.0), 0)).unwrap();
    session.pointer_event(PointerInput::up(Point::new(160.0, 85.0), 0)).unwrap();

    let page = session.annotations().query_by_page(&doc, 0);
    let AnnotationKind::Highlight(markup) = &page[0].kind else {
        panic!("expected a highlight");
    };
    assert_eq!(markup.rect, TestRenderer::run(0).rect);
    assert_eq!(markup.text.as_deref(), Some("Heading 1"));
}

#[test]
fn events_arrive_in_order() {
    init_logging();
    let renderer = TestRenderer::default();
    let mut session = Session::default();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    session.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    let doc = open(&mut session, &renderer, 1, "a.pdf");
    session
        .add_annotation(
            &doc,
            0,
            AnnotationKind::Highlight(TextMarkup::new(Rect::new(0.0, 0.0, 10.0, 10.0), SerializableColor::yellow())),
        )
        .unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            EngineEvent::DocumentsChanged,
            EngineEvent::ActiveDocumentChanged { id: Some(doc.clone()) },
            EngineEvent::AnnotationsChanged {
                document_id: doc.clone(),
                page_index: 0
            },
            EngineEvent::HistoryChanged {
                can_undo: true,
                can_redo: false
            },
        ]
    );
}

#[test]
fn closing_releases_the_renderer_copy() {
    init_logging();
    let renderer = TestRenderer::default();
    let mut session = Session::default();
    let a = open(&mut session, &renderer, 1, "a.pdf");
    let b = open(&mut session, &renderer, 3, "b.pdf");
    assert_eq!(renderer.loaded_count(), 2);

    session.close_and_unload(&b, &renderer).unwrap();
    assert_eq!(renderer.pages_of(&b), None);
    assert_eq!(renderer.pages_of(&a), Some(1));
    assert_eq!(
        session.close_and_unload(&b, &renderer),
        Err(EngineError::UnknownDocument(b.clone()))
    );
    assert_eq!(renderer.loaded_count(), 1);
}
