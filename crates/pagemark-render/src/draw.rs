//! Variant-specific draw routines.
//!
//! Each routine builds its geometry in PDF-space and places it with the
//! page transform, so zoom and rotation never leak into stored annotations.

use kurbo::{Affine, BezPath, Ellipse, Line, Point, Rect, Shape as _};
use pagemark_core::annotation::{
    PenStroke, SerializableColor, ShapeKind, ShapeMark, StickyNote, TextEdit, TextMarkup,
};
use pagemark_core::{AnnotationKind, PageView};
use peniko::Color;

use crate::display_list::{DrawCommand, Layer, PageDrawList};

const TOLERANCE: f64 = 0.1;
/// Minimum line width for underlines and strikeouts, in PDF units.
const MARKUP_LINE_WIDTH: f64 = 1.0;
/// Selection outline distance from the annotation bounds, in screen pixels.
const SELECTION_PADDING: f64 = 3.0;

fn color(c: SerializableColor) -> Color {
    c.into()
}

fn rect_path(rect: Rect) -> BezPath {
    rect.to_path(TOLERANCE)
}

fn segment_path(a: Point, b: Point) -> BezPath {
    Line::new(a, b).to_path(TOLERANCE)
}

fn fill(out: &mut PageDrawList, layer: Layer, transform: Affine, path: BezPath, color: Color) {
    out.push(DrawCommand::Fill {
        layer,
        path: transform * path,
        color,
    });
}

fn stroke(out: &mut PageDrawList, layer: Layer, view: &PageView, path: BezPath, color: Color, width: f64) {
    out.push(DrawCommand::Stroke {
        layer,
        path: view.transform() * path,
        color,
        width: width * view.zoom,
        dashed: false,
    });
}

/// Draw one annotation onto a page.
pub fn draw_annotation(kind: &AnnotationKind, view: &PageView, layer: Layer, out: &mut PageDrawList) {
    match kind {
        AnnotationKind::Highlight(markup) => draw_highlight(markup, view, layer, out),
        AnnotationKind::Underline(markup) => {
            let (a, b) = markup.underline();
            draw_markup_line(markup, a, b, view, layer, out);
        }
        AnnotationKind::Strikeout(markup) => {
            let (a, b) = markup.strikeout();
            draw_markup_line(markup, a, b, view, layer, out);
        }
        AnnotationKind::PenStroke(pen) => draw_pen(pen, view, layer, out),
        AnnotationKind::Shape(shape) => draw_shape(shape, view, layer, out),
        AnnotationKind::StickyNote(note) => draw_note(note, view, layer, out),
        AnnotationKind::TextEdit(edit) => draw_text_edit(edit, view, layer, out),
    }
}

fn draw_highlight(markup: &TextMarkup, view: &PageView, layer: Layer, out: &mut PageDrawList) {
    fill(out, layer, view.transform(), rect_path(markup.rect), color(markup.color));
}

fn draw_markup_line(markup: &TextMarkup, a: Point, b: Point, view: &PageView, layer: Layer, out: &mut PageDrawList) {
    let width = (markup.rect.height() * 0.08).max(MARKUP_LINE_WIDTH);
    stroke(out, layer, view, segment_path(a, b), color(markup.color), width);
}

fn draw_pen(pen: &PenStroke, view: &PageView, layer: Layer, out: &mut PageDrawList) {
    match pen.points.as_slice() {
        [] => {}
        // A tap leaves a dot.
        [point] => {
            let radius = pen.stroke_width / 2.0;
            let dot = Ellipse::new(*point, (radius, radius), 0.0).to_path(TOLERANCE);
            fill(out, layer, view.transform(), dot, color(pen.color));
        }
        _ => stroke(out, layer, view, pen.to_path(), color(pen.color), pen.stroke_width),
    }
}

fn draw_shape(shape: &ShapeMark, view: &PageView, layer: Layer, out: &mut PageDrawList) {
    let rect = shape.rect.abs();
    let path = match shape.shape_kind {
        ShapeKind::Rectangle => rect_path(rect),
        ShapeKind::Circle => Ellipse::from_rect(rect).to_path(TOLERANCE),
        ShapeKind::Line => segment_path(shape.start(), shape.end()),
        ShapeKind::Arrow => {
            let mut path = segment_path(shape.start(), shape.end());
            if let Some((left, right)) = shape.arrow_head() {
                path.move_to(left);
                path.line_to(shape.end());
                path.line_to(right);
            }
            path
        }
    };
    if shape.filled && !shape.shape_kind.is_linear() {
        fill(out, layer, view.transform(), path.clone(), color(shape.color));
    }
    stroke(out, layer, view, path, color(shape.color), shape.stroke_width);
}

fn draw_note(note: &StickyNote, view: &PageView, layer: Layer, out: &mut PageDrawList) {
    let icon = note.icon_rect();
    fill(out, layer, view.transform(), rect_path(icon), color(note.color));
    stroke(out, layer, view, rect_path(icon), Color::from_rgba8(0, 0, 0, 90), 1.0);

    // Text lines on the note icon.
    let inset = icon.width() * 0.2;
    let mut lines = BezPath::new();
    for i in 1..=3 {
        let y = icon.y0 + icon.height() * f64::from(i) / 4.0;
        lines.move_to((icon.x0 + inset, y));
        lines.line_to((icon.x1 - inset, y));
    }
    stroke(out, layer, view, lines, Color::from_rgba8(0, 0, 0, 120), 1.0);
}

fn draw_text_edit(edit: &TextEdit, view: &PageView, layer: Layer, out: &mut PageDrawList) {
    // Cover the original page text before drawing the replacement.
    fill(out, layer, view.transform(), rect_path(edit.rect), Color::WHITE);
    draw_text(
        out,
        layer,
        view,
        edit.rect.origin(),
        &edit.edited_text,
        edit.font_size,
        &edit.font_family,
        color(edit.color),
    );
}

#[allow(clippy::too_many_arguments)]
fn draw_text(
    out: &mut PageDrawList,
    layer: Layer,
    view: &PageView,
    origin: Point,
    text: &str,
    font_size: f64,
    font_family: &str,
    color: Color,
) {
    if text.is_empty() {
        return;
    }
    out.push(DrawCommand::Text {
        layer,
        transform: view.transform() * Affine::translate(origin.to_vec2()),
        text: text.to_string(),
        font_size,
        font_family: font_family.to_string(),
        color,
    });
}

/// Draw a marquee rectangle given in PDF-space.
pub fn draw_marquee(rect: Rect, view: &PageView, accent: Color, out: &mut PageDrawList) {
    let screen = view.rect_to_screen(rect.abs());
    out.push(DrawCommand::Fill {
        layer: Layer::Preview,
        path: rect_path(screen),
        color: accent.with_alpha(0.1),
    });
    out.push(DrawCommand::Stroke {
        layer: Layer::Preview,
        path: rect_path(screen),
        color: accent,
        width: 1.0,
        dashed: true,
    });
}

/// Draw the text box of an edit in progress.
#[allow(clippy::too_many_arguments)]
pub fn draw_draft_text(
    rect: Rect,
    text: &str,
    font_size: f64,
    font_family: &str,
    text_color: Color,
    accent: Color,
    view: &PageView,
    out: &mut PageDrawList,
) {
    fill(out, Layer::Preview, view.transform(), rect_path(rect), Color::WHITE);
    draw_text(out, Layer::Preview, view, rect.origin(), text, font_size, font_family, text_color);
    out.push(DrawCommand::Stroke {
        layer: Layer::Preview,
        path: rect_path(view.rect_to_screen(rect)),
        color: accent,
        width: 1.0,
        dashed: true,
    });
}

/// Draw the selection outline around annotation bounds given in PDF-space.
///
/// The outline keeps a constant screen width at every zoom.
pub fn draw_selection(bounds: Rect, view: &PageView, accent: Color, out: &mut PageDrawList) {
    let screen = view.rect_to_screen(bounds).inflate(SELECTION_PADDING, SELECTION_PADDING);
    out.push(DrawCommand::Stroke {
        layer: Layer::Selection,
        path: rect_path(screen),
        color: accent,
        width: 1.5,
        dashed: true,
    });
}
