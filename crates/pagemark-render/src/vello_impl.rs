//! Vello-based renderer implementation.

use kurbo::{Affine, BezPath, Rect, Stroke};
use parley::{FontContext, LayoutContext};
use peniko::{Brush, Color, Fill};
use vello::Scene;

use crate::display_list::{DrawCommand, PageDrawList};
use crate::renderer::{RenderResult, Renderer, RendererError};

/// Dash length for dashed strokes, in screen pixels.
const DASH: f64 = 4.0;

/// Vello-based renderer for GPU-accelerated page overlays.
///
/// Each call to [`Renderer::render_page`] rebuilds the scene for one page
/// surface; take it with [`VelloRenderer::take_scene`] before the next page.
pub struct VelloRenderer {
    scene: Scene,
    /// Font context for text rendering (cached across frames).
    font_cx: FontContext,
    layout_cx: LayoutContext<Brush>,
    background: Color,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    /// Create a new Vello renderer. Text uses the system font collection.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
            background: Color::WHITE,
        }
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    fn fill(&mut self, path: &BezPath, color: Color) {
        self.scene.fill(Fill::NonZero, Affine::IDENTITY, color, None, path);
    }

    fn stroke(&mut self, path: &BezPath, color: Color, width: f64, dashed: bool) {
        let stroke = if dashed {
            Stroke::new(width).with_dashes(0.0, &[DASH, DASH])
        } else {
            Stroke::new(width)
        };
        self.scene.stroke(&stroke, Affine::IDENTITY, color, None, path);
    }

    /// Lay out and draw text with Parley.
    fn text(&mut self, transform: Affine, text: &str, font_size: f64, font_family: &str, color: Color) {
        use parley::StyleProperty;
        use parley::layout::PositionedLayoutItem;

        let brush = Brush::Solid(color);
        let mut builder = self.layout_cx.ranged_builder(&mut self.font_cx, text, 1.0, false);
        builder.push_default(StyleProperty::FontSize(font_size as f32));
        builder.push_default(StyleProperty::Brush(brush.clone()));
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Single(
            parley::FontFamily::Named(font_family.to_string().into()),
        )));
        let mut layout = builder.build(text);
        layout.break_all_lines(None);
        layout.align(None, parley::Alignment::Start, parley::AlignmentOptions::default());

        let mut glyph_count = 0;
        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let synthesis = run.synthesis();
                let glyph_xform = synthesis
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        vello::Glyph {
                            id: glyph.id,
                            x: gx,
                            y: gy,
                        }
                    })
                    .collect();
                glyph_count += glyphs.len();

                if !glyphs.is_empty() {
                    self.scene
                        .draw_glyphs(run.font())
                        .brush(&brush)
                        .hint(true)
                        .transform(transform)
                        .glyph_transform(glyph_xform)
                        .font_size(run.font_size())
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.into_iter());
                }
            }
        }

        // Font not found: mark where the text would be.
        if glyph_count == 0 {
            log::debug!("No glyphs for font family {font_family}");
            let width = text.chars().count() as f64 * font_size * 0.6;
            let rect = Rect::new(0.0, 0.0, width.max(font_size), font_size * 1.2);
            self.scene
                .fill(Fill::NonZero, transform, color.with_alpha(0.3), None, &rect);
        }
    }
}

impl Renderer for VelloRenderer {
    fn render_page(&mut self, list: &PageDrawList) -> RenderResult<()> {
        if list.size.width <= 0.0 || list.size.height <= 0.0 {
            return Err(RendererError::TargetUnavailable);
        }
        self.scene.reset();
        for command in &list.commands {
            match command {
                // The host composites the page raster; clear its area underneath.
                DrawCommand::PageRaster { rect, .. } => {
                    let background = self.background;
                    self.scene
                        .fill(Fill::NonZero, Affine::IDENTITY, background, None, rect);
                }
                DrawCommand::Fill { path, color, .. } => self.fill(path, *color),
                DrawCommand::Stroke {
                    path,
                    color,
                    width,
                    dashed,
                    ..
                } => self.stroke(path, *color, *width, *dashed),
                DrawCommand::Text {
                    transform,
                    text,
                    font_size,
                    font_family,
                    color,
                    ..
                } => self.text(*transform, text, *font_size, font_family, *color),
            }
        }
        Ok(())
    }

    fn background_color(&self) -> Color {
        self.background
    }
}
