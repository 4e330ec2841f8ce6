//! Per-page draw lists.
//!
//! Geometry in a draw list is already in page-surface screen-space: the
//! compositor applies the page transform, so backends never see PDF units
//! except through a text command's own transform.

use kurbo::{Affine, BezPath, Rect, Size};
use pagemark_core::{DocumentId, Rotation};
use peniko::Color;

/// Draw layers, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// The externally rendered page raster.
    Page,
    /// Committed annotations.
    Annotations,
    /// The gesture in progress.
    Preview,
    /// Selection indicator.
    Selection,
}

/// A single drawing instruction.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Placeholder for the page raster. The host fills `rect` with the
    /// rendering library's output at `zoom` and `rotation`.
    PageRaster {
        page_index: usize,
        rect: Rect,
        zoom: f64,
        rotation: Rotation,
    },
    Fill {
        layer: Layer,
        path: BezPath,
        color: Color,
    },
    Stroke {
        layer: Layer,
        path: BezPath,
        color: Color,
        width: f64,
        dashed: bool,
    },
    /// Text laid out in PDF units; `transform` places the text box's
    /// top-left corner on the surface, including zoom and rotation.
    Text {
        layer: Layer,
        transform: Affine,
        text: String,
        font_size: f64,
        font_family: String,
        color: Color,
    },
}

impl DrawCommand {
    pub fn layer(&self) -> Layer {
        match self {
            DrawCommand::PageRaster { .. } => Layer::Page,
            DrawCommand::Fill { layer, .. }
            | DrawCommand::Stroke { layer, .. }
            | DrawCommand::Text { layer, .. } => *layer,
        }
    }
}

/// Ordered draw commands for one page surface.
#[derive(Debug, Clone)]
pub struct PageDrawList {
    pub document_id: DocumentId,
    pub page_index: usize,
    /// Surface size in screen pixels.
    pub size: Size,
    pub commands: Vec<DrawCommand>,
}

impl PageDrawList {
    pub fn new(document_id: DocumentId, page_index: usize, size: Size) -> Self {
        Self {
            document_id,
            page_index,
            size,
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands on one layer, in draw order.
    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(move |c| c.layer() == layer)
    }

    /// Whether layers appear in bottom-to-top order.
    pub fn is_layered(&self) -> bool {
        self.commands.windows(2).all(|w| w[0].layer() <= w[1].layer())
    }
}
