//! Coordinate mapping between PDF-space and screen-space.
//!
//! PDF-space is the page's own unit system (the rendering library's
//! viewport at scale 1, y pointing down). Screen-space is the pixel space
//! of the rendered page surface at the document's zoom and rotation.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Page rotation in quarter turns (clockwise on screen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotation in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Parse a rotation from degrees. Accepts any multiple of 90, including negatives.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            _ => Some(Rotation::Deg270),
        }
    }

    /// Next quarter turn clockwise.
    pub fn clockwise(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// Next quarter turn counter-clockwise.
    pub fn counter_clockwise(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg270,
            Rotation::Deg90 => Rotation::Deg0,
            Rotation::Deg180 => Rotation::Deg90,
            Rotation::Deg270 => Rotation::Deg180,
        }
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg0,
            Rotation::Deg90 => Rotation::Deg270,
            Rotation::Deg180 => Rotation::Deg180,
            Rotation::Deg270 => Rotation::Deg90,
        }
    }

    /// Whether the page's width and height trade places on screen.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Exact rotation matrix around the origin.
    ///
    /// Built from 0/±1 coefficients so quarter turns do not pick up
    /// trigonometric rounding.
    pub fn matrix(self) -> Affine {
        match self {
            Rotation::Deg0 => Affine::IDENTITY,
            // (x, y) -> (-y, x)
            Rotation::Deg90 => Affine::new([0.0, 1.0, -1.0, 0.0, 0.0, 0.0]),
            // (x, y) -> (-x, -y)
            Rotation::Deg180 => Affine::new([-1.0, 0.0, 0.0, -1.0, 0.0, 0.0]),
            // (x, y) -> (y, -x)
            Rotation::Deg270 => Affine::new([0.0, -1.0, 1.0, 0.0, 0.0, 0.0]),
        }
    }
}

/// Map a PDF-space point to screen-space.
///
/// Rotation is applied around the origin, then the result is scaled by `zoom`.
/// `zoom` must be positive.
pub fn to_screen(pdf_point: Point, zoom: f64, rotation: Rotation) -> Point {
    let rotated = rotation.matrix() * pdf_point;
    Point::new(rotated.x * zoom, rotated.y * zoom)
}

/// Map a screen-space point back to PDF-space. Inverse of [`to_screen`].
pub fn to_pdf(screen_point: Point, zoom: f64, rotation: Rotation) -> Point {
    let unscaled = Point::new(screen_point.x / zoom, screen_point.y / zoom);
    rotation.inverse().matrix() * unscaled
}

/// The view of a single page: zoom, rotation and intrinsic page size.
///
/// Unlike the bare [`to_screen`] mapping, a `PageView` translates the rotated
/// page back into the positive quadrant so the page surface starts at (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    /// Zoom factor (1.0 = one screen pixel per PDF unit).
    pub zoom: f64,
    /// Page rotation.
    pub rotation: Rotation,
    /// Intrinsic page size in PDF units.
    pub page_size: Size,
}

impl PageView {
    /// Create a page view.
    pub fn new(zoom: f64, rotation: Rotation, page_size: Size) -> Self {
        Self {
            zoom,
            rotation,
            page_size,
        }
    }

    /// Translation that moves the rotated, scaled page to start at the origin.
    fn origin_offset(&self) -> Vec2 {
        let bounds = self.rotate_scale().transform_rect_bbox(self.page_rect());
        Vec2::new(-bounds.x0, -bounds.y0)
    }

    fn rotate_scale(&self) -> Affine {
        Affine::scale(self.zoom) * self.rotation.matrix()
    }

    /// Page bounds in PDF-space.
    pub fn page_rect(&self) -> Rect {
        Rect::from_origin_size(Point::ORIGIN, self.page_size)
    }

    /// Transform from PDF-space to page-surface screen-space.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin_offset()) * self.rotate_scale()
    }

    /// Transform from page-surface screen-space to PDF-space.
    pub fn inverse_transform(&self) -> Affine {
        self.rotation.inverse().matrix()
            * Affine::scale(1.0 / self.zoom)
            * Affine::translate(-self.origin_offset())
    }

    /// Convert a PDF-space point to the page surface.
    pub fn to_screen(&self, pdf_point: Point) -> Point {
        let offset = self.origin_offset();
        to_screen(pdf_point, self.zoom, self.rotation) + offset
    }

    /// Convert a page-surface point to PDF-space.
    pub fn to_pdf(&self, screen_point: Point) -> Point {
        let offset = self.origin_offset();
        to_pdf(screen_point - offset, self.zoom, self.rotation)
    }

    /// Size of the rendered page surface.
    pub fn screen_size(&self) -> Size {
        let size = if self.rotation.swaps_axes() {
            Size::new(self.page_size.height, self.page_size.width)
        } else {
            self.page_size
        };
        Size::new(size.width * self.zoom, size.height * self.zoom)
    }

    /// Map a PDF-space rectangle to its screen-space bounding box.
    pub fn rect_to_screen(&self, rect: Rect) -> Rect {
        self.transform().transform_rect_bbox(rect)
    }
}

/// Zoom that fits the page width into the viewport, leaving `padding` on each side.
pub fn fit_width_zoom(page_size: Size, rotation: Rotation, viewport_width: f64, padding: f64) -> f64 {
    let page_width = if rotation.swaps_axes() {
        page_size.height
    } else {
        page_size.width
    };
    if page_width <= 0.0 {
        return 1.0;
    }
    (viewport_width - padding * 2.0).max(1.0) / page_width
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROTATIONS: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    fn assert_close(a: Point, b: Point) {
        let scale = b.x.abs().max(b.y.abs()).max(1.0);
        assert!((a.x - b.x).abs() <= 1e-6 * scale, "{a:?} != {b:?}");
        assert!((a.y - b.y).abs() <= 1e-6 * scale, "{a:?} != {b:?}");
    }

    #[test]
    fn test_roundtrip_all_rotations() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(123.5, 456.25),
            Point::new(-10.0, 3.0),
            Point::new(611.999, 791.001),
        ];
        for rotation in ROTATIONS {
            for zoom in [0.1, 0.5, 1.0, 1.7, 2.0, 4.0] {
                for p in points {
                    let back = to_pdf(to_screen(p, zoom, rotation), zoom, rotation);
                    assert_close(back, p);
                }
            }
        }
    }

    #[test]
    fn test_zoom_scales_linearly() {
        let p = Point::new(10.0, 20.0);
        assert_eq!(to_screen(p, 1.0, Rotation::Deg0), Point::new(10.0, 20.0));
        assert_eq!(to_screen(p, 2.0, Rotation::Deg0), Point::new(20.0, 40.0));
    }

    #[test]
    fn test_quarter_turn_is_exact() {
        let p = Point::new(10.0, 20.0);
        assert_eq!(to_screen(p, 1.0, Rotation::Deg90), Point::new(-20.0, 10.0));
        assert_eq!(to_screen(p, 1.0, Rotation::Deg180), Point::new(-10.0, -20.0));
        assert_eq!(to_screen(p, 1.0, Rotation::Deg270), Point::new(20.0, -10.0));
    }

    #[test]
    fn test_rotation_degrees() {
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Deg270));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(45), None);
        for rotation in ROTATIONS {
            assert_eq!(rotation.clockwise().counter_clockwise(), rotation);
            assert_eq!(Rotation::from_degrees(rotation.degrees() as i32), Some(rotation));
        }
    }

    #[test]
    fn test_page_view_stays_in_positive_quadrant() {
        let size = Size::new(600.0, 800.0);
        for rotation in ROTATIONS {
            let view = PageView::new(1.5, rotation, size);
            let bounds = view.rect_to_screen(view.page_rect());
            assert!(bounds.x0.abs() < 1e-9 && bounds.y0.abs() < 1e-9, "{rotation:?}: {bounds:?}");
            let screen = view.screen_size();
            assert!((bounds.width() - screen.width).abs() < 1e-9);
            assert!((bounds.height() - screen.height).abs() < 1e-9);
        }
    }

    #[test]
    fn test_page_view_roundtrip() {
        let size = Size::new(612.0, 792.0);
        let p = Point::new(100.0, 250.0);
        for rotation in ROTATIONS {
            let view = PageView::new(2.0, rotation, size);
            assert_close(view.to_pdf(view.to_screen(p)), p);
            assert_close(view.inverse_transform() * (view.transform() * p), p);
            assert_close(view.transform() * p, view.to_screen(p));
        }
    }

    #[test]
    fn test_page_view_rotated_corner() {
        let view = PageView::new(1.0, Rotation::Deg90, Size::new(600.0, 800.0));
        // Top-left of the page lands at the top-right of the rotated surface.
        assert_close(view.to_screen(Point::ORIGIN), Point::new(800.0, 0.0));
        assert_eq!(view.screen_size(), Size::new(800.0, 600.0));
    }

    #[test]
    fn test_fit_width_zoom() {
        let zoom = fit_width_zoom(Size::new(600.0, 800.0), Rotation::Deg0, 1240.0, 20.0);
        assert!((zoom - 2.0).abs() < f64::EPSILON);
        let rotated = fit_width_zoom(Size::new(600.0, 800.0), Rotation::Deg90, 820.0, 10.0);
        assert!((rotated - 1.0).abs() < f64::EPSILON);
    }
}
