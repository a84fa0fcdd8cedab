//! Raster canvas backed by a tiny-skia pixmap.
//!
//! All drawing happens in the canvas' own pixel space. Callers convert their
//! coordinates before drawing; the canvas knows nothing about annotations.

use image::RgbaImage;
use tiny_skia::{
    ColorU8, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PremultipliedColorU8,
    Rect, Stroke, Transform,
};

use crate::error::{RasterError, Result};

/// Straight (non-premultiplied) RGBA color.
pub type Rgba = [u8; 4];

/// Thinnest stroke that still produces visible coverage.
pub const MIN_STROKE_WIDTH: f32 = 0.5;

/// Arrow head length as a multiple of the stroke width.
pub const ARROW_HEAD_RATIO: f32 = 4.0;

/// Lower bound for the arrow head length in pixels.
pub const MIN_ARROW_HEAD: f32 = 8.0;

/// Half-angle between the shaft and each head line.
const ARROW_HEAD_ANGLE: f32 = std::f32::consts::PI / 6.0;

/// Stroke parameters for outline primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f32,
}

impl StrokeStyle {
    pub fn new(color: Rgba, width: f32) -> Self {
        Self { color, width }
    }

    fn paint(&self) -> Paint<'static> {
        paint_for(self.color)
    }

    fn stroke(&self) -> Stroke {
        Stroke {
            width: self.width.max(MIN_STROKE_WIDTH),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        }
    }
}

fn paint_for(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

/// An RGBA drawing surface.
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    /// Create a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(RasterError::InvalidSize { width, height })?;
        Ok(Self { pixmap })
    }

    /// Create a canvas holding a copy of `image`.
    pub fn from_rgba_image(image: &RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let mut canvas = Self::new(width, height)?;
        for (dst, src) in canvas.pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        Ok(canvas)
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Convert back to a straight-alpha `RgbaImage`.
    pub fn into_rgba_image(self) -> Result<RgbaImage> {
        let (width, height) = (self.width(), self.height());
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(width, height, data).ok_or(RasterError::BufferMismatch { width, height })
    }

    /// Read one pixel as straight RGBA.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Stroke an open polyline. A single point (or a zero-length path) becomes a dot.
    pub fn stroke_polyline(&mut self, points: &[(f32, f32)], style: &StrokeStyle) {
        let Some(&first) = points.first() else {
            return;
        };
        if points.iter().all(|&p| p == first) {
            self.fill_dot(first, style.width / 2.0, style.color);
            return;
        }

        let mut pb = PathBuilder::new();
        pb.move_to(first.0, first.1);
        for &(x, y) in &points[1..] {
            pb.line_to(x, y);
        }
        self.stroke(pb.finish(), style);
    }

    /// Stroke an arrow from `tail` to `head` with two angled head lines.
    pub fn stroke_arrow(&mut self, tail: (f32, f32), head: (f32, f32), style: &StrokeStyle) {
        let head_size = (style.width * ARROW_HEAD_RATIO).max(MIN_ARROW_HEAD);
        let Some((wing1, wing2)) = arrow_head_points(tail, head, head_size) else {
            self.fill_dot(head, style.width / 2.0, style.color);
            return;
        };

        let mut pb = PathBuilder::new();
        pb.move_to(tail.0, tail.1);
        pb.line_to(head.0, head.1);
        pb.move_to(wing1.0, wing1.1);
        pb.line_to(head.0, head.1);
        pb.line_to(wing2.0, wing2.1);
        self.stroke(pb.finish(), style);
    }

    /// Stroke an axis-aligned rectangle outline.
    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, style: &StrokeStyle) {
        let mut pb = PathBuilder::new();
        pb.move_to(x, y);
        pb.line_to(x + width, y);
        pb.line_to(x + width, y + height);
        pb.line_to(x, y + height);
        pb.close();
        self.stroke(pb.finish(), style);
    }

    /// Stroke the ellipse inscribed in the given rectangle.
    pub fn stroke_ellipse(&mut self, x: f32, y: f32, width: f32, height: f32, style: &StrokeStyle) {
        match Rect::from_xywh(x, y, width, height).and_then(PathBuilder::from_oval) {
            Some(path) => self.stroke(Some(path), style),
            // Degenerate ovals collapse to the line they span
            None => self.stroke_polyline(&[(x, y), (x + width, y + height)], style),
        }
    }

    /// Fill a solid circle.
    pub fn fill_dot(&mut self, center: (f32, f32), radius: f32, color: Rgba) {
        let radius = radius.max(MIN_STROKE_WIDTH);
        if let Some(path) = PathBuilder::from_circle(center.0, center.1, radius) {
            self.pixmap.fill_path(
                &path,
                &paint_for(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    /// Fill an axis-aligned rectangle.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        if let Some(rect) = Rect::from_xywh(x, y, width, height) {
            self.pixmap
                .fill_rect(rect, &paint_for(color), Transform::identity(), None);
        }
    }

    /// Source-over blend `color` into one pixel with the given coverage (0..1).
    ///
    /// Out-of-bounds coordinates are ignored.
    pub fn blend_coverage(&mut self, x: i32, y: i32, color: Rgba, coverage: f32) {
        if x < 0 || y < 0 || coverage <= 0.0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.width() || y >= self.height() {
            return;
        }
        let idx = (y * self.width() + x) as usize;
        let dst = self.pixmap.pixels()[idx];

        let src_a = (color[3] as f32 / 255.0) * coverage.min(1.0);
        let inv = 1.0 - src_a;
        let out_a = src_a * 255.0 + dst.alpha() as f32 * inv;
        let channel = |src: u8, dst: u8| -> u8 {
            let v = src as f32 * src_a + dst as f32 * inv;
            v.round().min(out_a.round()).clamp(0.0, 255.0) as u8
        };

        let blended = PremultipliedColorU8::from_rgba(
            channel(color[0], dst.red()),
            channel(color[1], dst.green()),
            channel(color[2], dst.blue()),
            out_a.round().clamp(0.0, 255.0) as u8,
        );
        if let Some(px) = blended {
            self.pixmap.pixels_mut()[idx] = px;
        }
    }

    fn stroke(&mut self, path: Option<Path>, style: &StrokeStyle) {
        let Some(path) = path else {
            log::trace!("Skipping empty path");
            return;
        };
        self.pixmap.stroke_path(
            &path,
            &style.paint(),
            &style.stroke(),
            Transform::identity(),
            None,
        );
    }
}

/// Compute the two wing end points of an arrow head at `head`.
///
/// Returns None when the shaft has no length (direction undefined).
pub fn arrow_head_points(
    tail: (f32, f32),
    head: (f32, f32),
    head_size: f32,
) -> Option<((f32, f32), (f32, f32))> {
    let dx = head.0 - tail.0;
    let dy = head.1 - tail.1;
    if (dx * dx + dy * dy).sqrt() < f32::EPSILON {
        return None;
    }
    let angle = dy.atan2(dx);
    let wing = |a: f32| (head.0 - head_size * a.cos(), head.1 - head_size * a.sin());
    Some((wing(angle - ARROW_HEAD_ANGLE), wing(angle + ARROW_HEAD_ANGLE)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = [255, 0, 0, 255];

    #[test]
    fn test_rgba_image_roundtrip_preserves_pixels() {
        let mut img = RgbaImage::new(4, 3);
        img.put_pixel(1, 2, image::Rgba([10, 20, 30, 255]));
        let canvas = Canvas::from_rgba_image(&img).unwrap();
        let out = canvas.into_rgba_image().unwrap();
        assert_eq!(out.dimensions(), (4, 3));
        assert_eq!(out.get_pixel(1, 2).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_zero_size_canvas_is_rejected() {
        assert!(matches!(
            Canvas::new(0, 10),
            Err(RasterError::InvalidSize { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_stroke_rect_paints_edges_only() {
        let mut canvas = Canvas::new(40, 40).unwrap();
        canvas.stroke_rect(10.0, 10.0, 20.0, 20.0, &StrokeStyle::new(RED, 2.0));
        assert_eq!(canvas.pixel(20, 10).unwrap()[3], 255);
        assert_eq!(canvas.pixel(20, 20).unwrap()[3], 0);
    }

    #[test]
    fn test_single_point_polyline_draws_dot() {
        let mut canvas = Canvas::new(20, 20).unwrap();
        canvas.stroke_polyline(&[(10.0, 10.0)], &StrokeStyle::new(RED, 6.0));
        assert_eq!(canvas.pixel(10, 10).unwrap(), RED);
    }

    #[test]
    fn test_blend_full_coverage_replaces_pixel() {
        let mut canvas = Canvas::new(2, 2).unwrap();
        canvas.blend_coverage(1, 1, RED, 1.0);
        canvas.blend_coverage(5, 5, RED, 1.0);
        assert_eq!(canvas.pixel(1, 1).unwrap(), RED);
        assert_eq!(canvas.pixel(0, 0).unwrap()[3], 0);
    }

    #[test]
    fn test_arrow_head_points_symmetric() {
        let (w1, w2) = arrow_head_points((0.0, 0.0), (10.0, 0.0), 4.0).unwrap();
        assert!((w1.0 - w2.0).abs() < 1e-4);
        assert!((w1.1 + w2.1).abs() < 1e-4);
        assert!(w1.0 < 10.0);
        assert!(arrow_head_points((3.0, 3.0), (3.0, 3.0), 4.0).is_none());
    }
}
