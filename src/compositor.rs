//! Flattened export and preview overlay rendering.
//!
//! Export and preview share `draw_annotation`: export runs it with the
//! identity viewport over a copy of the source image, the preview runs it with
//! the session viewport over a transparent canvas.

use image::RgbaImage;
use photomark_raster::{Canvas, RasterError, StrokeStyle, TextAlign, TextBlock, TextRenderer};

use crate::constants::overlay::{HANDLE_MARKER_SIZE, SELECTION_STROKE};
use crate::geometry::{ScreenPoint, Size};
use crate::hit_test::shape_hit_rect;
use crate::model::{Annotation, AnnotationKind, Color};
use crate::text_layout::layout_text;
use crate::transform::Viewport;

/// Outline color for the selected annotation in the preview.
const SELECTION_COLOR: Color = Color::rgba(255, 255, 255, 220);
/// Fill color of handle markers.
const HANDLE_COLOR: Color = Color::rgba(30, 110, 230, 255);

/// Renders annotations onto raster canvases.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    text: Option<TextRenderer>,
}

impl Compositor {
    /// A compositor that draws text with `text`, or skips text when None.
    pub fn new(text: Option<TextRenderer>) -> Self {
        if text.is_none() {
            log::warn!("No font available; text annotations will not be rendered");
        }
        Self { text }
    }

    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    /// Draw `annotations` over `source` at full resolution.
    ///
    /// A zero-sized source is returned unchanged.
    pub fn render(&self, source: &RgbaImage, annotations: &[Annotation]) -> Result<RgbaImage, RasterError> {
        let viewport = Viewport::identity(Size::from(source.dimensions()));
        if viewport.is_degenerate() {
            log::warn!(
                "Source image is {}x{}; skipping {} annotations",
                source.width(),
                source.height(),
                annotations.len()
            );
            return Ok(source.clone());
        }

        let mut canvas = Canvas::from_rgba_image(source)?;
        let skipped = self.draw_all(&mut canvas, annotations, &viewport);
        if skipped > 0 {
            log::warn!("Export skipped {} text annotations without a font", skipped);
        }
        log::debug!(
            "Rendered {} annotations onto {}x{} image",
            annotations.len(),
            source.width(),
            source.height()
        );
        canvas.into_rgba_image()
    }

    /// Draw `annotations` in screen space on a transparent canvas of
    /// `view_size`, plus selection outline and handles for `selected`.
    pub fn render_overlay(
        &self,
        annotations: &[Annotation],
        viewport: &Viewport,
        view_size: Size,
        selected: Option<usize>,
    ) -> Result<RgbaImage, RasterError> {
        let mut canvas = Canvas::new(
            view_size.width.max(0.0).round() as u32,
            view_size.height.max(0.0).round() as u32,
        )?;
        if viewport.is_degenerate() {
            log::warn!("Preview skipped: degenerate viewport {:?}", viewport);
            return canvas.into_rgba_image();
        }

        self.draw_all(&mut canvas, annotations, viewport);
        if let Some(annotation) = selected.and_then(|i| annotations.get(i)) {
            draw_selection(&mut canvas, annotation, viewport);
        }
        canvas.into_rgba_image()
    }

    /// Draw in list order. Returns the number of text annotations skipped.
    fn draw_all(&self, canvas: &mut Canvas, annotations: &[Annotation], viewport: &Viewport) -> usize {
        annotations
            .iter()
            .filter(|annotation| !self.draw_annotation(canvas, annotation, viewport))
            .count()
    }

    /// Draw one annotation. Returns false when it could not be drawn.
    fn draw_annotation(&self, canvas: &mut Canvas, annotation: &Annotation, viewport: &Viewport) -> bool {
        let style = StrokeStyle::new(
            annotation.color.to_array(),
            viewport.length_to_screen(annotation.size),
        );
        let screen = |i: usize| {
            let p = viewport.to_screen(annotation.points()[i]);
            (p.x, p.y)
        };
        let points = annotation.points();

        match annotation.kind() {
            AnnotationKind::Freehand => {
                let path: Vec<(f32, f32)> = (0..points.len()).map(screen).collect();
                canvas.stroke_polyline(&path, &style);
            }
            AnnotationKind::Arrow => {
                if let Some(last) = points.len().checked_sub(1) {
                    canvas.stroke_arrow(screen(0), screen(last), &style);
                }
            }
            AnnotationKind::Box => {
                if let Some((x, y, w, h)) = corner_box(points.len(), screen) {
                    canvas.stroke_rect(x, y, w, h, &style);
                }
            }
            AnnotationKind::Circle => {
                if let Some((x, y, w, h)) = corner_box(points.len(), screen) {
                    canvas.stroke_ellipse(x, y, w, h, &style);
                }
            }
            AnnotationKind::Text(_) => {
                let Some(renderer) = &self.text else {
                    return false;
                };
                let Some(layout) = layout_text(annotation, viewport) else {
                    return false;
                };
                renderer.draw_block(
                    canvas,
                    &TextBlock {
                        lines: &layout.lines,
                        x: layout.rect.x,
                        y: layout.rect.y,
                        width: layout.rect.width,
                        font_size: layout.font_size,
                        line_height: layout.line_height,
                        color: annotation.color.to_array(),
                        align: TextAlign::Center,
                    },
                );
            }
        }
        true
    }
}

/// Normalized `(x, y, w, h)` box spanned by the first and last point.
fn corner_box(len: usize, screen: impl Fn(usize) -> (f32, f32)) -> Option<(f32, f32, f32, f32)> {
    let last = len.checked_sub(1)?;
    let (ax, ay) = screen(0);
    let (bx, by) = screen(last);
    Some((ax.min(bx), ay.min(by), (bx - ax).abs(), (by - ay).abs()))
}

fn draw_selection(canvas: &mut Canvas, annotation: &Annotation, viewport: &Viewport) {
    let outline = StrokeStyle::new(SELECTION_COLOR.to_array(), SELECTION_STROKE);

    match layout_text(annotation, viewport) {
        Some(layout) => {
            let rect = layout.rect;
            canvas.stroke_rect(rect.x, rect.y, rect.width, rect.height, &outline);
            for handle in [layout.width_handle(), layout.font_handle()] {
                draw_handle_marker(canvas, handle);
            }
        }
        None => {
            if let Some(rect) = shape_hit_rect(annotation, viewport) {
                canvas.stroke_rect(rect.x, rect.y, rect.width, rect.height, &outline);
            }
        }
    }
}

fn draw_handle_marker(canvas: &mut Canvas, center: ScreenPoint) {
    let half = HANDLE_MARKER_SIZE / 2.0;
    canvas.fill_rect(
        center.x - half,
        center.y - half,
        HANDLE_MARKER_SIZE,
        HANDLE_MARKER_SIZE,
        HANDLE_COLOR.to_array(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ContentPoint, ScreenVector};
    use image::Rgba;

    fn gray(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255]))
    }

    fn shape(kind: AnnotationKind, a: (f32, f32), b: (f32, f32)) -> Annotation {
        Annotation::new_shape(
            1,
            kind,
            vec![ContentPoint::new(a.0, a.1), ContentPoint::new(b.0, b.1)],
            4.0,
            Color::rgb(255, 0, 0),
        )
        .unwrap()
    }

    #[test]
    fn test_render_keeps_size_and_background() {
        let compositor = Compositor::new(None);
        let out = compositor.render(&gray(100, 80), &[]).unwrap();
        assert_eq!(out.dimensions(), (100, 80));
        assert_eq!(out.get_pixel(10, 10).0, [128, 128, 128, 255]);
    }

    #[test]
    fn test_box_drawn_at_image_pixels() {
        let compositor = Compositor::new(None);
        let ann = shape(AnnotationKind::Box, (0.2, 0.2), (0.8, 0.8));
        let out = compositor.render(&gray(100, 100), &[ann]).unwrap();
        // Left edge at x = 20, interior untouched
        assert_eq!(out.get_pixel(20, 50).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(50, 50).0, [128, 128, 128, 255]);
    }

    #[test]
    fn test_later_annotations_draw_on_top() {
        let compositor = Compositor::new(None);
        let mut a = shape(AnnotationKind::Freehand, (0.0, 0.5), (1.0, 0.5));
        a.size = 10.0;
        let mut b = shape(AnnotationKind::Freehand, (0.5, 0.0), (0.5, 1.0));
        b.size = 10.0;
        b.color = Color::rgb(0, 0, 255);
        let out = compositor.render(&gray(100, 100), &[a, b]).unwrap();
        assert_eq!(out.get_pixel(50, 50).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_zero_size_source_returned_unchanged() {
        let compositor = Compositor::new(None);
        let ann = shape(AnnotationKind::Circle, (0.1, 0.1), (0.9, 0.9));
        let out = compositor.render(&RgbaImage::new(0, 0), &[ann]).unwrap();
        assert_eq!(out.dimensions(), (0, 0));
    }

    #[test]
    fn test_text_skipped_without_font() {
        let compositor = Compositor::new(None);
        assert!(!compositor.has_text());
        let label = Annotation::new_text(1, ContentPoint::new(0.5, 0.5), "Leak", 20.0, Color::BLACK);
        let out = compositor.render(&gray(200, 200), &[label]).unwrap();
        assert!(out.pixels().all(|p| p.0 == [128, 128, 128, 255]));
    }

    #[test]
    fn test_text_rendered_centered_with_system_font() {
        // Skipped on machines without any of the known system fonts
        let Ok(renderer) = TextRenderer::load_system() else {
            return;
        };
        let compositor = Compositor::new(Some(renderer));
        let label = Annotation::new_text(1, ContentPoint::new(0.5, 0.5), "MMMM", 40.0, Color::BLACK);
        let out = compositor.render(&RgbaImage::new(400, 300), &[label]).unwrap();

        let inked: Vec<(u32, u32)> = out
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[3] > 0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!inked.is_empty());
        let cx = inked.iter().map(|p| p.0 as f32).sum::<f32>() / inked.len() as f32;
        let cy = inked.iter().map(|p| p.1 as f32).sum::<f32>() / inked.len() as f32;
        // Ink centroid lands near the anchor
        assert!((cx - 200.0).abs() < 20.0, "cx = {}", cx);
        assert!((cy - 150.0).abs() < 20.0, "cy = {}", cy);
    }

    #[test]
    fn test_overlay_is_transparent_with_selection() {
        let compositor = Compositor::new(None);
        let vp = Viewport::new(Size::new(1000.0, 1000.0), 0.2, ScreenVector::new(10.0, 0.0));
        let ann = shape(AnnotationKind::Box, (0.25, 0.25), (0.75, 0.75));
        let out = compositor
            .render_overlay(&[ann], &vp, Size::new(220.0, 200.0), Some(0))
            .unwrap();
        assert_eq!(out.dimensions(), (220, 200));
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
        // Box left edge: 0.25 * 1000 * 0.2 + 10 = 60
        assert!(out.get_pixel(60, 100).0[3] > 0);
    }

    #[test]
    fn test_overlay_text_selection_draws_handles() {
        let compositor = Compositor::new(None);
        let vp = Viewport::identity(Size::new(200.0, 200.0));
        let label = Annotation::new_text(1, ContentPoint::new(0.5, 0.5), "Leak", 20.0, Color::BLACK);
        let handle = layout_text(&label, &vp).unwrap().font_handle();
        let out = compositor
            .render_overlay(&[label], &vp, Size::new(200.0, 200.0), Some(0))
            .unwrap();
        let px = out.get_pixel(handle.x as u32, handle.y as u32);
        assert_eq!(px.0, HANDLE_COLOR.to_array());
    }
}
