//! Coordinate transform between content, image, and screen space.
//!
//! `Viewport` is the only place that knows the mapping formulas:
//!
//! - `to_screen(p) = p * image_size * scale + offset`
//! - `to_content(s) = (s - offset) / scale / image_size`
//!
//! Everything that converts coordinates (hit-testing, drag handlers, text
//! layout, preview and export rendering) goes through these methods. The math
//! runs in f64 so the round trip stays well inside 1e-6.

use crate::geometry::{ContentPoint, ContentVector, ScreenPoint, ScreenVector, Size};

/// Maps content-relative coordinates onto a displayed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Source image size in pixels.
    pub image_size: Size,
    /// Displayed image width divided by source image width.
    pub scale: f32,
    /// Screen position of the image's top-left corner (letterbox/pan offset).
    pub offset: ScreenVector,
}

impl Viewport {
    pub fn new(image_size: Size, scale: f32, offset: ScreenVector) -> Self {
        Self {
            image_size,
            scale,
            offset,
        }
    }

    /// Image space: scale 1, no offset. Screen pixels equal source pixels.
    pub fn identity(image_size: Size) -> Self {
        Self::new(image_size, 1.0, ScreenVector::default())
    }

    /// Fit the whole image inside `view_size`, centered (letterboxed).
    pub fn fit(image_size: Size, view_size: Size) -> Self {
        if image_size.is_empty() || view_size.is_empty() {
            log::warn!(
                "Cannot fit image {:?} into view {:?}, using identity viewport",
                image_size,
                view_size
            );
            return Self::identity(image_size);
        }
        let scale = (view_size.width / image_size.width).min(view_size.height / image_size.height);
        let offset = ScreenVector::new(
            (view_size.width - image_size.width * scale) / 2.0,
            (view_size.height - image_size.height * scale) / 2.0,
        );
        Self::new(image_size, scale, offset)
    }

    /// True when conversions would divide by zero or produce garbage.
    pub fn is_degenerate(&self) -> bool {
        self.image_size.is_empty() || !(self.scale.is_finite() && self.scale > 0.0)
    }

    /// Displayed size of the image on screen.
    pub fn displayed_size(&self) -> Size {
        Size::new(
            self.image_size.width * self.scale,
            self.image_size.height * self.scale,
        )
    }

    /// Content-relative point to screen pixels.
    pub fn to_screen(&self, p: ContentPoint) -> ScreenPoint {
        let (w, h, s) = self.factors();
        ScreenPoint::new(
            (p.x as f64 * w * s + self.offset.dx as f64) as f32,
            (p.y as f64 * h * s + self.offset.dy as f64) as f32,
        )
    }

    /// Screen pixels to a content-relative point (unclamped).
    ///
    /// Returns the origin for a degenerate viewport.
    pub fn to_content(&self, s: ScreenPoint) -> ContentPoint {
        if self.is_degenerate() {
            return ContentPoint::default();
        }
        let (w, h, scale) = self.factors();
        ContentPoint::new(
            ((s.x as f64 - self.offset.dx as f64) / scale / w) as f32,
            ((s.y as f64 - self.offset.dy as f64) / scale / h) as f32,
        )
    }

    /// Screen translation to a content-relative delta: `t / scale / image_size`.
    pub fn delta_to_content(&self, t: ScreenVector) -> ContentVector {
        if self.is_degenerate() {
            return ContentVector::default();
        }
        let (w, h, scale) = self.factors();
        ContentVector::new(
            (t.dx as f64 / scale / w) as f32,
            (t.dy as f64 / scale / h) as f32,
        )
    }

    /// Image-space length (stroke width, font size) to screen pixels.
    pub fn length_to_screen(&self, length: f32) -> f32 {
        length * self.scale
    }

    /// Screen length to image-space units.
    pub fn length_to_image(&self, length: f32) -> f32 {
        if self.is_degenerate() {
            return 0.0;
        }
        (length as f64 / self.scale as f64) as f32
    }

    /// Content-relative point to source image pixels.
    pub fn to_image(&self, p: ContentPoint) -> (f32, f32) {
        (p.x * self.image_size.width, p.y * self.image_size.height)
    }

    /// Zoom to `new_scale` keeping the content point under `cursor` fixed.
    pub fn zoom_to_cursor(&self, new_scale: f32, cursor: ScreenPoint) -> Viewport {
        if self.is_degenerate() || !(new_scale.is_finite() && new_scale > 0.0) {
            return *self;
        }
        // Content point under cursor before zoom
        let anchor = self.to_content(cursor);
        let mut zoomed = Viewport::new(self.image_size, new_scale, self.offset);
        // Adjust offset so the same point stays under the cursor
        let moved = zoomed.to_screen(anchor);
        zoomed.offset.dx += cursor.x - moved.x;
        zoomed.offset.dy += cursor.y - moved.y;
        zoomed
    }

    /// Apply a pan delta.
    pub fn pan_by(&self, delta: ScreenVector) -> Viewport {
        Viewport::new(
            self.image_size,
            self.scale,
            ScreenVector::new(self.offset.dx + delta.dx, self.offset.dy + delta.dy),
        )
    }

    fn factors(&self) -> (f64, f64, f64) {
        (
            self.image_size.width as f64,
            self.image_size.height as f64,
            self.scale as f64,
        )
    }
}
