//! Core geometry types.
//!
//! Points and vectors are tagged by coordinate space so content-relative and
//! screen values cannot be mixed up. Conversion between the spaces lives in
//! [`crate::transform::Viewport`] and nowhere else.

// ============================================================================
// Content Space
// ============================================================================

/// A point in content-relative coordinates (fractions of image width/height).
///
/// Values at rest lie in [0,1]×[0,1]; intermediate results may fall outside
/// until they are written through [`ContentPoint::clamped`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContentPoint {
    pub x: f32,
    pub y: f32,
}

impl ContentPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp both components into [0,1]. Non-finite components become 0.
    pub fn clamped(self) -> Self {
        Self {
            x: clamp_unit(self.x),
            y: clamp_unit(self.y),
        }
    }

    /// Offset by a content-space delta (unclamped).
    pub fn offset_by(self, delta: ContentVector) -> Self {
        Self::new(self.x + delta.dx, self.y + delta.dy)
    }

    /// Check whether the point lies in the unit square.
    pub fn is_in_unit_square(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// A translation in content-relative units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContentVector {
    pub dx: f32,
    pub dy: f32,
}

impl ContentVector {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

/// Clamp a content coordinate into [0,1], mapping NaN and infinities to 0.
pub fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

// ============================================================================
// Screen Space
// ============================================================================

/// A point in on-screen pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector from `origin` to this point.
    pub fn minus(self, origin: ScreenPoint) -> ScreenVector {
        ScreenVector::new(self.x - origin.x, self.y - origin.y)
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &ScreenPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A translation in screen pixels (e.g. a drag gesture's total movement).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenVector {
    pub dx: f32,
    pub dy: f32,
}

impl ScreenVector {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    pub fn length(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }
}

// ============================================================================
// Sizes and Rectangles
// ============================================================================

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero, negative, or not finite.
    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f32, height as f32)
    }
}

/// An axis-aligned rectangle in screen (or image) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle of the given size centered on `center`.
    pub fn centered_at(center: ScreenPoint, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    /// Smallest rectangle containing all `points`. None for an empty slice.
    pub fn bounding(points: &[ScreenPoint]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Midpoint of the right edge.
    pub fn right_mid(&self) -> ScreenPoint {
        ScreenPoint::new(self.right(), self.y + self.height / 2.0)
    }

    pub fn bottom_right(&self) -> ScreenPoint {
        ScreenPoint::new(self.right(), self.bottom())
    }

    /// Grow the rectangle by `amount` on every side.
    pub fn inflate(&self, amount: f32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }

    /// Check if a point is inside the rectangle (edges inclusive).
    pub fn contains(&self, point: &ScreenPoint) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unit_handles_non_finite() {
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(f32::NAN), 0.0);
        assert_eq!(clamp_unit(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_content_point_clamped() {
        let p = ContentPoint::new(1.2, -3.0).clamped();
        assert_eq!(p, ContentPoint::new(1.0, 0.0));
        assert!(p.is_in_unit_square());
    }

    #[test]
    fn test_rect_bounding_and_contains() {
        let rect = Rect::bounding(&[
            ScreenPoint::new(50.0, 80.0),
            ScreenPoint::new(10.0, 20.0),
            ScreenPoint::new(30.0, 90.0),
        ])
        .unwrap();
        assert_eq!(rect, Rect::new(10.0, 20.0, 40.0, 70.0));
        assert!(rect.contains(&ScreenPoint::new(10.0, 20.0))); // Edge
        assert!(!rect.contains(&ScreenPoint::new(5.0, 50.0)));
        assert!(Rect::bounding(&[]).is_none());
    }

    #[test]
    fn test_rect_inflate_and_handles() {
        let rect = Rect::centered_at(ScreenPoint::new(100.0, 100.0), 40.0, 20.0);
        assert_eq!(rect, Rect::new(80.0, 90.0, 40.0, 20.0));
        assert_eq!(rect.right_mid(), ScreenPoint::new(120.0, 100.0));
        assert_eq!(rect.bottom_right(), ScreenPoint::new(120.0, 110.0));
        assert_eq!(rect.inflate(5.0), Rect::new(75.0, 85.0, 50.0, 30.0));
    }

    #[test]
    fn test_size_is_empty() {
        assert!(Size::new(0.0, 10.0).is_empty());
        assert!(Size::new(f32::NAN, 10.0).is_empty());
        assert!(!Size::from((4000, 3000)).is_empty());
    }
}
