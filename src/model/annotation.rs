//! Annotation types and tools.

use crate::geometry::{ContentPoint, ContentVector};
use crate::model::Color;
use crate::text_layout::estimate_text_box_width;

/// Unique identifier for an annotation.
pub type AnnotationId = u64;

/// Tools available for creating annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// No creation tool; taps and drags only select and edit
    #[default]
    None,
    Freehand,
    Arrow,
    Box,
    Circle,
    Text,
}

impl Tool {
    /// Get the display name for this tool.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::None => "None",
            Tool::Freehand => "Freehand",
            Tool::Arrow => "Arrow",
            Tool::Box => "Box",
            Tool::Circle => "Circle",
            Tool::Text => "Text",
        }
    }

    /// The shape kind this tool draws with a drag, if any.
    pub fn shape_kind(&self) -> Option<AnnotationKind> {
        match self {
            Tool::Freehand => Some(AnnotationKind::Freehand),
            Tool::Arrow => Some(AnnotationKind::Arrow),
            Tool::Box => Some(AnnotationKind::Box),
            Tool::Circle => Some(AnnotationKind::Circle),
            Tool::None | Tool::Text => None,
        }
    }
}

/// Text payload of a text annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct TextContent {
    pub text: String,
    /// Set once the user drags the width handle; suppresses re-estimation.
    pub explicit_width: bool,
    /// Wrapping width in image-space units.
    pub text_box_width: f32,
}

/// What an annotation is. Text-only data lives inside the `Text` variant.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationKind {
    /// Sampled stroke path
    Freehand,
    /// `[tail, head]`
    Arrow,
    /// Two opposite corners
    Box,
    /// Ellipse inscribed in the box spanned by two opposite corners
    Circle,
    Text(TextContent),
}

impl AnnotationKind {
    /// Name used in persisted records.
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationKind::Freehand => "freehand",
            AnnotationKind::Arrow => "arrow",
            AnnotationKind::Box => "box",
            AnnotationKind::Circle => "circle",
            AnnotationKind::Text(_) => "text",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, AnnotationKind::Text(_))
    }
}

/// Position and points of an annotation, captured so a gesture can apply
/// its total translation to the original geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub position: ContentPoint,
    pub points: Vec<ContentPoint>,
}

/// One mark on a photo.
///
/// Coordinates are content-relative and clamped to [0,1] on every write, so
/// `position` and `points` are only reachable through clamping setters.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    kind: AnnotationKind,
    points: Vec<ContentPoint>,
    position: ContentPoint,
    /// Stroke width (shapes) or font size (text), in image-space units.
    pub size: f32,
    pub color: Color,
}

impl Annotation {
    /// Create a shape annotation. Returns None for an empty point list or a
    /// text kind.
    pub fn new_shape(
        id: AnnotationId,
        kind: AnnotationKind,
        points: Vec<ContentPoint>,
        stroke_width: f32,
        color: Color,
    ) -> Option<Self> {
        if kind.is_text() || points.is_empty() {
            return None;
        }
        let points: Vec<ContentPoint> = points.into_iter().map(ContentPoint::clamped).collect();
        Some(Self {
            id,
            kind,
            position: points[0],
            points,
            size: stroke_width,
            color,
        })
    }

    /// Create a text annotation centered on `position` with an estimated width.
    pub fn new_text(
        id: AnnotationId,
        position: ContentPoint,
        text: impl Into<String>,
        font_size: f32,
        color: Color,
    ) -> Self {
        let text = text.into();
        let text_box_width = estimate_text_box_width(&text, font_size);
        let position = position.clamped();
        Self {
            id,
            kind: AnnotationKind::Text(TextContent {
                text,
                explicit_width: false,
                text_box_width,
            }),
            points: vec![position],
            position,
            size: font_size,
            color,
        }
    }

    /// Rebuild an annotation from stored parts, clamping coordinates.
    ///
    /// For text the anchor point list is reset to `[position]`.
    pub fn from_parts(
        id: AnnotationId,
        kind: AnnotationKind,
        points: Vec<ContentPoint>,
        position: ContentPoint,
        size: f32,
        color: Color,
    ) -> Self {
        let position = position.clamped();
        let points = if kind.is_text() {
            vec![position]
        } else {
            points.into_iter().map(ContentPoint::clamped).collect()
        };
        Self {
            id,
            kind,
            points,
            position,
            size,
            color,
        }
    }

    pub fn kind(&self) -> &AnnotationKind {
        &self.kind
    }

    pub fn points(&self) -> &[ContentPoint] {
        &self.points
    }

    pub fn position(&self) -> ContentPoint {
        self.position
    }

    pub fn is_text(&self) -> bool {
        self.kind.is_text()
    }

    /// Text payload, if this is a text annotation.
    pub fn text_content(&self) -> Option<&TextContent> {
        match &self.kind {
            AnnotationKind::Text(content) => Some(content),
            _ => None,
        }
    }

    pub fn text_content_mut(&mut self) -> Option<&mut TextContent> {
        match &mut self.kind {
            AnnotationKind::Text(content) => Some(content),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text_content().map(|c| c.text.as_str())
    }

    /// Replace the text. When the width is not explicit, the box width is
    /// re-estimated from the new text. No-op for shapes.
    pub fn commit_text(&mut self, text: String) {
        let size = self.size;
        if let Some(content) = self.text_content_mut() {
            content.text = text;
            if !content.explicit_width {
                content.text_box_width = estimate_text_box_width(&content.text, size);
            }
        }
    }

    /// Re-estimate the box width from the current text and font size unless
    /// the width is explicit.
    pub fn refresh_auto_width(&mut self) {
        let size = self.size;
        if let Some(content) = self.text_content_mut() {
            if !content.explicit_width {
                content.text_box_width = estimate_text_box_width(&content.text, size);
            }
        }
    }

    /// Snapshot the movable geometry.
    pub fn geometry(&self) -> Geometry {
        Geometry {
            position: self.position,
            points: self.points.clone(),
        }
    }

    /// Content-space bounds `(min, max)` of the points.
    pub fn content_bounds(&self) -> (ContentPoint, ContentPoint) {
        point_bounds(&self.points)
    }

    /// Place the annotation at `origin` translated by `delta`.
    ///
    /// Text anchors are clamped into the unit square. Shapes keep their
    /// form: the delta is limited so every point stays inside, and the anchor
    /// follows the first point.
    pub fn translate_from(&mut self, origin: &Geometry, delta: ContentVector) {
        if self.is_text() {
            self.position = origin.position.offset_by(delta).clamped();
            self.points = vec![self.position];
            return;
        }

        let (min, max) = point_bounds(&origin.points);
        let dx = limit(delta.dx, -min.x, 1.0 - max.x);
        let dy = limit(delta.dy, -min.y, 1.0 - max.y);
        let delta = ContentVector::new(dx, dy);
        self.points = origin
            .points
            .iter()
            .map(|p| p.offset_by(delta).clamped())
            .collect();
        self.position = self.points.first().copied().unwrap_or(origin.position.clamped());
    }
}

/// Clamp `v` into `[lo, hi]`, tolerating an inverted range from rounding.
fn limit(v: f32, lo: f32, hi: f32) -> f32 {
    if !v.is_finite() {
        return 0.0;
    }
    v.max(lo).min(hi.max(lo))
}

fn point_bounds(points: &[ContentPoint]) -> (ContentPoint, ContentPoint) {
    let mut min = ContentPoint::new(f32::INFINITY, f32::INFINITY);
    let mut max = ContentPoint::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    if points.is_empty() {
        return (ContentPoint::default(), ContentPoint::default());
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn square() -> Annotation {
        Annotation::new_shape(
            1,
            AnnotationKind::Box,
            vec![ContentPoint::new(0.2, 0.2), ContentPoint::new(0.4, 0.5)],
            4.0,
            Color::RED,
        )
        .unwrap()
    }

    #[test]
    fn test_new_shape_rejects_empty_and_text() {
        assert!(Annotation::new_shape(1, AnnotationKind::Arrow, vec![], 4.0, Color::RED).is_none());
        let text_kind = AnnotationKind::Text(TextContent {
            text: "x".into(),
            explicit_width: false,
            text_box_width: 10.0,
        });
        assert!(
            Annotation::new_shape(1, text_kind, vec![ContentPoint::new(0.1, 0.1)], 4.0, Color::RED)
                .is_none()
        );
    }

    #[test]
    fn test_new_shape_clamps_points() {
        let ann = Annotation::new_shape(
            1,
            AnnotationKind::Freehand,
            vec![ContentPoint::new(-0.5, 0.5), ContentPoint::new(0.5, 1.5)],
            4.0,
            Color::RED,
        )
        .unwrap();
        assert_eq!(ann.points()[0], ContentPoint::new(0.0, 0.5));
        assert_eq!(ann.points()[1], ContentPoint::new(0.5, 1.0));
        assert_eq!(ann.position(), ann.points()[0]);
    }

    #[test]
    fn test_new_text_estimates_width() {
        let ann = Annotation::new_text(7, ContentPoint::new(0.5, 0.5), "Leak", 20.0, Color::RED);
        let content = ann.text_content().unwrap();
        assert!(!content.explicit_width);
        assert!((content.text_box_width - 4.0 * 20.0 * 0.6).abs() < EPSILON * 100.0);
        assert_eq!(ann.points(), &[ContentPoint::new(0.5, 0.5)]);
        assert_eq!(ann.kind().name(), "text");
    }

    #[test]
    fn test_commit_text_respects_explicit_width() {
        let mut ann = Annotation::new_text(1, ContentPoint::new(0.5, 0.5), "a", 20.0, Color::RED);
        ann.commit_text("a much longer label".into());
        let auto_width = ann.text_content().unwrap().text_box_width;
        assert!(auto_width > 12.0);

        if let Some(content) = ann.text_content_mut() {
            content.explicit_width = true;
            content.text_box_width = 55.0;
        }
        ann.commit_text("short".into());
        assert_eq!(ann.text_content().unwrap().text_box_width, 55.0);
        assert_eq!(ann.text(), Some("short"));
    }

    #[test]
    fn test_commit_text_on_shape_is_noop() {
        let mut ann = square();
        ann.commit_text("ignored".into());
        assert!(ann.text().is_none());
    }

    #[test]
    fn test_translate_text_clamps_anchor() {
        let mut ann = Annotation::new_text(1, ContentPoint::new(0.9, 0.5), "x", 20.0, Color::RED);
        let origin = ann.geometry();
        ann.translate_from(&origin, ContentVector::new(0.5, -0.1));
        assert_eq!(ann.position().x, 1.0);
        assert!((ann.position().y - 0.4).abs() < EPSILON);
        assert_eq!(ann.points(), &[ann.position()]);
    }

    #[test]
    fn test_translate_shape_keeps_form_at_border() {
        let mut ann = square();
        let origin = ann.geometry();
        ann.translate_from(&origin, ContentVector::new(0.9, 0.0));
        // Right edge stops at 1.0; width 0.2 preserved
        assert!((ann.points()[1].x - 1.0).abs() < EPSILON);
        assert!((ann.points()[0].x - 0.8).abs() < EPSILON);
        assert_eq!(ann.position(), ann.points()[0]);
    }

    #[test]
    fn test_translate_from_origin_does_not_accumulate() {
        let mut ann = square();
        let origin = ann.geometry();
        for step in 1..=10 {
            ann.translate_from(&origin, ContentVector::new(0.01 * step as f32, 0.0));
        }
        assert!((ann.position().x - 0.3).abs() < EPSILON);
    }

    #[test]
    fn test_tool_shape_kind() {
        assert_eq!(Tool::Circle.shape_kind(), Some(AnnotationKind::Circle));
        assert_eq!(Tool::Text.shape_kind(), None);
        assert_eq!(Tool::None.shape_kind(), None);
    }
}
