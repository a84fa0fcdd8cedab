//! Text bounds calculation.
//!
//! Provides the one layout used for text annotations by rendering,
//! hit-testing, and handle placement. Widths are estimated from a fixed
//! character advance rather than measured glyphs, so the layout does not
//! depend on which font is loaded and preview/export always agree on line
//! breaks.

use photomark_raster::usable_size;

use crate::constants::text::{
    CHAR_WIDTH_RATIO, LINE_HEIGHT_RATIO, MAX_AUTO_WIDTH, MIN_RENDERED_FONT_SIZE,
};
use crate::geometry::{Rect, ScreenPoint};
use crate::model::Annotation;
use crate::transform::Viewport;

/// Metrics for a specific font size.
#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    /// Font size in pixels
    pub size: f32,
    /// Average character width as a ratio of font size
    pub char_width_ratio: f32,
    /// Line height as a ratio of font size
    pub line_height_ratio: f32,
}

impl TextMetrics {
    /// Create metrics for a specific font size.
    pub fn new(size: f32) -> Self {
        Self {
            size,
            char_width_ratio: CHAR_WIDTH_RATIO,
            line_height_ratio: LINE_HEIGHT_RATIO,
        }
    }

    /// Estimated advance of one character.
    pub fn char_advance(&self) -> f32 {
        self.size * self.char_width_ratio
    }

    /// Estimate the width of a single line of text.
    pub fn line_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.char_advance()
    }

    pub fn line_height(&self) -> f32 {
        self.size * self.line_height_ratio
    }

    /// How many characters fit in `width`. Always at least one.
    pub fn chars_per_line(&self, width: f32) -> usize {
        let advance = self.char_advance();
        if !(advance > 0.0 && width.is_finite()) {
            return 1;
        }
        // Small slack so a width computed as `n * advance` fits exactly n chars
        ((width / advance) + 1e-3).floor().max(1.0) as usize
    }
}

/// A laid-out text annotation in the viewport's space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Box centered on the annotation's anchor
    pub rect: Rect,
    /// Font size actually rendered (after the legibility floor)
    pub font_size: f32,
    pub line_height: f32,
    /// Wrapped lines, top to bottom
    pub lines: Vec<String>,
}

impl TextLayout {
    /// Center of the width handle (right-edge midpoint).
    pub fn width_handle(&self) -> ScreenPoint {
        self.rect.right_mid()
    }

    /// Center of the font-size handle (bottom-right corner).
    pub fn font_handle(&self) -> ScreenPoint {
        self.rect.bottom_right()
    }
}

/// Rendered font size: `max(size * scale, 16)`.
///
/// Unusable sizes (non-finite or not positive) fall back to the default.
pub fn rendered_font_size(size: f32, viewport: &Viewport) -> f32 {
    viewport
        .length_to_screen(usable_size(size))
        .max(MIN_RENDERED_FONT_SIZE)
}

/// Ratio of rendered to raw on-screen font size.
///
/// 1.0 unless the legibility floor kicked in, in which case text (and its
/// box) is drawn larger than the plain scale would give.
pub fn font_correction(size: f32, viewport: &Viewport) -> f32 {
    let raw = viewport.length_to_screen(usable_size(size));
    if raw > 0.0 {
        rendered_font_size(size, viewport) / raw
    } else {
        1.0
    }
}

/// Automatic box width for `text` at `font_size`, in image-space units:
/// `min(chars * size * 0.6, 400)`. Empty text counts as one character.
pub fn estimate_text_box_width(text: &str, font_size: f32) -> f32 {
    let chars = text.chars().count().max(1) as f32;
    (chars * usable_size(font_size) * CHAR_WIDTH_RATIO).min(MAX_AUTO_WIDTH)
}

/// Box width on screen for a text annotation.
fn screen_box_width(annotation: &Annotation, viewport: &Viewport) -> Option<f32> {
    let content = annotation.text_content()?;
    let image_width = if content.explicit_width {
        content.text_box_width
    } else {
        estimate_text_box_width(&content.text, annotation.size)
    };
    Some(viewport.length_to_screen(image_width) * font_correction(annotation.size, viewport))
}

/// Greedy word wrap to at most `max_chars` characters per line.
///
/// Newlines start new paragraphs; words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            // Hard-break words that cannot fit on any line
            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            if word.is_empty() {
                continue;
            }

            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }

        if current_len > 0 || lines.is_empty() || paragraph.trim().is_empty() {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Lay out a text annotation in `viewport` space.
///
/// Returns None for shapes and for degenerate viewports.
pub fn layout_text(annotation: &Annotation, viewport: &Viewport) -> Option<TextLayout> {
    let content = annotation.text_content()?;
    if viewport.is_degenerate() {
        return None;
    }

    let anchor = viewport.to_screen(annotation.position());
    let font_size = rendered_font_size(annotation.size, viewport);
    let metrics = TextMetrics::new(font_size);
    let width = screen_box_width(annotation, viewport)?;

    let lines = wrap_text(&content.text, metrics.chars_per_line(width));
    let height = lines.len() as f32 * metrics.line_height();

    Some(TextLayout {
        rect: Rect::centered_at(anchor, width, height),
        font_size,
        line_height: metrics.line_height(),
        lines,
    })
}

/// Screen rectangle occupied by a text annotation.
pub fn compute_bounds(annotation: &Annotation, viewport: &Viewport) -> Option<Rect> {
    layout_text(annotation, viewport).map(|layout| layout.rect)
}
