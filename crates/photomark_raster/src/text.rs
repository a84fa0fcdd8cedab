//! Glyph rasterization for pre-wrapped text blocks.
//!
//! Line breaking is the caller's job: the layout that decides where lines
//! break must be the same one used for hit-testing, so this module only
//! places and rasterizes the lines it is given.

use std::path::Path;

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};

use crate::canvas::{Canvas, Rgba};
use crate::error::{RasterError, Result};

/// Font size used when a requested size is unusable.
pub const DEFAULT_FONT_SIZE: f32 = 20.0;

/// Well-known system font locations, tried in order.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/Carlito-Regular.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Horizontal placement of each line inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// A block of already-wrapped lines and the box they occupy.
#[derive(Debug, Clone)]
pub struct TextBlock<'a> {
    pub lines: &'a [String],
    /// Top-left corner of the box.
    pub x: f32,
    pub y: f32,
    /// Box width, used for alignment.
    pub width: f32,
    pub font_size: f32,
    pub line_height: f32,
    pub color: Rgba,
    pub align: TextAlign,
}

/// Rasterizes text with a single loaded font.
#[derive(Clone)]
pub struct TextRenderer {
    font: FontArc,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer").finish_non_exhaustive()
    }
}

impl TextRenderer {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    /// Parse a font from raw TTF/OTF bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = FontArc::try_from_vec(data).map_err(|e| RasterError::InvalidFont(e.to_string()))?;
        Ok(Self::new(font))
    }

    /// Load a font file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let renderer = Self::from_bytes(data)?;
        log::debug!("Loaded font from {:?}", path);
        Ok(renderer)
    }

    /// Load the first font that parses from `candidates`.
    pub fn load_first<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        for path in candidates {
            match Self::from_file(path.as_ref()) {
                Ok(renderer) => return Ok(renderer),
                Err(e) => log::trace!("Font candidate {:?} unusable: {}", path.as_ref(), e),
            }
        }
        Err(RasterError::NoFont)
    }

    /// Load a font from the usual system locations.
    pub fn load_system() -> Result<Self> {
        Self::load_first(SYSTEM_FONT_CANDIDATES)
    }

    /// Measured advance width of one line at `font_size`.
    pub fn line_width(&self, text: &str, font_size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(usable_size(font_size)));
        let mut width = 0.0;
        let mut last: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = last {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            last = Some(id);
        }
        width
    }

    /// Rasterize every line of `block` onto `canvas`.
    ///
    /// Each line is vertically centered inside its `line_height` slot.
    pub fn draw_block(&self, canvas: &mut Canvas, block: &TextBlock<'_>) {
        let size = usable_size(block.font_size);
        let scaled = self.font.as_scaled(PxScale::from(size));
        let ascent = scaled.ascent();
        let glyph_height = ascent - scaled.descent();

        for (i, line) in block.lines.iter().enumerate() {
            let line_top = block.y + i as f32 * block.line_height;
            let baseline = line_top + (block.line_height - glyph_height) / 2.0 + ascent;
            let line_width = self.line_width(line, size);
            let mut caret = match block.align {
                TextAlign::Left => block.x,
                TextAlign::Center => block.x + (block.width - line_width) / 2.0,
                TextAlign::Right => block.x + block.width - line_width,
            };

            let mut last: Option<GlyphId> = None;
            for ch in line.chars() {
                let id = self.font.glyph_id(ch);
                if let Some(prev) = last {
                    caret += scaled.kern(prev, id);
                }
                let glyph = id.with_scale_and_position(size, point(caret, baseline));
                caret += scaled.h_advance(id);
                last = Some(id);

                let Some(outlined) = self.font.outline_glyph(glyph) else {
                    continue;
                };
                let bounds = outlined.px_bounds();
                let (ox, oy) = glyph_origin(bounds.min);
                outlined.draw(|gx, gy, coverage| {
                    canvas.blend_coverage(ox + gx as i32, oy + gy as i32, block.color, coverage);
                });
            }
        }
    }
}

/// Pixel origin of a glyph's bounding box. Rounds down so glyphs that
/// start left of or above the pen position are not shifted by a pixel.
fn glyph_origin(min: ab_glyph::Point) -> (i32, i32) {
    (min.x.floor() as i32, min.y.floor() as i32)
}

/// Replace an unusable font size with the default.
pub fn usable_size(font_size: f32) -> f32 {
    if font_size.is_finite() && font_size > 0.0 {
        font_size
    } else {
        log::warn!(
            "Unusable font size {}, falling back to {}",
            font_size,
            DEFAULT_FONT_SIZE
        );
        DEFAULT_FONT_SIZE
    }
}
