//! photomark_raster - raster primitives for annotation rendering
//!
//! This crate provides a small drawing surface over tiny-skia plus ab_glyph
//! text rasterization. It is independent of the annotation model: callers
//! convert their geometry to canvas pixels before drawing.

mod canvas;
mod error;
mod text;

pub use canvas::{
    arrow_head_points, Canvas, Rgba, StrokeStyle, ARROW_HEAD_RATIO, MIN_ARROW_HEAD,
    MIN_STROKE_WIDTH,
};
pub use error::{RasterError, Result};
pub use text::{
    usable_size, TextAlign, TextBlock, TextRenderer, DEFAULT_FONT_SIZE, SYSTEM_FONT_CANDIDATES,
};

// Re-export the font type so callers can hold one without a direct dependency
pub use ab_glyph::FontArc;
