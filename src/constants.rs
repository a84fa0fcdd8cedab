//! Layout, hit-testing, and gesture constants.
//!
//! Screen-space values are in on-screen pixels; text sizes and widths are in
//! image-space units (source pixels at scale 1) unless noted.

/// Text layout constants.
pub mod text {
    /// Minimum on-screen font size; keeps labels legible when zoomed out
    pub const MIN_RENDERED_FONT_SIZE: f32 = 16.0;
    /// Estimated character advance as a ratio of font size
    pub const CHAR_WIDTH_RATIO: f32 = 0.6;
    /// Line height as a ratio of font size
    pub const LINE_HEIGHT_RATIO: f32 = 1.2;
    /// Cap for the automatic text box width estimate
    pub const MAX_AUTO_WIDTH: f32 = 400.0;
    /// Narrowest box the width handle can produce
    pub const MIN_TEXT_BOX_WIDTH: f32 = 24.0;
    /// Font size range reachable with the font handle
    pub const MIN_FONT_SIZE: f32 = 12.0;
    pub const MAX_FONT_SIZE: f32 = 72.0;
    /// Font size for new text annotations and the fallback for unusable sizes
    pub const DEFAULT_FONT_SIZE: f32 = photomark_raster::DEFAULT_FONT_SIZE;
    /// Text placed by a tap with the text tool
    pub const NEW_TEXT_PLACEHOLDER: &str = "Text";
}

/// Hit-testing tolerances (screen pixels).
pub mod hit {
    /// Outward slack around text bounds
    pub const TEXT_TOLERANCE: f32 = 20.0;
    /// Outward slack around shape bounding boxes
    pub const SHAPE_TOLERANCE: f32 = 10.0;
    /// Radius of the width and font-size handle zones
    pub const HANDLE_RADIUS: f32 = 12.0;
}

/// Gesture recognition thresholds (screen pixels).
pub mod gesture {
    /// Movement before a press becomes a drag instead of a tap
    pub const MIN_DRAG_DISTANCE: f32 = 4.0;
    /// Minimum corner separation for arrows, boxes, and circles
    pub const MIN_SHAPE_EXTENT: f32 = 4.0;
}

/// Default style for new annotations.
pub mod style {
    /// Stroke width for new shapes (image-space units)
    pub const DEFAULT_STROKE_WIDTH: f32 = 8.0;
}

/// Preview overlay styling (screen pixels).
pub mod overlay {
    /// Side length of the square handle markers
    pub const HANDLE_MARKER_SIZE: f32 = 10.0;
    /// Width of the selection outline
    pub const SELECTION_STROKE: f32 = 1.5;
}
