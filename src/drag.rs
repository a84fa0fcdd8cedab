//! Drag handler dispatch.
//!
//! One handler is chosen when a press turns into a drag. Each handler keeps
//! the state captured at pointer-down and applies the total translation since
//! then, so the result does not depend on how many move events arrived.

use photomark_raster::usable_size;

use crate::constants::text::{MAX_FONT_SIZE, MIN_FONT_SIZE, MIN_TEXT_BOX_WIDTH};
use crate::geometry::ScreenVector;
use crate::hit_test::{Handle, HitTarget};
use crate::model::{Annotation, Geometry};
use crate::text_layout::{estimate_text_box_width, font_correction};
use crate::transform::Viewport;

/// Moves an annotation by the drag translation.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveDrag {
    origin: Geometry,
}

/// Drags the right edge of a text box.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeWidthDrag {
    initial_width: f32,
}

/// Drags the bottom-right corner of a text box to change its font size.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeFontDrag {
    initial_size: f32,
}

/// The behavior bound to the current drag gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum DragHandler {
    Move(MoveDrag),
    ResizeWidth(ResizeWidthDrag),
    ResizeFont(ResizeFontDrag),
}

impl DragHandler {
    /// Pick the handler for a hit and capture the annotation's initial state.
    ///
    /// Resize handles only exist on text; any other combination moves.
    pub fn begin(target: HitTarget, annotation: &Annotation) -> Self {
        let handler = match (target.handle, annotation.text_content()) {
            (Handle::Width, Some(content)) => {
                let initial_width = if content.explicit_width {
                    content.text_box_width
                } else {
                    estimate_text_box_width(&content.text, annotation.size)
                };
                DragHandler::ResizeWidth(ResizeWidthDrag { initial_width })
            }
            (Handle::FontSize, Some(_)) => DragHandler::ResizeFont(ResizeFontDrag {
                initial_size: usable_size(annotation.size),
            }),
            _ => DragHandler::Move(MoveDrag {
                origin: annotation.geometry(),
            }),
        };
        log::debug!(
            "Drag begin on annotation {} ({}) with {}",
            annotation.id,
            annotation.kind().name(),
            handler.name()
        );
        handler
    }

    pub fn name(&self) -> &'static str {
        match self {
            DragHandler::Move(_) => "move",
            DragHandler::ResizeWidth(_) => "resize-width",
            DragHandler::ResizeFont(_) => "resize-font",
        }
    }

    /// Apply the total `translation` since pointer-down.
    pub fn update(&self, annotation: &mut Annotation, translation: ScreenVector, viewport: &Viewport) {
        match self {
            DragHandler::Move(drag) => {
                let delta = viewport.delta_to_content(translation);
                annotation.translate_from(&drag.origin, delta);
            }
            DragHandler::ResizeWidth(drag) => {
                let correction = font_correction(annotation.size, viewport);
                let dx_image = viewport.length_to_image(translation.dx);
                // The box is centered: both edges move, so the right edge
                // follows the pointer when the width changes by twice dx
                let width = (drag.initial_width + 2.0 * dx_image / correction).max(MIN_TEXT_BOX_WIDTH);
                if let Some(content) = annotation.text_content_mut() {
                    content.text_box_width = width;
                    content.explicit_width = true;
                }
            }
            DragHandler::ResizeFont(drag) => {
                let dy_image = viewport.length_to_image(translation.dy);
                annotation.size = (drag.initial_size + dy_image).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
            }
        }
    }

    /// Finalize the gesture.
    pub fn finish(&self, annotation: &mut Annotation) {
        if let DragHandler::ResizeFont(_) = self {
            annotation.refresh_auto_width();
        }
        log::debug!("Drag finished on annotation {} ({})", annotation.id, self.name());
    }
}
