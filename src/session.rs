//! Editing session: selection state, gestures, and annotation creation.
//!
//! `EditorSession` owns the photo being annotated and turns raw pointer
//! events into taps and drags. A press becomes a drag once the pointer has
//! moved `MIN_DRAG_DISTANCE` screen pixels; releasing before that is a tap.

use image::RgbaImage;
use photomark_raster::RasterError;

use crate::compositor::Compositor;
use crate::constants::gesture::{MIN_DRAG_DISTANCE, MIN_SHAPE_EXTENT};
use crate::constants::style::DEFAULT_STROKE_WIDTH;
use crate::constants::text::{DEFAULT_FONT_SIZE, NEW_TEXT_PLACEHOLDER};
use crate::drag::DragHandler;
use crate::geometry::{ContentPoint, ScreenPoint, Size};
use crate::hit_test::{find_target, Handle, HitTarget};
use crate::model::{Annotation, AnnotationKind, Color, Photo, Tool};
use crate::transform::Viewport;

/// Which annotation is selected or being edited.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Selected(usize),
    /// Text edit in progress; `draft` is written to the annotation on commit
    Editing { index: usize, draft: String },
}

impl SelectionState {
    /// Index of the selected (or edited) annotation.
    pub fn index(&self) -> Option<usize> {
        match self {
            SelectionState::Idle => None,
            SelectionState::Selected(index) | SelectionState::Editing { index, .. } => Some(*index),
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, SelectionState::Editing { .. })
    }
}

/// Style applied to newly created annotations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationStyle {
    pub color: Color,
    /// Stroke width for shapes (image-space units)
    pub stroke_width: f32,
    /// Font size for text (image-space units)
    pub font_size: f32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: Color::RED,
            stroke_width: DEFAULT_STROKE_WIDTH,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

/// The pointer gesture in flight between pointer-down and pointer-up.
#[derive(Debug, Clone)]
enum Gesture {
    /// Pressed but not yet moved far enough to be a drag
    Pending {
        start: ScreenPoint,
        target: Option<HitTarget>,
    },
    /// Dragging an existing annotation
    Dragging {
        start: ScreenPoint,
        index: usize,
        handler: DragHandler,
    },
    /// Drawing a new shape
    Drawing {
        kind: AnnotationKind,
        points: Vec<ContentPoint>,
    },
    /// Drag that does nothing (empty area, no shape tool)
    Inert,
}

/// Interactive editing state for one photo.
#[derive(Debug)]
pub struct EditorSession {
    photo: Photo,
    viewport: Viewport,
    tool: Tool,
    style: AnnotationStyle,
    selection: SelectionState,
    gesture: Option<Gesture>,
}

impl EditorSession {
    pub fn new(photo: Photo, viewport: Viewport) -> Self {
        Self {
            photo,
            viewport,
            tool: Tool::default(),
            style: AnnotationStyle::default(),
            selection: SelectionState::Idle,
            gesture: None,
        }
    }

    pub fn photo(&self) -> &Photo {
        &self.photo
    }

    /// Give up the session and return the photo.
    pub fn into_photo(self) -> Photo {
        self.photo
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn style(&self) -> AnnotationStyle {
        self.style
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Replace the viewport (zoom, pan, or view resize).
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.is_degenerate() {
            log::warn!("Session viewport is degenerate: {:?}", viewport);
        }
        self.viewport = viewport;
    }

    pub fn set_tool(&mut self, tool: Tool) {
        log::debug!("Tool changed: {} -> {}", self.tool.name(), tool.name());
        self.tool = tool;
    }

    pub fn set_style(&mut self, style: AnnotationStyle) {
        self.style = style;
    }

    // ========================================================================
    // Pointer events
    // ========================================================================

    pub fn pointer_down(&mut self, point: ScreenPoint) {
        log::trace!("pointer_down ({:.1}, {:.1})", point.x, point.y);
        if let Some(Gesture::Dragging { index, handler, .. }) = self.gesture.take() {
            log::debug!("Finishing interrupted {} drag on index {}", handler.name(), index);
            if let Some(annotation) = self.photo.get_mut(index) {
                handler.finish(annotation);
            }
        }

        let target = find_target(point, &self.photo, &self.viewport, self.selection.index());
        self.gesture = Some(Gesture::Pending {
            start: point,
            target,
        });
    }

    pub fn pointer_move(&mut self, point: ScreenPoint) {
        log::trace!("pointer_move ({:.1}, {:.1})", point.x, point.y);
        let Some(gesture) = self.gesture.take() else {
            return;
        };

        let gesture = match gesture {
            Gesture::Pending { start, target } => {
                if point.distance_to(&start) < MIN_DRAG_DISTANCE {
                    Gesture::Pending { start, target }
                } else {
                    self.start_drag(start, target, point)
                }
            }
            Gesture::Dragging {
                start,
                index,
                handler,
            } => {
                if let Some(annotation) = self.photo.get_mut(index) {
                    handler.update(annotation, point.minus(start), &self.viewport);
                }
                Gesture::Dragging {
                    start,
                    index,
                    handler,
                }
            }
            Gesture::Drawing { kind, mut points } => {
                let p = self.viewport.to_content(point).clamped();
                match kind {
                    AnnotationKind::Freehand => points.push(p),
                    _ => {
                        points.truncate(1);
                        points.push(p);
                    }
                }
                Gesture::Drawing { kind, points }
            }
            Gesture::Inert => Gesture::Inert,
        };
        self.gesture = Some(gesture);
    }

    pub fn pointer_up(&mut self, point: ScreenPoint) {
        log::trace!("pointer_up ({:.1}, {:.1})", point.x, point.y);
        self.pointer_move(point);
        let Some(gesture) = self.gesture.take() else {
            return;
        };

        match gesture {
            Gesture::Pending { start, target } => self.tap(start, target),
            Gesture::Dragging { index, handler, .. } => {
                if let Some(annotation) = self.photo.get_mut(index) {
                    handler.finish(annotation);
                }
            }
            Gesture::Drawing { kind, points } => self.finish_shape(kind, points),
            Gesture::Inert => {}
        }
    }

    /// Turn a pending press into a drag.
    fn start_drag(&mut self, start: ScreenPoint, target: Option<HitTarget>, point: ScreenPoint) -> Gesture {
        if let Some(target) = target {
            if self.selection.index() != Some(target.index) || self.selection.is_editing() {
                self.commit_edit();
                self.selection = SelectionState::Selected(target.index);
            }
            let Some(annotation) = self.photo.get_mut(target.index) else {
                return Gesture::Inert;
            };
            let handler = DragHandler::begin(target, annotation);
            handler.update(annotation, point.minus(start), &self.viewport);
            return Gesture::Dragging {
                start,
                index: target.index,
                handler,
            };
        }

        match self.tool.shape_kind() {
            Some(kind) => {
                self.commit_edit();
                let points = vec![
                    self.viewport.to_content(start).clamped(),
                    self.viewport.to_content(point).clamped(),
                ];
                log::debug!("Drawing {} started", kind.name());
                Gesture::Drawing { kind, points }
            }
            None => Gesture::Inert,
        }
    }

    fn tap(&mut self, point: ScreenPoint, target: Option<HitTarget>) {
        match target {
            Some(target) => self.tap_annotation(target),
            None => self.tap_empty(point),
        }
    }

    fn tap_annotation(&mut self, target: HitTarget) {
        if self.selection.index() != Some(target.index) {
            self.commit_edit();
            log::debug!("Selected annotation index {}", target.index);
            self.selection = SelectionState::Selected(target.index);
            return;
        }
        // Tapping inside the box being edited keeps editing; handle taps do nothing
        if self.selection.is_editing() || target.handle != Handle::Body {
            return;
        }
        match self.photo.get(target.index) {
            Some(annotation) => {
                if let Some(text) = annotation.text() {
                    log::debug!("Editing annotation {}", annotation.id);
                    self.selection = SelectionState::Editing {
                        index: target.index,
                        draft: text.to_string(),
                    };
                }
            }
            None => self.selection = SelectionState::Idle,
        }
    }

    fn tap_empty(&mut self, point: ScreenPoint) {
        if self.selection != SelectionState::Idle {
            self.commit_edit();
            log::debug!("Tap on empty area, deselecting");
            self.selection = SelectionState::Idle;
            return;
        }

        if self.tool == Tool::Text {
            if self.viewport.is_degenerate() {
                log::warn!("Not creating text: degenerate viewport");
                return;
            }
            let position = self.viewport.to_content(point).clamped();
            let id = self.photo.allocate_id();
            let annotation = Annotation::new_text(
                id,
                position,
                NEW_TEXT_PLACEHOLDER,
                self.style.font_size,
                self.style.color,
            );
            let index = self.photo.push(annotation);
            log::debug!(
                "Created text annotation {} at ({:.4}, {:.4})",
                id,
                position.x,
                position.y
            );
            self.selection = SelectionState::Selected(index);
        }
    }

    fn finish_shape(&mut self, kind: AnnotationKind, points: Vec<ContentPoint>) {
        self.selection = SelectionState::Idle;
        let valid = match kind {
            AnnotationKind::Freehand => points.len() >= 2,
            _ => match (points.first(), points.last()) {
                (Some(a), Some(b)) if points.len() >= 2 => {
                    let a = self.viewport.to_screen(*a);
                    let b = self.viewport.to_screen(*b);
                    (a.x - b.x).abs() >= MIN_SHAPE_EXTENT || (a.y - b.y).abs() >= MIN_SHAPE_EXTENT
                }
                _ => false,
            },
        };
        if !valid {
            log::debug!("Discarding {} stroke with {} points", kind.name(), points.len());
            return;
        }

        let id = self.photo.allocate_id();
        let name = kind.name();
        if let Some(annotation) =
            Annotation::new_shape(id, kind, points, self.style.stroke_width, self.style.color)
        {
            self.photo.push(annotation);
            log::debug!("Created {} annotation {}", name, id);
        }
    }

    // ========================================================================
    // Text editing
    // ========================================================================

    /// Replace the draft of the text being edited.
    pub fn update_draft(&mut self, text: impl Into<String>) {
        if let SelectionState::Editing { draft, .. } = &mut self.selection {
            *draft = text.into();
        }
    }

    /// Write the draft to the annotation and return to `Selected`.
    pub fn commit_edit(&mut self) {
        if !self.selection.is_editing() {
            return;
        }
        let SelectionState::Editing { index, draft } = std::mem::take(&mut self.selection) else {
            return;
        };
        match self.photo.get_mut(index) {
            Some(annotation) => {
                annotation.commit_text(draft);
                log::debug!("Committed text on annotation {}", annotation.id);
                self.selection = SelectionState::Selected(index);
            }
            None => {
                log::warn!("Edited annotation index {} no longer exists", index);
                self.selection = SelectionState::Idle;
            }
        }
    }

    /// Drop the draft and return to `Selected`.
    pub fn cancel_edit(&mut self) {
        if let SelectionState::Editing { index, .. } = self.selection {
            self.selection = SelectionState::Selected(index);
        }
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Delete the selected annotation. Ignored while editing text.
    pub fn delete_selected(&mut self) -> Option<Annotation> {
        let SelectionState::Selected(index) = self.selection else {
            return None;
        };
        self.gesture = None;
        self.selection = SelectionState::Idle;
        let removed = self.photo.remove(index);
        if let Some(annotation) = &removed {
            log::debug!("Deleted annotation {}", annotation.id);
        }
        removed
    }

    /// Remove the most recently added annotation.
    pub fn undo_last(&mut self) -> Option<Annotation> {
        let removed = self.photo.pop_last()?;
        self.gesture = None;
        let removed_index = self.photo.len();
        if self.selection.index() == Some(removed_index) {
            self.selection = SelectionState::Idle;
        }
        log::debug!("Undo removed annotation {}", removed.id);
        Some(removed)
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Copy of the annotation list for export.
    pub fn snapshot(&self) -> Vec<Annotation> {
        self.photo.snapshot()
    }

    /// The shape being drawn, if a drawing gesture is in flight.
    pub fn pending_shape(&self) -> Option<Annotation> {
        match &self.gesture {
            Some(Gesture::Drawing { kind, points }) => Annotation::new_shape(
                0,
                kind.clone(),
                points.clone(),
                self.style.stroke_width,
                self.style.color,
            ),
            _ => None,
        }
    }

    /// Render the annotation overlay for a view of `view_size`.
    ///
    /// The result is transparent outside annotations and is meant to be
    /// drawn over the displayed photo.
    pub fn render_preview(&self, compositor: &Compositor, view_size: Size) -> Result<RgbaImage, RasterError> {
        let mut annotations = self.photo.snapshot();
        if let Some(pending) = self.pending_shape() {
            annotations.push(pending);
        }
        compositor.render_overlay(&annotations, &self.viewport, view_size, self.selection.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ScreenVector;
    use crate::model::SourceImage;

    const EPSILON: f32 = 1e-6;

    fn scenario_session() -> EditorSession {
        let photo = Photo::new(SourceImage::dimensions_only(4000, 3000));
        let viewport = Viewport::new(Size::new(4000.0, 3000.0), 0.1, ScreenVector::default());
        EditorSession::new(photo, viewport)
    }

    fn tap(session: &mut EditorSession, x: f32, y: f32) {
        session.pointer_down(ScreenPoint::new(x, y));
        session.pointer_up(ScreenPoint::new(x, y));
    }

    fn drag(session: &mut EditorSession, from: (f32, f32), to: (f32, f32)) {
        session.pointer_down(ScreenPoint::new(from.0, from.1));
        let steps = 5;
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            session.pointer_move(ScreenPoint::new(
                from.0 + (to.0 - from.0) * t,
                from.1 + (to.1 - from.1) * t,
            ));
        }
        session.pointer_up(ScreenPoint::new(to.0, to.1));
    }

    #[test]
    fn test_text_tap_creates_and_selects() {
        let mut session = scenario_session();
        session.set_tool(Tool::Text);
        tap(&mut session, 200.0, 150.0);

        assert_eq!(session.photo().len(), 1);
        assert_eq!(session.selection(), &SelectionState::Selected(0));
        let p = session.photo().annotations()[0].position();
        assert!((p.x - 0.5).abs() < EPSILON);
        assert!((p.y - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_second_tap_edits_and_commit() {
        let mut session = scenario_session();
        session.set_tool(Tool::Text);
        tap(&mut session, 200.0, 150.0);
        tap(&mut session, 200.0, 150.0);
        assert_eq!(
            session.selection(),
            &SelectionState::Editing {
                index: 0,
                draft: NEW_TEXT_PLACEHOLDER.to_string()
            }
        );

        session.update_draft("Water damage");
        session.commit_edit();
        assert_eq!(session.selection(), &SelectionState::Selected(0));
        assert_eq!(session.photo().annotations()[0].text(), Some("Water damage"));
    }

    #[test]
    fn test_cancel_edit_leaves_text() {
        let mut session = scenario_session();
        session.set_tool(Tool::Text);
        tap(&mut session, 200.0, 150.0);
        tap(&mut session, 200.0, 150.0);
        session.update_draft("discarded");
        session.cancel_edit();
        assert_eq!(session.selection(), &SelectionState::Selected(0));
        assert_eq!(session.photo().annotations()[0].text(), Some(NEW_TEXT_PLACEHOLDER));
    }

    #[test]
    fn test_auto_width_idempotent_on_unchanged_commit() {
        let mut session = scenario_session();
        session.set_tool(Tool::Text);
        tap(&mut session, 200.0, 150.0);
        let before = session.photo().annotations()[0].text_content().unwrap().text_box_width;
        for _ in 0..3 {
            tap(&mut session, 200.0, 150.0);
            session.commit_edit();
        }
        let after = session.photo().annotations()[0].text_content().unwrap().text_box_width;
        assert_eq!(before, after);
    }

    #[test]
    fn test_explicit_width_locked_on_commit() {
        let mut session = scenario_session();
        session.set_tool(Tool::Text);
        tap(&mut session, 200.0, 150.0);
        if let Some(content) = session.photo.get_mut(0).and_then(|a| a.text_content_mut()) {
            content.explicit_width = true;
            content.text_box_width = 321.0;
        }
        tap(&mut session, 200.0, 150.0);
        session.update_draft("a considerably longer label than before");
        session.commit_edit();
        let content = session.photo().annotations()[0].text_content().unwrap();
        assert_eq!(content.text_box_width, 321.0);
        assert!(content.explicit_width);
    }

    #[test]
    fn test_tap_outside_commits_and_deselects() {
        let mut session = scenario_session();
        session.set_tool(Tool::Text);
        tap(&mut session, 200.0, 150.0);
        tap(&mut session, 200.0, 150.0);
        session.update_draft("Leak");
        tap(&mut session, 20.0, 20.0);
        assert_eq!(session.selection(), &SelectionState::Idle);
        assert_eq!(session.photo().annotations()[0].text(), Some("Leak"));
        // No new annotation from the deselecting tap
        assert_eq!(session.photo().len(), 1);
    }

    #[test]
    fn test_draw_box_appends_and_stays_idle() {
        let mut session = scenario_session();
        session.set_tool(Tool::Box);
        drag(&mut session, (50.0, 50.0), (150.0, 120.0));
        assert_eq!(session.photo().len(), 1);
        assert_eq!(session.selection(), &SelectionState::Idle);
        let ann = &session.photo().annotations()[0];
        assert_eq!(ann.kind(), &AnnotationKind::Box);
        assert_eq!(ann.points().len(), 2);
    }

    #[test]
    fn test_freehand_collects_points() {
        let mut session = scenario_session();
        session.set_tool(Tool::Freehand);
        drag(&mut session, (50.0, 50.0), (150.0, 120.0));
        let ann = &session.photo().annotations()[0];
        assert!(ann.points().len() >= 2);
    }

    #[test]
    fn test_short_drag_is_a_tap() {
        let mut session = scenario_session();
        session.set_tool(Tool::Box);
        drag(&mut session, (50.0, 50.0), (52.0, 51.0));
        assert!(session.photo().is_empty());
    }

    #[test]
    fn test_drag_moves_unselected_annotation() {
        let mut session = scenario_session();
        session.set_tool(Tool::Text);
        tap(&mut session, 200.0, 150.0);
        tap(&mut session, 20.0, 20.0);
        assert_eq!(session.selection(), &SelectionState::Idle);

        drag(&mut session, (200.0, 150.0), (240.0, 150.0));
        assert_eq!(session.selection(), &SelectionState::Selected(0));
        let p = session.photo().annotations()[0].position();
        assert!((p.x - 0.6).abs() < 1e-5);
        assert!((p.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_delete_selected() {
        let mut session = scenario_session();
        session.set_tool(Tool::Text);
        tap(&mut session, 200.0, 150.0);
        assert!(session.delete_selected().is_some());
        assert!(session.photo().is_empty());
        assert_eq!(session.selection(), &SelectionState::Idle);
        // Nothing selected
        assert!(session.delete_selected().is_none());
    }

    #[test]
    fn test_delete_ignored_while_editing() {
        let mut session = scenario_session();
        session.set_tool(Tool::Text);
        tap(&mut session, 200.0, 150.0);
        tap(&mut session, 200.0, 150.0);
        assert!(session.delete_selected().is_none());
        assert_eq!(session.photo().len(), 1);
    }

    #[test]
    fn test_undo_last_clears_matching_selection() {
        let mut session = scenario_session();
        session.set_tool(Tool::Text);
        tap(&mut session, 100.0, 100.0);
        tap(&mut session, 20.0, 20.0);
        tap(&mut session, 300.0, 250.0);
        assert_eq!(session.selection(), &SelectionState::Selected(1));

        session.undo_last();
        assert_eq!(session.photo().len(), 1);
        assert_eq!(session.selection(), &SelectionState::Idle);
    }

    #[test]
    fn test_tap_other_annotation_commits_edit() {
        let mut session = scenario_session();
        session.set_tool(Tool::Text);
        tap(&mut session, 100.0, 100.0);
        tap(&mut session, 20.0, 20.0);
        tap(&mut session, 300.0, 250.0);
        tap(&mut session, 300.0, 250.0);
        session.update_draft("second");
        tap(&mut session, 100.0, 100.0);
        assert_eq!(session.selection(), &SelectionState::Selected(0));
        assert_eq!(session.photo().annotations()[1].text(), Some("second"));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut session = scenario_session();
        session.set_tool(Tool::Text);
        tap(&mut session, 200.0, 150.0);
        let snapshot = session.snapshot();
        session.delete_selected();
        assert_eq!(snapshot.len(), 1);
        assert!(session.photo().is_empty());
    }
}
