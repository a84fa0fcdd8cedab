//! photomark - photo annotation engine
//!
//! Coordinate mapping, hit-testing and direct-manipulation editing for
//! annotations drawn over a photo, plus compositing onto the full-resolution
//! image and JSON persistence.
//!
//! Annotation geometry is stored in normalized content space (0..1 on both
//! axes) so it survives any zoom or resize; [`Viewport`] maps it to screen
//! pixels and back.

pub mod compositor;
pub mod config;
pub mod constants;
pub mod drag;
pub mod export_worker;
pub mod format;
pub mod geometry;
pub mod model;
pub mod session;
pub mod text_layout;
pub mod transform;

pub use compositor::Compositor;
pub use config::{AppConfig, ConfigError, LogLevel};
pub use drag::DragHandler;
pub use export_worker::{save_image, ExportError, ExportWorker};
pub use geometry::{ContentPoint, ContentVector, Rect, ScreenPoint, ScreenVector, Size};
pub use hit_test::{find_target, Handle, HitTarget};
pub use model::{Annotation, AnnotationId, AnnotationKind, Color, Photo, SourceImage, Tool};
pub use session::{AnnotationStyle, EditorSession, SelectionState};
pub use text_layout::{layout_text, TextLayout};
pub use transform::Viewport;
