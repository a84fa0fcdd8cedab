//! Data models for annotated photos.

mod annotation;
mod color;
mod photo;

pub use annotation::{Annotation, AnnotationId, AnnotationKind, Geometry, TextContent, Tool};
pub use color::Color;
pub use photo::{Photo, SourceImage};
