//! Persisted document structures.
//!
//! # Versioning
//!
//! The document uses semantic versioning (MAJOR.MINOR.PATCH):
//!
//! - **Version 0.x.x**: Unstable. Files with a different minor version are
//!   still read, with a warning.
//! - Any other major version is rejected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::geometry::ContentPoint;
use crate::model::{Annotation, AnnotationKind, Color, Photo, TextContent};
use crate::text_layout::estimate_text_box_width;

/// Annotation document for one photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoDocument {
    /// Format version for compatibility checking.
    pub version: String,

    /// The photo the annotations belong to.
    pub image: ImageEntry,

    /// Annotations in z-order (last on top).
    pub annotations: Vec<AnnotationRecord>,
}

impl PhotoDocument {
    /// Current version of the document format.
    pub const CURRENT_VERSION: &'static str = "0.1.0";

    /// Major version number for compatibility checking.
    pub const VERSION_MAJOR: u32 = 0;

    /// Minor version number.
    pub const VERSION_MINOR: u32 = 1;

    /// Snapshot a photo into a document.
    pub fn from_photo(photo: &Photo, image_path: Option<&Path>) -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
            image: ImageEntry {
                path: image_path.map(Path::to_path_buf),
                width: photo.image().width(),
                height: photo.image().height(),
            },
            annotations: photo.annotations().iter().map(AnnotationRecord::from).collect(),
        }
    }

    /// Parse a version string into (major, minor, patch) components.
    ///
    /// Returns None if the version string is invalid.
    pub fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
        let parts: Vec<&str> = version.split('.').collect();
        if parts.len() != 3 {
            return None;
        }
        let major = parts[0].parse().ok()?;
        let minor = parts[1].parse().ok()?;
        let patch = parts[2].parse().ok()?;
        Some((major, minor, patch))
    }

    /// Check if a version is fully compatible with the current version.
    ///
    /// For version 0.x.x only exact minor version matches are compatible.
    pub fn is_version_compatible(file_version: &str) -> bool {
        let Some((file_major, file_minor, _)) = Self::parse_version(file_version) else {
            return false;
        };
        if Self::VERSION_MAJOR == 0 {
            file_major == 0 && file_minor == Self::VERSION_MINOR
        } else {
            file_major == Self::VERSION_MAJOR
        }
    }

    /// Check if a file can be read at all (possibly with warnings).
    pub fn is_version_readable(file_version: &str) -> bool {
        let Some((file_major, _, _)) = Self::parse_version(file_version) else {
            return false;
        };
        file_major == Self::VERSION_MAJOR
    }
}

/// Source image reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Image file path, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
}

/// One persisted annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    pub id: u64,
    /// One of "freehand", "arrow", "box", "circle", "text"
    pub kind: String,
    #[serde(default)]
    pub points: Vec<[f32; 2]>,
    pub position: [f32; 2],
    pub size: f32,
    pub color: [u8; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_width: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_box_width: Option<f32>,
}

impl From<&Annotation> for AnnotationRecord {
    fn from(annotation: &Annotation) -> Self {
        let content = annotation.text_content();
        Self {
            id: annotation.id,
            kind: annotation.kind().name().to_string(),
            points: annotation.points().iter().map(|p| [p.x, p.y]).collect(),
            position: [annotation.position().x, annotation.position().y],
            size: annotation.size,
            color: annotation.color.to_array(),
            text: content.map(|c| c.text.clone()),
            explicit_width: content.map(|c| c.explicit_width),
            text_box_width: content.map(|c| c.text_box_width),
        }
    }
}

impl AnnotationRecord {
    /// Convert to an annotation. Coordinates are clamped on the way in.
    pub fn to_annotation(&self) -> Result<Annotation, FormatError> {
        if !self.size.is_finite() {
            return Err(FormatError::invalid_format(format!(
                "annotation {} has non-finite size",
                self.id
            )));
        }
        let points: Vec<ContentPoint> = self.points.iter().map(|[x, y]| ContentPoint::new(*x, *y)).collect();
        let position = ContentPoint::new(self.position[0], self.position[1]);

        let kind = match self.kind.as_str() {
            "freehand" => AnnotationKind::Freehand,
            "arrow" => AnnotationKind::Arrow,
            "box" => AnnotationKind::Box,
            "circle" => AnnotationKind::Circle,
            "text" => {
                let text = self.text.clone().ok_or_else(|| FormatError::missing_field("text"))?;
                let explicit_width = self.explicit_width.unwrap_or(false);
                let text_box_width = match self.text_box_width {
                    Some(width) if width.is_finite() && width > 0.0 => width,
                    _ => estimate_text_box_width(&text, self.size),
                };
                AnnotationKind::Text(TextContent {
                    text,
                    explicit_width,
                    text_box_width,
                })
            }
            other => return Err(FormatError::unknown_kind(other)),
        };

        if !kind.is_text() {
            let required = match kind {
                AnnotationKind::Freehand => 1,
                _ => 2,
            };
            if points.len() < required {
                return Err(FormatError::invalid_format(format!(
                    "{} annotation {} needs {} points, found {}",
                    kind.name(),
                    self.id,
                    required,
                    points.len()
                )));
            }
        }

        Ok(Annotation::from_parts(
            self.id,
            kind,
            points,
            position,
            self.size,
            Color::from(self.color),
        ))
    }
}
