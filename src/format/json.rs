//! JSON reading and writing of [`PhotoDocument`]s.
//!
//! Records are parsed one at a time, so a single unreadable annotation is
//! dropped with a warning instead of failing the whole document.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::format::document::{AnnotationRecord, ImageEntry, PhotoDocument};
use crate::format::error::FormatError;
use crate::format::warning::FormatWarning;
use crate::model::{Annotation, Photo, SourceImage};

/// Result of loading a document.
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Version string found in the file.
    pub version: String,
    pub image: ImageEntry,
    /// Annotations that loaded, in document order.
    pub annotations: Vec<Annotation>,
    /// Problems encountered; each dropped record has one.
    pub warnings: Vec<FormatWarning>,
}

impl LoadReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Build a photo from the loaded annotations.
    pub fn into_photo(self, image: SourceImage) -> Photo {
        if (image.width(), image.height()) != (self.image.width, self.image.height) {
            log::warn!(
                "Document was made for a {}x{} image, source is {}x{}",
                self.image.width,
                self.image.height,
                image.width(),
                image.height()
            );
        }
        Photo::with_annotations(image, self.annotations)
    }
}

/// Document with annotations left as raw JSON values.
#[derive(Deserialize)]
struct RawDocument {
    version: String,
    image: ImageEntry,
    #[serde(default)]
    annotations: Vec<serde_json::Value>,
}

/// Serialize a document to pretty-printed JSON bytes.
pub fn save_to_bytes(document: &PhotoDocument) -> Result<Vec<u8>, FormatError> {
    let json = serde_json::to_string_pretty(document)?;
    Ok(json.into_bytes())
}

/// Write a document to `path`.
pub fn save(document: &PhotoDocument, path: &Path) -> Result<(), FormatError> {
    let bytes = save_to_bytes(document)?;
    std::fs::write(path, &bytes)?;
    log::info!(
        "Saved {} annotations to {:?}",
        document.annotations.len(),
        path
    );
    Ok(())
}

/// Convenience: snapshot `photo` and write it to `path`.
pub fn save_photo(photo: &Photo, image_path: Option<&Path>, path: &Path) -> Result<(), FormatError> {
    save(&PhotoDocument::from_photo(photo, image_path), path)
}

/// Parse a document from JSON bytes.
pub fn load_from_bytes(bytes: &[u8]) -> Result<LoadReport, FormatError> {
    let raw: RawDocument = serde_json::from_slice(bytes)?;
    let mut warnings = Vec::new();

    if !PhotoDocument::is_version_readable(&raw.version) {
        return Err(FormatError::VersionMismatch {
            expected: PhotoDocument::CURRENT_VERSION.to_string(),
            found: raw.version,
        });
    }
    if !PhotoDocument::is_version_compatible(&raw.version) {
        log::warn!(
            "Document version {} may not be fully compatible with current version {} \
             (version 0.x.x is unstable - format may have changed)",
            raw.version,
            PhotoDocument::CURRENT_VERSION
        );
        warnings.push(FormatWarning::info(format!(
            "document version {} differs from {}",
            raw.version,
            PhotoDocument::CURRENT_VERSION
        )));
    }

    let mut annotations = Vec::with_capacity(raw.annotations.len());
    let mut seen_ids = HashSet::new();
    for (index, value) in raw.annotations.into_iter().enumerate() {
        let parsed = serde_json::from_value::<AnnotationRecord>(value)
            .map_err(FormatError::from)
            .and_then(|record| record.to_annotation());
        match parsed {
            Ok(annotation) => {
                if !seen_ids.insert(annotation.id) {
                    log::warn!("Dropping annotation record {}: duplicate id {}", index, annotation.id);
                    warnings.push(
                        FormatWarning::warning(format!("duplicate id {}", annotation.id)).with_record(index),
                    );
                    continue;
                }
                annotations.push(annotation);
            }
            Err(e) => {
                log::warn!("Dropping annotation record {}: {}", index, e);
                warnings.push(FormatWarning::warning(e.to_string()).with_record(index));
            }
        }
    }

    log::info!(
        "Loaded {} annotations ({} dropped, format version {})",
        annotations.len(),
        warnings.iter().filter(|w| w.record_index.is_some()).count(),
        raw.version
    );

    Ok(LoadReport {
        version: raw.version,
        image: raw.image,
        annotations,
        warnings,
    })
}

/// Read a document from `path`.
pub fn load(path: &Path) -> Result<LoadReport, FormatError> {
    log::info!("Loading annotations from {:?}", path);
    let bytes = std::fs::read(path)?;
    load_from_bytes(&bytes)
}

/// Default document path next to an image: `photo.jpg` -> `photo.jpg.photomark.json`.
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    let mut name = image_path.as_os_str().to_owned();
    name.push(".photomark.json");
    PathBuf::from(name)
}
