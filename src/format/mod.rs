//! Annotation persistence.
//!
//! Annotations are stored as a versioned JSON document ([`PhotoDocument`])
//! with one record per annotation. Loading is lenient per record: malformed
//! records or unknown kinds are dropped and reported in [`LoadReport`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use photomark::format;
//!
//! let report = format::load(path)?;
//! for warning in &report.warnings {
//!     eprintln!("{}", warning);
//! }
//! let photo = report.into_photo(source);
//! ```

mod document;
mod error;
mod json;
mod warning;

#[cfg(test)]
mod tests;

pub use document::{AnnotationRecord, ImageEntry, PhotoDocument};
pub use error::FormatError;
pub use json::{load, load_from_bytes, save, save_photo, save_to_bytes, sidecar_path, LoadReport};
pub use warning::{FormatWarning, WarningSeverity};
