//! Tests for document structures and record conversion.

use std::path::Path;

use crate::format::{AnnotationRecord, FormatError, PhotoDocument};
use crate::geometry::ContentPoint;
use crate::model::{Annotation, AnnotationKind, Color, Photo, SourceImage};

fn text_record() -> AnnotationRecord {
    AnnotationRecord {
        id: 1,
        kind: "text".to_string(),
        points: vec![[0.5, 0.5]],
        position: [0.5, 0.5],
        size: 20.0,
        color: [255, 0, 0, 255],
        text: Some("Leak".to_string()),
        explicit_width: Some(false),
        text_box_width: Some(48.0),
    }
}

fn arrow_record() -> AnnotationRecord {
    AnnotationRecord {
        id: 2,
        kind: "arrow".to_string(),
        points: vec![[0.1, 0.2], [0.3, 0.4]],
        position: [0.1, 0.2],
        size: 8.0,
        color: [0, 0, 255, 255],
        text: None,
        explicit_width: None,
        text_box_width: None,
    }
}

#[test]
fn test_text_record_to_annotation() {
    let ann = text_record().to_annotation().unwrap();
    assert_eq!(ann.id, 1);
    assert_eq!(ann.text(), Some("Leak"));
    assert_eq!(ann.position(), ContentPoint::new(0.5, 0.5));
    assert_eq!(ann.color, Color::rgba(255, 0, 0, 255));
    let content = ann.text_content().unwrap();
    assert!(!content.explicit_width);
    assert_eq!(content.text_box_width, 48.0);
}

#[test]
fn test_shape_record_to_annotation() {
    let ann = arrow_record().to_annotation().unwrap();
    assert_eq!(ann.kind(), &AnnotationKind::Arrow);
    assert_eq!(ann.points().len(), 2);
    assert_eq!(ann.size, 8.0);
}

#[test]
fn test_record_roundtrip_through_annotation() {
    for record in [text_record(), arrow_record()] {
        let back = AnnotationRecord::from(&record.to_annotation().unwrap());
        assert_eq!(back, record);
    }
}

#[test]
fn test_unknown_kind_rejected() {
    let mut record = arrow_record();
    record.kind = "hexagon".to_string();
    assert!(matches!(
        record.to_annotation(),
        Err(FormatError::UnknownKind { kind }) if kind == "hexagon"
    ));
}

#[test]
fn test_text_without_text_field_rejected() {
    let mut record = text_record();
    record.text = None;
    assert!(matches!(
        record.to_annotation(),
        Err(FormatError::MissingField { field }) if field == "text"
    ));
}

#[test]
fn test_shape_needs_points() {
    let mut record = arrow_record();
    record.points = vec![[0.1, 0.1]];
    assert!(matches!(
        record.to_annotation(),
        Err(FormatError::InvalidFormat { .. })
    ));
}

#[test]
fn test_out_of_range_coordinates_clamped() {
    let mut record = arrow_record();
    record.points = vec![[-0.5, 0.2], [1.5, 2.0]];
    record.position = [-0.5, 0.2];
    let ann = record.to_annotation().unwrap();
    assert_eq!(ann.points()[0], ContentPoint::new(0.0, 0.2));
    assert_eq!(ann.points()[1], ContentPoint::new(1.0, 1.0));
    assert_eq!(ann.position(), ContentPoint::new(0.0, 0.2));
}

#[test]
fn test_missing_text_box_width_is_estimated() {
    let mut record = text_record();
    record.text_box_width = None;
    let ann = record.to_annotation().unwrap();
    let width = ann.text_content().unwrap().text_box_width;
    assert!((width - 4.0 * 20.0 * 0.6).abs() < 1e-4);
}

#[test]
fn test_from_photo() {
    let mut photo = Photo::new(SourceImage::dimensions_only(4000, 3000));
    let id = photo.allocate_id();
    photo.push(Annotation::new_text(id, ContentPoint::new(0.5, 0.5), "Leak", 20.0, Color::RED));

    let doc = PhotoDocument::from_photo(&photo, Some(Path::new("photo.jpg")));
    assert_eq!(doc.version, PhotoDocument::CURRENT_VERSION);
    assert_eq!(doc.image.width, 4000);
    assert_eq!(doc.image.height, 3000);
    assert_eq!(doc.image.path.as_deref(), Some(Path::new("photo.jpg")));
    assert_eq!(doc.annotations.len(), 1);
    assert_eq!(doc.annotations[0].kind, "text");
}

#[test]
fn test_version_parsing() {
    assert_eq!(PhotoDocument::parse_version("0.1.0"), Some((0, 1, 0)));
    assert_eq!(PhotoDocument::parse_version("10.20.30"), Some((10, 20, 30)));
    assert_eq!(PhotoDocument::parse_version("invalid"), None);
    assert_eq!(PhotoDocument::parse_version("1.2"), None);
    assert_eq!(PhotoDocument::parse_version("1.2.3.4"), None);
}

#[test]
fn test_version_compatibility() {
    assert!(PhotoDocument::is_version_compatible(PhotoDocument::CURRENT_VERSION));
    assert!(PhotoDocument::is_version_compatible("0.1.7"));
    assert!(!PhotoDocument::is_version_compatible("0.2.0"));
    assert!(!PhotoDocument::is_version_compatible("1.0.0"));

    // Other 0.x files are readable with a warning; other majors are not
    assert!(PhotoDocument::is_version_readable("0.2.0"));
    assert!(!PhotoDocument::is_version_readable("1.0.0"));
    assert!(!PhotoDocument::is_version_readable("invalid"));
}
