//! A photo: source image plus its ordered annotation list.

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;

use crate::geometry::Size;
use crate::model::{Annotation, AnnotationId};

/// The source image supplied by the caller.
///
/// Pixels are shared (`Arc`) so export snapshots do not copy them. Pixels may
/// be absent when only the dimensions are known (e.g. while editing
/// annotations of a photo whose pixels live elsewhere).
#[derive(Debug, Clone)]
pub struct SourceImage {
    width: u32,
    height: u32,
    pixels: Option<Arc<RgbaImage>>,
}

impl SourceImage {
    /// Wrap decoded pixels.
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        Self {
            width,
            height,
            pixels: Some(Arc::new(pixels)),
        }
    }

    /// Dimensions without pixel data.
    pub fn dimensions_only(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: None,
        }
    }

    /// Decode an image file with the `image` crate.
    pub fn open(path: &Path) -> Result<Self, image::ImageError> {
        let pixels = image::open(path)?.to_rgba8();
        log::info!(
            "Loaded source image {:?} ({}x{})",
            path,
            pixels.width(),
            pixels.height()
        );
        Ok(Self::from_rgba(pixels))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::from((self.width, self.height))
    }

    pub fn pixels(&self) -> Option<&Arc<RgbaImage>> {
        self.pixels.as_ref()
    }
}

/// A photo and its annotations. List order is z-order: later entries are on top.
#[derive(Debug, Clone)]
pub struct Photo {
    image: SourceImage,
    annotations: Vec<Annotation>,
    next_id: AnnotationId,
}

impl Photo {
    pub fn new(image: SourceImage) -> Self {
        Self {
            image,
            annotations: Vec::new(),
            next_id: 1,
        }
    }

    /// Create a photo with previously stored annotations.
    pub fn with_annotations(image: SourceImage, annotations: Vec<Annotation>) -> Self {
        let next_id = annotations
            .iter()
            .map(|a| a.id)
            .max()
            .map_or(1, |max| max.checked_add(1).unwrap_or(1));
        Self {
            image,
            annotations,
            next_id,
        }
    }

    pub fn image(&self) -> &SourceImage {
        &self.image
    }

    pub fn image_size(&self) -> Size {
        self.image.size()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn get(&self, index: usize) -> Option<&Annotation> {
        self.annotations.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Annotation> {
        self.annotations.get_mut(index)
    }

    /// Index of the annotation with the given ID.
    pub fn index_of(&self, id: AnnotationId) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Reserve a fresh annotation ID.
    ///
    /// IDs count up from the highest one seen. Once `u64::MAX` is in use the
    /// counter wraps to 1 and skips IDs still present in the list.
    pub fn allocate_id(&mut self) -> AnnotationId {
        loop {
            let id = self.next_id;
            self.next_id = id.checked_add(1).unwrap_or(1);
            if id != 0 && self.index_of(id).is_none() {
                return id;
            }
        }
    }

    /// Append an annotation on top and return its index.
    pub fn push(&mut self, annotation: Annotation) -> usize {
        if let Some(after) = annotation.id.checked_add(1) {
            self.next_id = self.next_id.max(after);
        }
        self.annotations.push(annotation);
        self.annotations.len() - 1
    }

    /// Remove the annotation at `index`. Out-of-range indices are a no-op.
    pub fn remove(&mut self, index: usize) -> Option<Annotation> {
        if index >= self.annotations.len() {
            log::debug!("Ignoring removal of missing annotation index {}", index);
            return None;
        }
        Some(self.annotations.remove(index))
    }

    /// Remove the most recently added annotation.
    pub fn pop_last(&mut self) -> Option<Annotation> {
        self.annotations.pop()
    }

    /// Copy of the annotation list, independent of later edits.
    pub fn snapshot(&self) -> Vec<Annotation> {
        self.annotations.clone()
    }

    /// Remove all annotations.
    pub fn clear(&mut self) {
        self.annotations.clear();
    }
}
