//! Background thread for export rendering.
//!
//! Each request carries an immutable snapshot (shared source pixels plus a
//! cloned annotation list) and a generation number. The thread only renders
//! the newest request it has queued, and results older than the latest
//! request are dropped on receipt, so the last request always wins.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use image::RgbaImage;
use photomark_raster::RasterError;
use thiserror::Error;

use crate::compositor::Compositor;
use crate::model::{Annotation, Photo};

/// Errors from export rendering and saving.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to spawn export thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Export thread is no longer running")]
    Disconnected,

    #[error("No export request is pending")]
    NothingPending,

    #[error("Photo has no pixel data to export")]
    NoPixels,

    #[error("Render failed: {0}")]
    Render(#[from] RasterError),

    #[error("Failed to save image: {0}")]
    Save(#[from] image::ImageError),
}

/// Snapshot sent to the export thread.
struct ExportRequest {
    generation: u64,
    source: Arc<RgbaImage>,
    annotations: Vec<Annotation>,
}

/// Message sent to the export thread.
enum ThreadMessage {
    Render(ExportRequest),
    Shutdown,
}

/// A finished render.
pub struct ExportResult {
    pub generation: u64,
    pub image: Result<RgbaImage, ExportError>,
}

/// Owns the export thread.
pub struct ExportWorker {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<ExportResult>,
    thread_handle: Option<JoinHandle<()>>,
    /// Generation of the most recent request
    latest: u64,
    /// Generation of the last result handed to the caller
    delivered: u64,
}

impl ExportWorker {
    /// Spawn the export thread with its own compositor.
    pub fn spawn(compositor: Compositor) -> Result<Self, ExportError> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<ExportResult>();

        let thread_handle = thread::Builder::new()
            .name("photomark-export".to_string())
            .spawn(move || {
                log::debug!("Export thread started");
                Self::thread_loop(&compositor, request_rx, result_tx);
                log::debug!("Export thread exiting");
            })
            .map_err(ExportError::Spawn)?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            latest: 0,
            delivered: 0,
        })
    }

    fn thread_loop(
        compositor: &Compositor,
        request_rx: Receiver<ThreadMessage>,
        result_tx: Sender<ExportResult>,
    ) {
        while let Ok(message) = request_rx.recv() {
            let mut newest = match message {
                ThreadMessage::Render(request) => request,
                ThreadMessage::Shutdown => break,
            };

            // Skip to the newest queued request
            let mut shutdown = false;
            loop {
                match request_rx.try_recv() {
                    Ok(ThreadMessage::Render(request)) => {
                        log::debug!("Superseding export {} with {}", newest.generation, request.generation);
                        newest = request;
                    }
                    Ok(ThreadMessage::Shutdown) => {
                        shutdown = true;
                        break;
                    }
                    Err(_) => break,
                }
            }
            if shutdown {
                break;
            }

            let image = compositor
                .render(&newest.source, &newest.annotations)
                .map_err(ExportError::from);
            let result = ExportResult {
                generation: newest.generation,
                image,
            };
            if result_tx.send(result).is_err() {
                log::warn!("Export result channel closed");
                break;
            }
        }
    }

    /// Queue a render of `annotations` over `source`. Returns its generation.
    pub fn request(&mut self, source: Arc<RgbaImage>, annotations: Vec<Annotation>) -> Result<u64, ExportError> {
        self.latest += 1;
        let request = ExportRequest {
            generation: self.latest,
            source,
            annotations,
        };
        self.request_tx
            .send(ThreadMessage::Render(request))
            .map_err(|_| ExportError::Disconnected)?;
        log::debug!("Queued export generation {}", self.latest);
        Ok(self.latest)
    }

    /// Queue a render of a photo's current state.
    pub fn request_photo(&mut self, photo: &Photo) -> Result<u64, ExportError> {
        let source = photo.image().pixels().cloned().ok_or(ExportError::NoPixels)?;
        self.request(source, photo.snapshot())
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest
    }

    /// Take the result of the latest request if it is ready. Non-blocking;
    /// stale results are discarded.
    pub fn try_take_latest(&mut self) -> Option<Result<RgbaImage, ExportError>> {
        loop {
            match self.result_rx.try_recv() {
                Ok(result) => {
                    if let Some(image) = self.accept(result) {
                        return Some(image);
                    }
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => return Some(Err(ExportError::Disconnected)),
            }
        }
    }

    /// Block until the latest request has been rendered.
    ///
    /// Fails with [`ExportError::NothingPending`] when the latest result was
    /// already taken or nothing was requested.
    pub fn wait_latest(&mut self) -> Result<RgbaImage, ExportError> {
        if self.delivered >= self.latest {
            return Err(ExportError::NothingPending);
        }
        loop {
            let result = self.result_rx.recv().map_err(|_| ExportError::Disconnected)?;
            if let Some(image) = self.accept(result) {
                return image;
            }
        }
    }

    fn accept(&mut self, result: ExportResult) -> Option<Result<RgbaImage, ExportError>> {
        if result.generation < self.latest {
            log::debug!(
                "Discarding stale export {} (latest {})",
                result.generation,
                self.latest
            );
            return None;
        }
        self.delivered = result.generation;
        Some(result.image)
    }
}

impl Drop for ExportWorker {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Export thread panicked: {:?}", e);
            }
        }
    }
}

/// Save a rendered image; the format follows the file extension.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<(), ExportError> {
    image.save(path)?;
    log::info!("Saved {}x{} export to {:?}", image.width(), image.height(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ContentPoint;
    use crate::model::{AnnotationKind, Color, SourceImage};

    fn source() -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_pixel(64, 64, image::Rgba([10, 10, 10, 255])))
    }

    fn stroke(color: Color) -> Annotation {
        Annotation::new_shape(
            1,
            AnnotationKind::Freehand,
            vec![ContentPoint::new(0.0, 0.5), ContentPoint::new(1.0, 0.5)],
            8.0,
            color,
        )
        .unwrap()
    }

    #[test]
    fn test_renders_request() {
        let mut worker = ExportWorker::spawn(Compositor::default()).unwrap();
        let generation = worker.request(source(), vec![stroke(Color::rgb(0, 255, 0))]).unwrap();
        assert_eq!(generation, 1);
        let image = worker.wait_latest().unwrap();
        assert_eq!(image.get_pixel(32, 32).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_last_request_wins() {
        let mut worker = ExportWorker::spawn(Compositor::default()).unwrap();
        for _ in 0..5 {
            worker.request(source(), vec![stroke(Color::rgb(255, 0, 0))]).unwrap();
        }
        worker.request(source(), vec![stroke(Color::rgb(0, 0, 255))]).unwrap();
        assert_eq!(worker.latest_generation(), 6);

        let image = worker.wait_latest().unwrap();
        assert_eq!(image.get_pixel(32, 32).0, [0, 0, 255, 255]);
        // Nothing older is delivered afterwards
        assert!(worker.try_take_latest().is_none());
    }

    #[test]
    fn test_wait_after_result_taken_does_not_block() {
        let mut worker = ExportWorker::spawn(Compositor::default()).unwrap();
        assert!(matches!(worker.wait_latest(), Err(ExportError::NothingPending)));

        worker.request(source(), vec![stroke(Color::rgb(0, 255, 0))]).unwrap();
        let taken = loop {
            if let Some(result) = worker.try_take_latest() {
                break result;
            }
            std::thread::yield_now();
        };
        assert!(taken.is_ok());
        assert!(matches!(worker.wait_latest(), Err(ExportError::NothingPending)));

        // A new request can be waited on again
        worker.request(source(), vec![stroke(Color::rgb(0, 0, 255))]).unwrap();
        assert_eq!(worker.wait_latest().unwrap().get_pixel(32, 32).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_snapshot_unaffected_by_later_edits() {
        let mut photo = Photo::new(SourceImage::from_rgba((*source()).clone()));
        photo.push(stroke(Color::rgb(0, 255, 0)));
        let mut worker = ExportWorker::spawn(Compositor::default()).unwrap();
        worker.request_photo(&photo).unwrap();
        photo.clear();
        let image = worker.wait_latest().unwrap();
        assert_eq!(image.get_pixel(32, 32).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_photo_without_pixels() {
        let photo = Photo::new(SourceImage::dimensions_only(10, 10));
        let mut worker = ExportWorker::spawn(Compositor::default()).unwrap();
        assert!(matches!(worker.request_photo(&photo), Err(ExportError::NoPixels)));
    }
}
