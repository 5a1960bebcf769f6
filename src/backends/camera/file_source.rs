// SPDX-License-Identifier: GPL-3.0-only

//! Image-file frame source
//!
//! Stands in for a live camera: loads still images once and replays them
//! as a continuous frame feed from a capture loop thread.

use super::FrameSource;
use super::frame_loop::{CaptureLoopController, LoopAction};
use super::frame_slot::FrameSink;
use super::types::{Frame, FrameImage, SensorRotation};
use crate::constants::file_formats;
use crate::errors::{CameraError, CameraResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Load an image file as a luma frame image
pub fn load_image_as_frame(path: &Path) -> CameraResult<FrameImage> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if !file_formats::is_image_extension(extension) {
        return Err(CameraError::SourceUnavailable(format!(
            "Unsupported file format: {}",
            path.display()
        )));
    }

    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        CameraError::Io(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();
    debug!(width, height, "Image loaded successfully");

    Ok(FrameImage::gray8(width, height, luma.into_raw()))
}

/// Frame source replaying still images
pub struct FileFrameSource {
    name: String,
    images: Arc<Vec<FrameImage>>,
    interval: Duration,
    rotation: SensorRotation,
    /// Emit an empty tick after every N images (simulates sensor warm-up gaps)
    blank_every: Option<u32>,
    controller: Mutex<Option<CaptureLoopController>>,
    released: Arc<AtomicU64>,
}

impl FileFrameSource {
    /// Load every path up front so bind never fails on I/O
    pub fn open(paths: &[PathBuf], interval: Duration) -> CameraResult<Self> {
        if paths.is_empty() {
            return Err(CameraError::SourceUnavailable(
                "no image files given".to_string(),
            ));
        }
        let images = paths
            .iter()
            .map(|path| load_image_as_frame(path))
            .collect::<CameraResult<Vec<_>>>()?;
        Ok(Self::from_images(images, interval))
    }

    pub fn from_images(images: Vec<FrameImage>, interval: Duration) -> Self {
        Self {
            name: "file-source".to_string(),
            images: Arc::new(images),
            interval,
            rotation: SensorRotation::None,
            blank_every: None,
            controller: Mutex::new(None),
            released: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stamp every emitted frame with this rotation
    pub fn with_rotation(mut self, rotation: SensorRotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_blank_every(mut self, every: u32) -> Self {
        self.blank_every = (every > 0).then_some(every);
        self
    }

    /// Frames given back by the consumer so far
    pub fn released_count(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }
}

impl FrameSource for FileFrameSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&self, sink: FrameSink) -> CameraResult<()> {
        let mut controller = self.controller.lock().unwrap_or_else(|e| e.into_inner());
        if controller.as_ref().is_some_and(|c| c.is_running()) {
            return Err(CameraError::AlreadyBound);
        }
        if self.images.is_empty() {
            return Err(CameraError::SourceUnavailable(
                "no images loaded".to_string(),
            ));
        }

        let images = Arc::clone(&self.images);
        let released = Arc::clone(&self.released);
        let rotation = self.rotation;
        let blank_every = self.blank_every;
        let mut sequence: u64 = 0;
        let mut index: usize = 0;
        let mut since_blank: u32 = 0;

        *controller = Some(CaptureLoopController::start(
            &self.name,
            self.interval,
            move || {
                sequence += 1;
                let image = match blank_every {
                    Some(every) if since_blank >= every => {
                        since_blank = 0;
                        None
                    }
                    _ => {
                        since_blank += 1;
                        let image = images[index % images.len()].clone();
                        index += 1;
                        Some(image)
                    }
                };

                let released = Arc::clone(&released);
                let frame = Frame::new(sequence, image, rotation).with_release(move || {
                    released.fetch_add(1, Ordering::SeqCst);
                });

                if sink.push(frame) {
                    LoopAction::Continue
                } else {
                    LoopAction::Stop
                }
            },
        ));

        info!(name = %self.name, images = self.images.len(), "File source bound");
        Ok(())
    }

    fn unbind(&self) {
        let controller = self
            .controller
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(mut controller) = controller {
            controller.stop();
            info!(name = %self.name, "File source unbound");
        }
    }
}

impl Drop for FileFrameSource {
    fn drop(&mut self) {
        self.unbind();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::frame_slot::frame_slot;

    fn source() -> FileFrameSource {
        FileFrameSource::from_images(
            vec![FrameImage::gray8(2, 2, vec![0, 255, 255, 0])],
            Duration::from_millis(1),
        )
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let err = load_image_as_frame(Path::new("clip.mp4")).unwrap_err();
        assert!(matches!(err, CameraError::SourceUnavailable(_)));
    }

    #[test]
    fn test_open_requires_paths() {
        assert!(FileFrameSource::open(&[], Duration::from_millis(10)).is_err());
    }

    #[tokio::test]
    async fn test_bind_twice_fails() {
        let source = source();
        let (sink, _receiver) = frame_slot();
        source.bind(sink.clone()).unwrap();
        assert_eq!(source.bind(sink), Err(CameraError::AlreadyBound));
        source.unbind();
    }

    #[tokio::test]
    async fn test_frames_flow_and_are_released() {
        let source = source().with_rotation(SensorRotation::Rotate90);
        let (sink, receiver) = frame_slot();
        source.bind(sink).unwrap();

        let frame = receiver.recv().await.unwrap();
        assert_eq!(frame.rotation().degrees(), 90);
        assert!(frame.image().is_some());
        frame.release();

        source.unbind();
        drop(receiver);
        assert!(source.released_count() >= 1);
    }

    #[tokio::test]
    async fn test_blank_ticks_are_emitted() {
        let source = source().with_blank_every(1);
        let (sink, receiver) = frame_slot();
        source.bind(sink).unwrap();

        let mut saw_blank = false;
        for _ in 0..20 {
            let frame = receiver.recv().await.unwrap();
            if frame.image().is_none() {
                saw_blank = true;
                break;
            }
        }
        source.unbind();
        assert!(saw_blank);
    }
}
