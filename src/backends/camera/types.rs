// SPDX-License-Identifier: GPL-3.0-only
// Shared types for frame sources

//! Frame types shared by sources, the analysis pipeline and detectors

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Pixel layout of a frame image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Gray8 - 8-bit luma (single channel)
    Gray8,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::RGB24 => 3,
            PixelFormat::RGBA => 4,
        }
    }
}

/// Pixel payload of a frame
///
/// The data is reference counted so detectors can move a handle onto a
/// blocking thread without copying pixels.
#[derive(Clone)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    pub format: PixelFormat,
    pub data: Arc<[u8]>,
}

impl FrameImage {
    /// Tightly packed 8-bit luma image
    pub fn gray8(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width,
            format: PixelFormat::Gray8,
            data: Arc::from(data.into_boxed_slice()),
        }
    }

    /// Check if the image has no pixels to analyze
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Luma of the pixel at (x, y), using BT.601 weights for color formats
    ///
    /// Out-of-range coordinates (short buffers) read as black.
    pub fn luma_at(&self, x: u32, y: u32) -> u8 {
        let offset = y as usize * self.stride as usize + x as usize * self.format.bytes_per_pixel();
        match self.format {
            PixelFormat::Gray8 => self.data.get(offset).copied().unwrap_or(0),
            PixelFormat::RGB24 | PixelFormat::RGBA => {
                let channel = |c: usize| self.data.get(offset + c).copied().unwrap_or(0) as u32;
                ((channel(0) * 299 + channel(1) * 587 + channel(2) * 114) / 1000) as u8
            }
        }
    }
}

impl std::fmt::Debug for FrameImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FrameImage({}x{} {:?}, {} bytes)",
            self.width,
            self.height,
            self.format,
            self.data.len()
        )
    }
}

/// Sensor rotation in degrees (clockwise)
///
/// Carried as orientation metadata. Detectors that are rotation invariant
/// (QR decoding is) only log it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SensorRotation {
    /// No rotation (sensor is oriented correctly)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360)
    ///
    /// Values that are not a multiple of 90 map to `None`.
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            270 => SensorRotation::Rotate270,
            _ => SensorRotation::None,
        }
    }

    pub fn degrees(&self) -> i32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }
}

type ReleaseHook = Box<dyn FnOnce() + Send + Sync>;

/// One camera tick: an optional image plus orientation metadata
///
/// A frame is exclusively owned by whoever holds it. Its release hook runs
/// exactly once, either through [`Frame::release`] or when the frame is
/// dropped, so every exit path of an analysis gives the buffer back to its
/// source.
pub struct Frame {
    sequence: u64,
    image: Option<FrameImage>,
    rotation: SensorRotation,
    captured_at: Instant,
    release: Option<ReleaseHook>,
}

impl Frame {
    pub fn new(sequence: u64, image: Option<FrameImage>, rotation: SensorRotation) -> Self {
        Self {
            sequence,
            image,
            rotation,
            captured_at: Instant::now(),
            release: None,
        }
    }

    /// A tick without image payload (valid "skip" signal)
    pub fn empty(sequence: u64, rotation: SensorRotation) -> Self {
        Self::new(sequence, None, rotation)
    }

    /// Attach the callback that returns the buffer to its source
    pub fn with_release<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.release = Some(Box::new(hook));
        self
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Image payload, `None` when the source had nothing usable
    pub fn image(&self) -> Option<&FrameImage> {
        self.image.as_ref().filter(|image| !image.is_empty())
    }

    pub fn rotation(&self) -> SensorRotation {
        self.rotation
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Release the frame now
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        if let Some(hook) = self.release.take() {
            hook();
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("image", &self.image)
            .field("rotation", &self.rotation.degrees())
            .finish()
    }
}
