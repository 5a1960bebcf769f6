// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements QR code detection using the rqrr crate.
//! Frames are converted to luma and downscaled before the grid search,
//! which runs on the blocking thread pool.

use super::{DetectionResult, Detector};
use crate::app::frame_processor::types::DecodedValue;
use crate::backends::camera::types::{Frame, FrameImage};
use crate::constants::frames;
use crate::errors::ScanError;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, trace};

/// QR code detector
///
/// Analyzes camera frames to detect and decode QR codes.
/// Optimized for real-time processing with frame downscaling.
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    pub fn new() -> Self {
        Self {
            max_dimension: frames::DETECTOR_MAX_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl Detector for QrDetector {
    fn analyze<'a>(&'a self, frame: &'a Frame) -> BoxFuture<'a, DetectionResult> {
        let max_dim = self.max_dimension;
        let image = frame.image().cloned();
        let sequence = frame.sequence();
        let rotation = frame.rotation().degrees();

        async move {
            let Some(image) = image else {
                return Err(ScanError::FrameUnusable);
            };
            trace!(sequence, rotation, "Analyzing frame");

            // Grid search is CPU bound, keep it off the async workers
            tokio::task::spawn_blocking(move || detect_sync(&image, max_dim))
                .await
                .map_err(|e| ScanError::DetectionFailure(format!("detection task failed: {}", e)))
        }
        .boxed()
    }
}

/// Synchronous QR detection (runs in blocking task)
fn detect_sync(image: &FrameImage, max_dimension: u32) -> Vec<DecodedValue> {
    let start = std::time::Instant::now();
    let (luma, width, height) = prepare_luma(image, max_dimension);
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| luma[y * width + x]);
    let grids = prepared.detect_grids();

    trace!(
        grids = grids.len(),
        width,
        height,
        detection_ms = start.elapsed().as_millis() as u64,
        "QR grid search complete"
    );

    let mut values = Vec::with_capacity(grids.len());
    for grid in grids {
        match grid.decode() {
            Ok((_meta, content)) => {
                debug!(content = %content, "Detected QR code");
                values.push(DecodedValue::from(content));
            }
            Err(e) => {
                debug!(error = %e, "Failed to decode QR grid");
            }
        }
    }

    values
}

/// Convert a frame image to a packed luma buffer no larger than `max_dimension`
///
/// Returns the buffer with its width and height.
fn prepare_luma(image: &FrameImage, max_dimension: u32) -> (Vec<u8>, usize, usize) {
    let (src_width, src_height) = (image.width, image.height);
    if src_width == 0 || src_height == 0 {
        return (Vec::new(), 0, 0);
    }

    let scale = (src_width as f32 / max_dimension as f32)
        .max(src_height as f32 / max_dimension as f32)
        .max(1.0);
    let dst_width = ((src_width as f32 / scale) as u32).max(1);
    let dst_height = ((src_height as f32 / scale) as u32).max(1);

    let mut luma = Vec::with_capacity((dst_width * dst_height) as usize);
    if scale == 1.0 {
        for y in 0..src_height {
            for x in 0..src_width {
                luma.push(image.luma_at(x, y));
            }
        }
    } else {
        let x_ratio = src_width as f32 / dst_width as f32;
        let y_ratio = src_height as f32 / dst_height as f32;

        // Bilinear sampling keeps finder pattern edges sharp enough
        for y in 0..dst_height {
            for x in 0..dst_width {
                let src_x = x as f32 * x_ratio;
                let src_y = y as f32 * y_ratio;

                let x0 = src_x as u32;
                let y0 = src_y as u32;
                let x1 = (x0 + 1).min(src_width - 1);
                let y1 = (y0 + 1).min(src_height - 1);
                let x_frac = src_x - x0 as f32;
                let y_frac = src_y - y0 as f32;

                let p00 = image.luma_at(x0, y0) as f32;
                let p01 = image.luma_at(x1, y0) as f32;
                let p10 = image.luma_at(x0, y1) as f32;
                let p11 = image.luma_at(x1, y1) as f32;

                let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
                    + p01 * x_frac * (1.0 - y_frac)
                    + p10 * (1.0 - x_frac) * y_frac
                    + p11 * x_frac * y_frac;
                luma.push(value as u8);
            }
        }
    }

    (luma, dst_width as usize, dst_height as usize)
}
