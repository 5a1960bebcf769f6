// SPDX-License-Identifier: GPL-3.0-only

//! Frame analysis tasks
//!
//! This module contains the detector abstraction and the QR code
//! implementation used by the scanner.

pub mod qr_detector;

pub use qr_detector::QrDetector;

use crate::app::frame_processor::types::DecodedValue;
use crate::backends::camera::types::Frame;
use crate::errors::ScanError;
use futures::future::BoxFuture;

/// Outcome of analyzing one frame
pub type DetectionResult = Result<Vec<DecodedValue>, ScanError>;

/// Capability that decodes values from a single frame
///
/// Stateless across calls. The frame stays owned by the caller, which
/// releases it once the returned future completes or is dropped.
///
/// A dropped `analyze` future does not cancel work already handed to the
/// blocking pool: such work may keep reading its own clone of the image
/// after the frame went back to the source. Implementations must not
/// borrow the frame's buffer into blocking work.
pub trait Detector: Send + Sync {
    fn analyze<'a>(&'a self, frame: &'a Frame) -> BoxFuture<'a, DetectionResult>;
}
