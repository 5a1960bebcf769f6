// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module for async frame analysis
//!
//! This module binds a frame source to a detector and forwards every
//! decoded value the detection gate accepts. Frames are handed over
//! through a single keep-latest slot, so at most one frame is analyzed at
//! a time and frames arriving meanwhile replace each other.

pub mod pipeline;
pub mod tasks;
pub mod types;

pub use pipeline::FramePipeline;
pub use tasks::{DetectionResult, Detector, QrDetector};
pub use types::{DecodedValue, PipelineStats};
