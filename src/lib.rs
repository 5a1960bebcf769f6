// SPDX-License-Identifier: GPL-3.0-only

//! qrscan - QR scan-and-lookup core
//!
//! Scans frames from a camera-like source for QR codes, accepts exactly
//! one decoded value per scanner visit, and runs a result lookup for it.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Scan flow (navigation, detection gate, pipeline, result session)
//! - [`backends`]: Frame sources and permission providers
//! - [`config`]: User configuration handling
//! - [`terminal`]: Interactive terminal front end
//!
//! # Example
//!
//! ```ignore
//! // Interactive scanner over image files:
//! // qrscan terminal code1.png code2.png
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod terminal;

// Re-export commonly used types
pub use app::frame_processor::{DecodedValue, FramePipeline, QrDetector};
pub use app::{Capabilities, Message, Route, ScanApp};
pub use config::Config;
pub use errors::{AppError, AppResult, ScanError};
