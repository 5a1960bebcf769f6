// SPDX-License-Identifier: GPL-3.0-only

//! Frame source abstraction
//!
//! ```text
//! ┌──────────────────┐  push (keep-latest)  ┌───────────────┐
//! │   FrameSource    │ ───────────────────▶ │   FrameSlot   │
//! │ (file, test, …)  │                      │ (1 pending)   │
//! └──────────────────┘                      └───────┬───────┘
//!                                                   │ recv
//!                                                   ▼
//!                                          ┌─────────────────┐
//!                                          │  FramePipeline  │
//!                                          └─────────────────┘
//! ```

pub mod file_source;
pub mod frame_loop;
pub mod frame_slot;
pub mod types;

pub use file_source::FileFrameSource;
pub use frame_slot::{FrameReceiver, FrameSink, frame_slot};
pub use types::*;

use crate::errors::CameraResult;

/// Capability that supplies a continuous sequence of frames
///
/// Implementations push frames into the sink until unbound. Every frame
/// carries its own release hook, so a source learns about consumed and
/// dropped buffers without any extra bookkeeping by the consumer.
pub trait FrameSource: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Start delivering frames into `sink`
    ///
    /// Fails with `AlreadyBound` if the source is feeding another sink.
    fn bind(&self, sink: FrameSink) -> CameraResult<()>;

    /// Stop delivering frames. Must be idempotent.
    fn unbind(&self);
}
