// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::app::detection_gate::DetectionGate;
use crate::app::frame_processor::{DecodedValue, FramePipeline, tasks::Detector};
use crate::app::lookup::ResultLookup;
use crate::app::navigation::NavigationController;
use crate::app::result_session::ResultSession;
use crate::backends::camera::FrameSource;
use crate::backends::permission::PermissionProvider;
use crate::config::Config;
use crate::constants::ui;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Messages driving the scanner application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // ===== Home =====
    /// User asked to open the scanner
    OpenScanner,
    /// Answer to a pending camera permission request
    PermissionResolved(bool),

    // ===== Scanner =====
    /// The detection gate accepted a value
    CodeDetected(DecodedValue),
    /// User left the scanner without a detection
    DismissScanner,

    // ===== Result =====
    /// User chose "scan again"
    ScanAgain,
    /// User asked to retry a failed lookup
    RetryLookup,

    // ===== Notices =====
    /// Hide the current notice
    DismissNotice,
}

impl From<DecodedValue> for Message {
    fn from(value: DecodedValue) -> Self {
        Message::CodeDetected(value)
    }
}

/// Transient user-visible notice (toast)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub raised_at: Instant,
}

impl Notice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raised_at: Instant::now(),
        }
    }

    /// Whether the notice should still be shown
    pub fn is_active(&self) -> bool {
        self.raised_at.elapsed() < ui::NOTICE_DURATION
    }
}

/// External collaborators the application is wired to
#[derive(Clone)]
pub struct Capabilities {
    pub source: Arc<dyn FrameSource>,
    pub detector: Arc<dyn Detector>,
    pub permission: Arc<dyn PermissionProvider>,
    pub lookup: Arc<dyn ResultLookup>,
}

/// Main application state
///
/// Owns the route stack and everything whose lifetime follows a route:
/// the frame pipeline lives exactly while the scanner is on top, the
/// result session exactly while a result is on top.
pub struct ScanApp {
    /// Loaded configuration
    pub config: Config,
    /// Route stack and navigation rules
    pub(crate) navigation: NavigationController,
    /// Latch shared with the analysis worker
    pub(crate) gate: Arc<DetectionGate>,
    /// External capabilities
    pub(crate) capabilities: Capabilities,
    /// Running pipeline (scanner on top)
    pub(crate) pipeline: Option<FramePipeline>,
    /// Active lookup (result on top)
    pub(crate) session: Option<ResultSession>,
    /// Current toast
    pub(crate) notice: Option<Notice>,
    /// A permission request is in flight
    pub(crate) awaiting_permission: bool,
    /// Message loop (pipeline events, permission answers)
    pub(crate) messages_tx: mpsc::UnboundedSender<Message>,
    pub(crate) messages_rx: mpsc::UnboundedReceiver<Message>,
}
