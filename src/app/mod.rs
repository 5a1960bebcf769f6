// SPDX-License-Identifier: GPL-3.0-only

//! Main application module for the QR scanner
//!
//! This module contains the application state, message handling and the
//! scan flow logic. Screens are rendered by a host shell (see
//! [`crate::terminal`]); this module only decides what is visible and
//! owns the resources tied to each screen.
//!
//! # Architecture
//!
//! - `state`: Application state types (ScanApp, Message, Notice)
//! - `navigation`: Route stack and transition rules
//! - `detection_gate`: Single-acceptance latch for decoded values
//! - `frame_processor`: Frame analysis pipeline and detectors
//! - `result_session`: Lookup lifecycle of one decoded value
//! - `lookup`: Result lookup seam and simulated implementation
//! - `update`: Message dispatch
//! - `handlers`: Message handlers by screen
//!
//! # Control flow
//!
//! ```text
//! Home ──OpenScanner──▶ Scanner ──CodeDetected──▶ Result ──ScanAgain──▶ Home
//!   ▲                      │
//!   └───DismissScanner─────┘
//! ```

pub mod detection_gate;
pub mod frame_processor;
mod handlers;
pub mod lookup;
pub mod navigation;
pub mod result_session;
mod state;
mod update;

pub use detection_gate::{DetectionGate, GateState};
pub use navigation::{NavigationChange, NavigationController, Route, RouteStack};
pub use result_session::{ResultSession, ResultStatus};
pub use state::{Capabilities, Message, Notice, ScanApp};

use crate::app::frame_processor::PipelineStats;
use crate::config::Config;
use std::sync::Arc;
use tokio::sync::mpsc;

impl ScanApp {
    /// Create the application on the Home screen
    pub fn new(config: Config, capabilities: Capabilities) -> Self {
        let (messages_tx, messages_rx) = mpsc::unbounded_channel();
        Self {
            config,
            navigation: NavigationController::new(),
            gate: Arc::new(DetectionGate::new()),
            capabilities,
            pipeline: None,
            session: None,
            notice: None,
            awaiting_permission: false,
            messages_tx,
            messages_rx,
        }
    }

    /// Wait for the next internally produced message
    ///
    /// Detections and permission answers arrive here and must be fed back
    /// through [`update`](Self::update).
    pub async fn next_message(&mut self) -> Option<Message> {
        self.messages_rx.recv().await
    }

    /// Non-blocking variant of [`next_message`](Self::next_message)
    pub fn try_next_message(&mut self) -> Option<Message> {
        self.messages_rx.try_recv().ok()
    }

    /// Sender for host-produced messages
    pub fn message_sender(&self) -> mpsc::UnboundedSender<Message> {
        self.messages_tx.clone()
    }

    pub fn current_route(&self) -> &Route {
        self.navigation.current()
    }

    pub fn routes(&self) -> &RouteStack {
        self.navigation.stack()
    }

    pub fn gate(&self) -> &Arc<DetectionGate> {
        &self.gate
    }

    pub fn session(&self) -> Option<&ResultSession> {
        self.session.as_ref()
    }

    pub fn is_scanning(&self) -> bool {
        self.pipeline
            .as_ref()
            .is_some_and(|pipeline| pipeline.is_running())
    }

    pub fn pipeline_stats(&self) -> Option<PipelineStats> {
        self.pipeline.as_ref().map(|pipeline| pipeline.stats())
    }

    pub fn awaiting_permission(&self) -> bool {
        self.awaiting_permission
    }

    /// Notice text while it is still visible
    pub fn active_notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|notice| notice.is_active())
            .map(|notice| notice.text.as_str())
    }
}
