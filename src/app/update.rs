// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The `update()` function is a dispatcher; handlers live in the
//! `handlers` submodules, one per screen.
//!
//! # Handler Modules
//!
//! - `handlers::home`: scanner entry and permission answers
//! - `handlers::scanner`: detections, dismissal, pipeline lifetime
//! - `handlers::result`: scan again, retry, session lifetime

use crate::app::state::{Message, ScanApp};
use crate::errors::ScanError;
use tracing::debug;

impl ScanApp {
    /// Main message handler - routes messages to appropriate handler methods.
    ///
    /// Must be called within a tokio runtime (handlers spawn the pipeline
    /// worker and lookups). `PermissionDenied` is both returned and raised
    /// as a notice; other errors are rejected navigation actions.
    pub fn update(&mut self, message: Message) -> Result<(), ScanError> {
        debug!(?message, route = self.current_route().name(), "Handling message");

        match message {
            // ===== Home =====
            Message::OpenScanner => self.handle_open_scanner(),
            Message::PermissionResolved(granted) => self.handle_permission_resolved(granted),

            // ===== Scanner =====
            Message::CodeDetected(value) => self.handle_code_detected(value),
            Message::DismissScanner => self.handle_dismiss_scanner(),

            // ===== Result =====
            Message::ScanAgain => self.handle_scan_again(),
            Message::RetryLookup => self.handle_retry_lookup(),

            // ===== Notices =====
            Message::DismissNotice => {
                self.notice = None;
                Ok(())
            }
        }
    }
}
