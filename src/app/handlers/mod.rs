// SPDX-License-Identifier: GPL-3.0-only

//! Message handler modules
//!
//! Handlers are grouped by the screen they act on. Every successful
//! navigation step goes through [`ScanApp::apply_navigation`], which tears
//! down what belonged to the route being left and sets up what belongs to
//! the route being entered.

pub mod home;
pub mod result;
pub mod scanner;

use crate::app::navigation::{NavigationChange, Route};
use crate::app::state::{Message, ScanApp};
use tracing::debug;

impl ScanApp {
    pub(crate) fn apply_navigation(&mut self, change: NavigationChange) {
        let NavigationChange { from, to } = change;

        match from {
            Route::Scanner => self.leave_scanner(),
            Route::Result(_) => self.leave_result(),
            Route::Home => {}
        }

        match to {
            Route::Scanner => self.enter_scanner(),
            Route::Result(value) => self.enter_result(value),
            Route::Home => {}
        }
    }

    /// Drop detections still queued from an earlier scanner visit
    pub(crate) fn purge_stale_detections(&mut self) {
        let mut kept = Vec::new();
        let mut purged = 0usize;
        while let Ok(message) = self.messages_rx.try_recv() {
            match message {
                Message::CodeDetected(_) => purged += 1,
                other => kept.push(other),
            }
        }
        for message in kept {
            let _ = self.messages_tx.send(message);
        }
        if purged > 0 {
            debug!(purged, "Purged stale detections");
        }
    }
}
