// SPDX-License-Identifier: GPL-3.0-only

//! Scanner handlers
//!
//! The frame pipeline runs exactly while the scanner is the visible route.

use crate::app::frame_processor::{DecodedValue, FramePipeline};
use crate::app::navigation::Route;
use crate::app::state::{Notice, ScanApp};
use crate::constants::ui;
use crate::errors::ScanError;
use std::sync::Arc;
use tracing::{debug, error, info};

impl ScanApp {
    pub(crate) fn handle_code_detected(&mut self, value: DecodedValue) -> Result<(), ScanError> {
        // Only the value that fired the current arm cycle navigates
        if *self.current_route() != Route::Scanner
            || self.gate.accepted().as_ref() != Some(&value)
        {
            debug!(value = %value, "Discarding stale detection");
            return Ok(());
        }

        info!(value = %value, "Code detected");
        let change = self.navigation.show_result(value)?;
        self.apply_navigation(change);
        Ok(())
    }

    pub(crate) fn handle_dismiss_scanner(&mut self) -> Result<(), ScanError> {
        let change = self.navigation.dismiss_scanner()?;
        self.apply_navigation(change);
        Ok(())
    }

    pub(crate) fn enter_scanner(&mut self) {
        self.gate.reset();
        self.purge_stale_detections();

        match FramePipeline::start(
            Arc::clone(&self.capabilities.source),
            Arc::clone(&self.capabilities.detector),
            Arc::clone(&self.gate),
            self.messages_tx.clone(),
        ) {
            Ok(pipeline) => self.pipeline = Some(pipeline),
            Err(e) => {
                error!(error = %e, "Failed to start frame pipeline");
                self.notice = Some(Notice::new(format!(
                    "{}: {}",
                    ui::CAMERA_UNAVAILABLE_NOTICE,
                    e
                )));
                // Nothing to scan with; fall back to home
                if let Err(e) = self.navigation.dismiss_scanner() {
                    error!(error = %e, "Failed to leave scanner");
                }
            }
        }
    }

    pub(crate) fn leave_scanner(&mut self) {
        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.stop();
            debug!(stats = ?pipeline.stats(), "Scanner closed");
        }
    }
}
