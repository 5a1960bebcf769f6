// SPDX-License-Identifier: GPL-3.0-only

//! Result handlers

use crate::app::frame_processor::DecodedValue;
use crate::app::result_session::ResultSession;
use crate::app::state::ScanApp;
use crate::errors::ScanError;
use std::sync::Arc;
use tracing::debug;

impl ScanApp {
    pub(crate) fn handle_scan_again(&mut self) -> Result<(), ScanError> {
        let change = self.navigation.scan_again()?;
        self.apply_navigation(change);
        Ok(())
    }

    pub(crate) fn handle_retry_lookup(&mut self) -> Result<(), ScanError> {
        let from = self.current_route().name();
        match self.session.as_mut() {
            Some(session) if self.navigation.current().is_result() => {
                session.retry();
                Ok(())
            }
            _ => Err(ScanError::InvalidTransition {
                from,
                action: "retry the lookup",
            }),
        }
    }

    pub(crate) fn enter_result(&mut self, value: DecodedValue) {
        let mut session = ResultSession::new(value, Arc::clone(&self.capabilities.lookup));
        session.start();
        self.session = Some(session);
    }

    pub(crate) fn leave_result(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(session = %session.id(), "Result closed");
        }
    }
}
