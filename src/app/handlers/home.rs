// SPDX-License-Identifier: GPL-3.0-only

//! Home handlers
//!
//! Opening the scanner and resolving the camera permission.

use crate::app::navigation::Route;
use crate::app::state::{Message, Notice, ScanApp};
use crate::backends::permission::Capability;
use crate::constants::ui;
use crate::errors::ScanError;
use std::sync::Arc;
use tracing::{debug, info, warn};

impl ScanApp {
    pub(crate) fn handle_open_scanner(&mut self) -> Result<(), ScanError> {
        let top = self.current_route();
        if *top != Route::Home {
            return Err(ScanError::InvalidTransition {
                from: top.name(),
                action: "open the scanner",
            });
        }

        let permission = Arc::clone(&self.capabilities.permission);
        if permission.check_granted(Capability::Camera) {
            return self.handle_permission_resolved(true);
        }

        if self.awaiting_permission {
            debug!("Camera permission request already pending");
            return Ok(());
        }

        info!("Requesting camera permission");
        self.awaiting_permission = true;
        let tx = self.messages_tx.clone();
        tokio::spawn(async move {
            let granted = permission.request(Capability::Camera).await;
            let _ = tx.send(Message::PermissionResolved(granted));
        });
        Ok(())
    }

    pub(crate) fn handle_permission_resolved(&mut self, granted: bool) -> Result<(), ScanError> {
        self.awaiting_permission = false;

        match self.navigation.open_scanner(granted) {
            Ok(change) => {
                self.apply_navigation(change);
                Ok(())
            }
            Err(ScanError::PermissionDenied) => {
                warn!("Camera permission denied");
                self.notice = Some(Notice::new(ui::PERMISSION_DENIED_NOTICE));
                Err(ScanError::PermissionDenied)
            }
            Err(e) => {
                debug!(error = %e, "Permission answer arrived after leaving home, ignoring");
                Ok(())
            }
        }
    }
}
