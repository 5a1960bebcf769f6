// SPDX-License-Identifier: GPL-3.0-only
//! Paced capture loop threads
//!
//! Frame sources that produce frames on their own schedule run a
//! capture loop on a dedicated thread. The loop body is called once per
//! tick; the stop request doubles as the pacing timer, so stopping never
//! waits out a full interval.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Action returned by the loop body to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Wait for the next tick and run again
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a paced capture loop running in a separate thread
///
/// ```ignore
/// let mut controller = CaptureLoopController::start("file-source", interval, move || {
///     if sink.push(next_frame()) {
///         LoopAction::Continue
///     } else {
///         LoopAction::Stop
///     }
/// });
///
/// controller.stop();
/// ```
pub struct CaptureLoopController {
    thread_handle: Option<JoinHandle<()>>,
    stop_tx: Option<Sender<()>>,
    name: String,
}

impl CaptureLoopController {
    /// Start a loop that calls `loop_fn` every `interval`
    ///
    /// The first call happens immediately.
    pub fn start<F>(name: &str, interval: Duration, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let thread_name = name.to_string();

        info!(name = %name, interval_ms = interval.as_millis() as u64, "Starting capture loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %thread_name, "Capture loop thread started");

            loop {
                if loop_fn() == LoopAction::Stop {
                    debug!(name = %thread_name, "Loop requested stop");
                    break;
                }

                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    // Explicit stop or controller dropped
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        debug!(name = %thread_name, "Stop signal received");
                        break;
                    }
                }
            }

            info!(name = %thread_name, "Capture loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_tx: Some(stop_tx),
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            debug!(name = %self.name, "Requesting capture loop stop");
            let _ = stop_tx.send(());
        }
    }

    /// Stop the loop and wait for the thread to finish
    ///
    /// Returns after at most one in-progress loop body.
    pub fn stop(&mut self) {
        self.request_stop();
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Capture loop thread finished");
            }
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoopController dropped, stopping loop");
            self.stop();
        }
    }
}
