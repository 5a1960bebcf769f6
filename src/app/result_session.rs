// SPDX-License-Identifier: GPL-3.0-only

//! Result lookup lifecycle for one decoded value
//!
//! ```text
//!   start()            lookup Ok
//! ──────────▶ Loading ───────────▶ Success
//!                │
//!                │ lookup Err      retry()
//!                └──────────▶ Failed ──────▶ Loading
//! ```
//!
//! A session is created when the result screen opens and dropped when it
//! closes. Dropping cancels an unfinished lookup, so observers never see
//! an update from a screen that is gone.

use crate::app::frame_processor::DecodedValue;
use crate::app::lookup::ResultLookup;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Observable session status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultStatus {
    /// Lookup pending
    Loading,
    /// Lookup finished
    Success { value: DecodedValue, outcome: i32 },
    /// Lookup returned an error; `retry()` may start it again
    Failed { value: DecodedValue, reason: String },
}

impl ResultStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, ResultStatus::Loading)
    }

    /// Whether no lookup is pending
    pub fn is_settled(&self) -> bool {
        !self.is_loading()
    }
}

/// One-shot lookup for a single decoded value
pub struct ResultSession {
    id: Uuid,
    value: DecodedValue,
    lookup: Arc<dyn ResultLookup>,
    status: Arc<watch::Sender<ResultStatus>>,
    started: bool,
    lookups_spawned: u32,
    task: Option<JoinHandle<()>>,
}

impl ResultSession {
    /// New session in `Loading`; nothing runs until [`start`](Self::start)
    pub fn new(value: DecodedValue, lookup: Arc<dyn ResultLookup>) -> Self {
        let (status, _) = watch::channel(ResultStatus::Loading);
        Self {
            id: Uuid::new_v4(),
            value,
            lookup,
            status: Arc::new(status),
            started: false,
            lookups_spawned: 0,
            task: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn value(&self) -> &DecodedValue {
        &self.value
    }

    pub fn status(&self) -> ResultStatus {
        self.status.borrow().clone()
    }

    /// Observe status changes
    pub fn subscribe(&self) -> watch::Receiver<ResultStatus> {
        self.status.subscribe()
    }

    /// Number of lookups this session has launched
    pub fn lookups_spawned(&self) -> u32 {
        self.lookups_spawned
    }

    /// Launch the lookup. Only the first call has an effect.
    ///
    /// Must be called within a tokio runtime. Returns whether a lookup
    /// was launched.
    pub fn start(&mut self) -> bool {
        if self.started {
            debug!(session = %self.id, "Lookup already started, ignoring");
            return false;
        }
        self.started = true;
        info!(session = %self.id, value = %self.value, "Starting result lookup");
        self.spawn_lookup();
        true
    }

    /// Run the lookup again after a failure
    ///
    /// Ignored unless the session is in `Failed`.
    pub fn retry(&mut self) -> bool {
        if !matches!(*self.status.borrow(), ResultStatus::Failed { .. }) {
            debug!(session = %self.id, "Retry ignored, lookup not failed");
            return false;
        }
        info!(session = %self.id, value = %self.value, "Retrying result lookup");
        self.status.send_replace(ResultStatus::Loading);
        self.spawn_lookup();
        true
    }

    fn spawn_lookup(&mut self) {
        self.lookups_spawned += 1;
        let lookup = Arc::clone(&self.lookup);
        let status = Arc::clone(&self.status);
        let value = self.value.clone();
        let id = self.id;

        self.task = Some(tokio::spawn(async move {
            let next = match lookup.lookup(&value).await {
                Ok(outcome) => {
                    info!(session = %id, outcome, "Result lookup succeeded");
                    ResultStatus::Success {
                        value: value.clone(),
                        outcome,
                    }
                }
                Err(e) => {
                    warn!(session = %id, error = %e, "Result lookup failed");
                    ResultStatus::Failed {
                        value: value.clone(),
                        reason: e.to_string(),
                    }
                }
            };
            status.send_replace(next);
        }));
    }
}

impl Drop for ResultSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                debug!(session = %self.id, "Cancelling unfinished lookup");
                task.abort();
            }
        }
    }
}

impl std::fmt::Debug for ResultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSession")
            .field("id", &self.id)
            .field("value", &self.value)
            .field("status", &*self.status.borrow())
            .field("started", &self.started)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::lookup::SimulatedLookup;
    use std::time::Duration;

    fn session(delay_ms: u64) -> ResultSession {
        ResultSession::new(
            DecodedValue::from("CODE123"),
            Arc::new(SimulatedLookup::new(Duration::from_millis(delay_ms), 100..1000)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_until_delay_elapses() {
        let mut session = session(2000);
        let mut status = session.subscribe();
        assert!(session.start());
        assert_eq!(session.status(), ResultStatus::Loading);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(session.status().is_loading());

        let settled = status.wait_for(|s| s.is_settled()).await.unwrap().clone();
        match settled {
            ResultStatus::Success { value, outcome } => {
                assert_eq!(value.as_str(), "CODE123");
                assert!((100..1000).contains(&outcome));
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_only_after_failure() {
        let mut session = session(10);
        assert!(!session.retry());
        session.start();
        assert!(!session.retry());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_lookup() {
        let session = {
            let mut session = session(2000);
            session.start();
            session
        };
        let mut status = session.subscribe();
        drop(session);

        // Sender dropped with the session, no Success is ever published
        assert!(status.changed().await.is_err());
        assert_eq!(*status.borrow(), ResultStatus::Loading);
    }
}
