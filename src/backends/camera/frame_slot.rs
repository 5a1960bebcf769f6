// SPDX-License-Identifier: GPL-3.0-only

//! Keep-latest hand-off between a frame source and the analysis worker
//!
//! The slot holds at most one pending frame. Pushing while a frame is
//! still pending supersedes (and releases) the older one, so a slow
//! consumer never accumulates a backlog.

use super::types::Frame;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::trace;

#[derive(Default)]
struct SlotState {
    pending: Option<Frame>,
    closed: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<SlotState>,
    notify: Notify,
    superseded: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // A poisoned slot still holds a valid Option<Frame>
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn close(&self) {
        let pending = {
            let mut state = self.lock();
            state.closed = true;
            state.pending.take()
        };
        // Release outside the lock, hooks may call back into the source
        drop(pending);
        self.notify.notify_one();
    }
}

/// Producer half, handed to a frame source on bind
#[derive(Clone)]
pub struct FrameSink {
    shared: Arc<Shared>,
}

/// Consumer half, owned by the analysis worker
///
/// Dropping the receiver closes the slot: later pushes release their frame
/// immediately.
pub struct FrameReceiver {
    shared: Arc<Shared>,
}

/// Create a connected sink/receiver pair
pub fn frame_slot() -> (FrameSink, FrameReceiver) {
    let shared = Arc::new(Shared::default());
    (
        FrameSink {
            shared: Arc::clone(&shared),
        },
        FrameReceiver { shared },
    )
}

impl FrameSink {
    /// Offer a frame, superseding any frame still waiting
    ///
    /// Returns `false` once the consumer is gone; the frame is released.
    pub fn push(&self, frame: Frame) -> bool {
        let superseded = {
            let mut state = self.shared.lock();
            if state.closed {
                None
            } else {
                Some(state.pending.replace(frame))
            }
        };

        match superseded {
            None => false,
            Some(previous) => {
                if let Some(previous) = previous {
                    self.shared.superseded.fetch_add(1, Ordering::Relaxed);
                    trace!(sequence = previous.sequence(), "Superseded pending frame");
                }
                self.shared.notify.notify_one();
                true
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl FrameReceiver {
    /// Wait for the next frame, `None` once the slot is closed
    pub async fn recv(&self) -> Option<Frame> {
        loop {
            {
                let mut state = self.shared.lock();
                if let Some(frame) = state.pending.take() {
                    return Some(frame);
                }
                if state.closed {
                    return None;
                }
            }
            // notify_one stores a permit, so a push between the check and
            // this await is not lost
            self.shared.notify.notified().await;
        }
    }

    /// Close the slot and release any pending frame
    pub fn close(&self) {
        self.shared.close();
    }

    /// Number of frames dropped because a newer one arrived first
    pub fn superseded_count(&self) -> u64 {
        self.shared.superseded.load(Ordering::Relaxed)
    }
}

impl Drop for FrameReceiver {
    fn drop(&mut self) {
        self.shared.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::SensorRotation;
    use std::sync::atomic::AtomicU32;

    fn counted_frame(sequence: u64, released: &Arc<AtomicU32>) -> Frame {
        let counter = Arc::clone(released);
        Frame::empty(sequence, SensorRotation::None).with_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_keeps_latest_frame() {
        let (sink, receiver) = frame_slot();
        let released = Arc::new(AtomicU32::new(0));

        assert!(sink.push(counted_frame(1, &released)));
        assert!(sink.push(counted_frame(2, &released)));
        assert!(sink.push(counted_frame(3, &released)));

        // Two superseded frames were released without being analyzed
        assert_eq!(released.load(Ordering::SeqCst), 2);
        assert_eq!(receiver.superseded_count(), 2);

        let frame = receiver.recv().await.unwrap();
        assert_eq!(frame.sequence(), 3);
    }

    #[tokio::test]
    async fn test_push_after_close_releases_frame() {
        let (sink, receiver) = frame_slot();
        let released = Arc::new(AtomicU32::new(0));

        drop(receiver);
        assert!(sink.is_closed());
        assert!(!sink.push(counted_frame(1, &released)));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_receiver() {
        let (_sink, receiver) = frame_slot();
        let receiver = Arc::new(receiver);
        let waiter = {
            let receiver = Arc::clone(&receiver);
            tokio::spawn(async move { receiver.recv().await.is_none() })
        };

        tokio::task::yield_now().await;
        receiver.close();
        assert!(waiter.await.unwrap());
    }
}
