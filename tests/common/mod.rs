// SPDX-License-Identifier: GPL-3.0-only

//! Scripted frame sources and detectors shared by the integration tests

#![allow(dead_code)]

use futures::FutureExt;
use futures::future::BoxFuture;
use qrscan::app::frame_processor::tasks::{DetectionResult, Detector};
use qrscan::app::frame_processor::DecodedValue;
use qrscan::backends::camera::{Frame, FrameImage, FrameSink, FrameSource, SensorRotation};
use qrscan::errors::{CameraError, CameraResult, ScanError};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Frame source driven by the test: frames are pushed by hand
#[derive(Default)]
pub struct ScriptedSource {
    sink: Mutex<Option<FrameSink>>,
    binds: AtomicUsize,
    unbinds: AtomicUsize,
    released: Arc<AtomicU64>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Push a frame with an image payload; its release is counted
    pub fn push_image(&self, sequence: u64) -> bool {
        self.push(counted(image_frame(sequence), &self.released))
    }

    /// Push a frame without an image payload; its release is counted
    pub fn push_blank(&self, sequence: u64) -> bool {
        self.push(counted(
            Frame::empty(sequence, SensorRotation::None),
            &self.released,
        ))
    }

    pub fn push(&self, frame: Frame) -> bool {
        match self.sink.lock().unwrap().as_ref() {
            Some(sink) => sink.push(frame),
            None => false,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.sink.lock().unwrap().is_some()
    }

    pub fn binds(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }

    pub fn unbinds(&self) -> usize {
        self.unbinds.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }
}

impl FrameSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn bind(&self, sink: FrameSink) -> CameraResult<()> {
        let mut slot = self.sink.lock().unwrap();
        if slot.is_some() {
            return Err(CameraError::AlreadyBound);
        }
        *slot = Some(sink);
        self.binds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unbind(&self) {
        if self.sink.lock().unwrap().take().is_some() {
            self.unbinds.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub fn image_frame(sequence: u64) -> Frame {
    Frame::new(
        sequence,
        Some(FrameImage::gray8(2, 2, vec![0, 255, 255, 0])),
        SensorRotation::None,
    )
}

fn counted(frame: Frame, released: &Arc<AtomicU64>) -> Frame {
    let released = Arc::clone(released);
    frame.with_release(move || {
        released.fetch_add(1, Ordering::SeqCst);
    })
}

/// Detector answering from a script keyed by frame sequence
///
/// With a hold semaphore, every analysis waits for one permit before
/// completing, which keeps a frame in flight until the test lets it go.
#[derive(Default)]
pub struct ScriptedDetector {
    by_sequence: HashMap<u64, Vec<String>>,
    fallback: Vec<String>,
    failing: HashSet<u64>,
    hold: Option<Arc<Semaphore>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    seen: Mutex<Vec<u64>>,
}

impl ScriptedDetector {
    /// Decodes nothing on any frame
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decodes `values` on every frame without a specific script entry
    pub fn always(values: &[&str]) -> Self {
        Self {
            fallback: values.iter().map(|v| v.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn on(mut self, sequence: u64, values: &[&str]) -> Self {
        self.by_sequence
            .insert(sequence, values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Decodes `count` distinct values `S0`, `S1`, ... on frame `sequence`
    pub fn flooding(mut self, sequence: u64, count: usize) -> Self {
        self.by_sequence
            .insert(sequence, (0..count).map(|i| format!("S{}", i)).collect());
        self
    }

    pub fn failing_on(mut self, sequence: u64) -> Self {
        self.failing.insert(sequence);
        self
    }

    pub fn held(mut self, hold: Arc<Semaphore>) -> Self {
        self.hold = Some(hold);
        self
    }

    /// Sequences the detector was invoked on, in order
    pub fn seen(&self) -> Vec<u64> {
        self.seen.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Detector for ScriptedDetector {
    fn analyze<'a>(&'a self, frame: &'a Frame) -> BoxFuture<'a, DetectionResult> {
        async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            let _in_flight = InFlight(&self.in_flight);
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let sequence = frame.sequence();
            self.seen.lock().unwrap().push(sequence);

            if let Some(hold) = &self.hold {
                if let Ok(permit) = hold.acquire().await {
                    permit.forget();
                }
            }

            if self.failing.contains(&sequence) {
                return Err(ScanError::DetectionFailure(format!("frame {}", sequence)));
            }
            let values = self.by_sequence.get(&sequence).unwrap_or(&self.fallback);
            Ok(values.iter().map(|v| DecodedValue::from(v.as_str())).collect())
        }
        .boxed()
    }
}

/// Poll `condition` until it holds, yielding to spawned tasks in between
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let result = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "condition not reached in time");
}

/// Await `future`, failing the test if it takes longer than a few seconds
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}
