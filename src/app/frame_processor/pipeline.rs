// SPDX-License-Identifier: GPL-3.0-only

//! Frame analysis pipeline
//!
//! One worker task pulls frames from a keep-latest slot and runs the
//! detector on them strictly one at a time. Values found in a frame are
//! offered to the detection gate in detector order, within the gate's arm
//! cycle at start; accepted values are delivered on the event channel.
//!
//! Frame-level failures (no payload, detector error) are logged and
//! absorbed here. The worker always moves on to the next frame.

use super::tasks::Detector;
use super::types::{DecodedValue, PipelineStats};
use crate::app::detection_gate::DetectionGate;
use crate::backends::camera::{FrameReceiver, FrameSource, frame_slot};
use crate::errors::AppResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

#[derive(Default)]
struct Counters {
    admitted: AtomicU64,
    skipped: AtomicU64,
    analyzed: AtomicU64,
    failed: AtomicU64,
    released: AtomicU64,
    accepted: AtomicU64,
}

/// Running frame analysis bound to a frame source
///
/// Created by [`FramePipeline::start`] when the scanner screen is entered
/// and stopped when it is left. Dropping the pipeline stops it.
pub struct FramePipeline {
    source: Arc<dyn FrameSource>,
    stop_tx: watch::Sender<bool>,
    worker: Option<JoinHandle<()>>,
    counters: Arc<Counters>,
    receiver_stats: Arc<FrameReceiver>,
    stopped: bool,
}

impl FramePipeline {
    /// Bind `source` and start the analysis worker
    ///
    /// Must be called within a tokio runtime. `events` receives every
    /// value the gate accepts, converted into the caller's message type.
    pub fn start<T>(
        source: Arc<dyn FrameSource>,
        detector: Arc<dyn Detector>,
        gate: Arc<DetectionGate>,
        events: mpsc::UnboundedSender<T>,
    ) -> AppResult<Self>
    where
        T: From<DecodedValue> + Send + 'static,
    {
        let (sink, receiver) = frame_slot();
        source.bind(sink)?;

        let receiver = Arc::new(receiver);
        let (stop_tx, stop_rx) = watch::channel(false);
        let counters = Arc::new(Counters::default());
        let cycle = gate.cycle();

        info!(source = source.name(), cycle, "Starting frame analysis pipeline");

        let worker = tokio::spawn(run_worker(
            Arc::clone(&receiver),
            detector,
            gate,
            cycle,
            events,
            stop_rx,
            Arc::clone(&counters),
        ));

        Ok(Self {
            source,
            stop_tx,
            worker: Some(worker),
            counters,
            receiver_stats: receiver,
            stopped: false,
        })
    }

    /// Unbind the source and signal the worker to exit
    ///
    /// Idempotent and non-blocking: an in-flight analysis is abandoned
    /// (its frame is released) and its results are discarded.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        let _ = self.stop_tx.send(true);
        self.source.unbind();
        self.receiver_stats.close();
        info!(source = self.source.name(), "Frame analysis pipeline stopped");
    }

    /// Wait for the worker task to finish (after [`stop`](Self::stop))
    pub async fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!(error = %e, "Frame analysis worker ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        !self.stopped
            && self
                .worker
                .as_ref()
                .is_some_and(|worker| !worker.is_finished())
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            admitted: self.counters.admitted.load(Ordering::SeqCst),
            skipped: self.counters.skipped.load(Ordering::SeqCst),
            analyzed: self.counters.analyzed.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
            released: self.counters.released.load(Ordering::SeqCst),
            superseded: self.receiver_stats.superseded_count(),
            accepted: self.counters.accepted.load(Ordering::SeqCst),
        }
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_worker<T>(
    frames: Arc<FrameReceiver>,
    detector: Arc<dyn Detector>,
    gate: Arc<DetectionGate>,
    cycle: u64,
    events: mpsc::UnboundedSender<T>,
    mut stop: watch::Receiver<bool>,
    counters: Arc<Counters>,
) where
    T: From<DecodedValue> + Send + 'static,
{
    debug!("Frame analysis worker started");

    loop {
        let frame = tokio::select! {
            biased;
            _ = stop_requested(&mut stop) => break,
            frame = frames.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };
        counters.admitted.fetch_add(1, Ordering::SeqCst);
        let sequence = frame.sequence();
        trace!(
            sequence,
            age_ms = frame.captured_at().elapsed().as_millis() as u64,
            "Frame admitted"
        );

        if frame.image().is_none() {
            trace!(sequence, "Frame has no image payload, skipping");
            counters.skipped.fetch_add(1, Ordering::SeqCst);
            frame.release();
            counters.released.fetch_add(1, Ordering::SeqCst);
            continue;
        }

        let result = tokio::select! {
            biased;
            _ = stop_requested(&mut stop) => None,
            result = detector.analyze(&frame) => Some(result),
        };

        // Released only once the detector is done with it
        frame.release();
        counters.released.fetch_add(1, Ordering::SeqCst);

        let values = match result {
            None => {
                debug!(sequence, "Pipeline stopped during analysis, discarding frame");
                break;
            }
            Some(Err(e)) => {
                warn!(sequence, error = %e, "Frame analysis failed, continuing");
                counters.failed.fetch_add(1, Ordering::SeqCst);
                continue;
            }
            Some(Ok(values)) => values,
        };
        counters.analyzed.fetch_add(1, Ordering::SeqCst);

        // Results arriving after stop are dropped
        if *stop.borrow() {
            debug!(sequence, "Discarding late detection results");
            break;
        }

        for value in values {
            if *stop.borrow() {
                debug!(sequence, "Pipeline stopped while offering values");
                break;
            }
            if !gate.offer_in(cycle, &value) {
                continue;
            }
            counters.accepted.fetch_add(1, Ordering::SeqCst);
            info!(sequence, value = %value, "Code accepted");
            if events.send(T::from(value)).is_err() {
                debug!("Event receiver gone, stopping worker");
                return;
            }
        }
    }

    debug!("Frame analysis worker exiting");
}

/// Resolves once stop is signalled (or the pipeline handle is gone)
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::tasks::DetectionResult;
    use crate::backends::camera::{Frame, FrameImage, FrameSink, SensorRotation};
    use crate::errors::{CameraError, CameraResult, ScanError};
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ManualSource {
        sink: Mutex<Option<FrameSink>>,
    }

    impl ManualSource {
        fn push(&self, frame: Frame) -> bool {
            match self.sink.lock().unwrap().as_ref() {
                Some(sink) => sink.push(frame),
                None => false,
            }
        }
    }

    impl FrameSource for ManualSource {
        fn name(&self) -> &str {
            "manual"
        }

        fn bind(&self, sink: FrameSink) -> CameraResult<()> {
            let mut slot = self.sink.lock().unwrap();
            if slot.is_some() {
                return Err(CameraError::AlreadyBound);
            }
            *slot = Some(sink);
            Ok(())
        }

        fn unbind(&self) {
            self.sink.lock().unwrap().take();
        }
    }

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn analyze<'a>(&'a self, _frame: &'a Frame) -> BoxFuture<'a, DetectionResult> {
            async { Err(ScanError::DetectionFailure("sensor noise".to_string())) }.boxed()
        }
    }

    fn image_frame(sequence: u64) -> Frame {
        Frame::new(
            sequence,
            Some(FrameImage::gray8(1, 1, vec![0])),
            SensorRotation::None,
        )
    }

    #[tokio::test]
    async fn test_detector_failure_is_absorbed() {
        let source = Arc::new(ManualSource::default());
        let (tx, mut rx) = mpsc::unbounded_channel::<DecodedValue>();
        let mut pipeline = FramePipeline::start(
            source.clone(),
            Arc::new(FailingDetector),
            Arc::new(DetectionGate::new()),
            tx,
        )
        .unwrap();

        assert!(source.push(image_frame(1)));
        while pipeline.stats().failed < 1 {
            tokio::task::yield_now().await;
        }
        assert!(source.push(image_frame(2)));
        while pipeline.stats().failed < 2 {
            tokio::task::yield_now().await;
        }

        assert!(pipeline.is_running());
        pipeline.stop();
        pipeline.join().await;
        assert!(rx.try_recv().is_err());
        assert_eq!(pipeline.stats().released, 2);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_unbinds() {
        let source = Arc::new(ManualSource::default());
        let (tx, _rx) = mpsc::unbounded_channel::<DecodedValue>();
        let mut pipeline = FramePipeline::start(
            source.clone(),
            Arc::new(FailingDetector),
            Arc::new(DetectionGate::new()),
            tx,
        )
        .unwrap();

        pipeline.stop();
        pipeline.stop();
        pipeline.join().await;
        assert!(!pipeline.is_running());
        assert!(!source.push(image_frame(1)));
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let source = Arc::new(ManualSource::default());
        let (sink, _receiver) = frame_slot();
        source.bind(sink).unwrap();

        let (tx, _rx) = mpsc::unbounded_channel::<DecodedValue>();
        let result = FramePipeline::start(
            source,
            Arc::new(FailingDetector),
            Arc::new(DetectionGate::new()),
            tx,
        );
        assert!(result.is_err());
    }
}
