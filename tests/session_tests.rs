// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the result session lifecycle

use futures::FutureExt;
use futures::future::BoxFuture;
use qrscan::app::lookup::{ResultLookup, SimulatedLookup};
use qrscan::app::{ResultSession, ResultStatus};
use qrscan::errors::ScanError;
use qrscan::DecodedValue;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Lookup counting its invocations; fails the first `failures` calls
struct CountingLookup {
    calls: AtomicUsize,
    failures: usize,
    delay: Duration,
}

impl CountingLookup {
    fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failures,
            delay: Duration::from_millis(500),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ResultLookup for CountingLookup {
    fn lookup<'a>(&'a self, value: &'a DecodedValue) -> BoxFuture<'a, Result<i32, ScanError>> {
        async move {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if call < self.failures {
                Err(ScanError::LookupFailure(format!("{} unavailable", value)))
            } else {
                Ok(42)
            }
        }
        .boxed()
    }
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_runs_one_lookup() {
    let lookup = CountingLookup::new(0);
    let mut session = ResultSession::new(DecodedValue::from("CODE123"), lookup.clone());

    assert!(session.start());
    assert!(!session.start());
    assert_eq!(session.lookups_spawned(), 1);

    let mut status = session.subscribe();
    status.wait_for(|s| s.is_settled()).await.unwrap();
    assert!(!session.start());
    assert_eq!(lookup.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_simulated_outcome_within_range_after_delay() {
    let lookup = Arc::new(SimulatedLookup::new(Duration::from_millis(2000), 100..1000));
    let mut session = ResultSession::new(DecodedValue::from("CODE123"), lookup);
    let mut status = session.subscribe();
    let started = tokio::time::Instant::now();

    session.start();
    assert_eq!(session.status(), ResultStatus::Loading);

    let settled = status.wait_for(|s| s.is_settled()).await.unwrap().clone();
    assert!(started.elapsed() >= Duration::from_millis(2000));
    match settled {
        ResultStatus::Success { value, outcome } => {
            assert_eq!(value, DecodedValue::from("CODE123"));
            assert!((100..1000).contains(&outcome), "outcome {} out of range", outcome);
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_failure_then_retry_succeeds() {
    let lookup = CountingLookup::new(1);
    let mut session = ResultSession::new(DecodedValue::from("CODE123"), lookup.clone());
    let mut status = session.subscribe();

    session.start();
    let failed = status.wait_for(|s| s.is_settled()).await.unwrap().clone();
    assert!(matches!(failed, ResultStatus::Failed { ref reason, .. } if reason.contains("CODE123")));

    assert!(session.retry());
    assert_eq!(session.status(), ResultStatus::Loading);
    assert!(!session.retry(), "retry is only accepted from a failed lookup");

    let settled = status.wait_for(|s| s.is_settled()).await.unwrap().clone();
    assert_eq!(
        settled,
        ResultStatus::Success {
            value: DecodedValue::from("CODE123"),
            outcome: 42
        }
    );
    assert_eq!(lookup.calls(), 2);
    assert_eq!(session.lookups_spawned(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_session_publishes_nothing() {
    let lookup = CountingLookup::new(0);
    let mut session = ResultSession::new(DecodedValue::from("CODE123"), lookup.clone());
    session.start();
    let mut status = session.subscribe();

    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(session);

    assert!(status.changed().await.is_err());
    assert_eq!(*status.borrow(), ResultStatus::Loading);
}

#[tokio::test(start_paused = true)]
async fn test_fresh_session_per_value() {
    let lookup = CountingLookup::new(0);
    let first = ResultSession::new(DecodedValue::from("A"), lookup.clone());
    let second = ResultSession::new(DecodedValue::from("A"), lookup.clone());
    assert_ne!(first.id(), second.id());
    assert_eq!(first.status(), ResultStatus::Loading);
    assert_eq!(lookup.calls(), 0, "nothing runs before start");
}

#[test]
fn test_status_serializes_tagged() {
    let status = ResultStatus::Success {
        value: DecodedValue::from("CODE123"),
        outcome: 512,
    };
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["value"], "CODE123");
    assert_eq!(json["outcome"], 512);
}
