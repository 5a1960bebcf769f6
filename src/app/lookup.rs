// SPDX-License-Identifier: GPL-3.0-only

//! Result lookup seam
//!
//! A lookup turns a decoded value into an integer outcome. The shipped
//! implementation only simulates a remote fetch; a real service client
//! plugs in behind the same trait.

use crate::app::frame_processor::DecodedValue;
use crate::config::Config;
use crate::errors::ScanError;
use futures::FutureExt;
use futures::future::BoxFuture;
use rand::Rng;
use std::ops::Range;
use std::time::Duration;
use tracing::debug;

/// Fetch the outcome for one decoded value
pub trait ResultLookup: Send + Sync {
    fn lookup<'a>(&'a self, value: &'a DecodedValue) -> BoxFuture<'a, Result<i32, ScanError>>;
}

/// Fixed latency followed by a uniformly drawn outcome
#[derive(Debug, Clone)]
pub struct SimulatedLookup {
    delay: Duration,
    range: Range<i32>,
}

impl SimulatedLookup {
    /// An empty range is widened to its start value
    pub fn new(delay: Duration, range: Range<i32>) -> Self {
        let range = if range.is_empty() {
            range.start..range.start.saturating_add(1)
        } else {
            range
        };
        Self { delay, range }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.lookup_delay(), config.outcome_range())
    }

    pub fn range(&self) -> Range<i32> {
        self.range.clone()
    }
}

impl ResultLookup for SimulatedLookup {
    fn lookup<'a>(&'a self, value: &'a DecodedValue) -> BoxFuture<'a, Result<i32, ScanError>> {
        async move {
            tokio::time::sleep(self.delay).await;
            let outcome = rand::thread_rng().gen_range(self.range.clone());
            debug!(value = %value, outcome, "Simulated lookup finished");
            Ok(outcome)
        }
        .boxed()
    }
}
