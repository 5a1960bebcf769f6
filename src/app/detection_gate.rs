// SPDX-License-Identifier: GPL-3.0-only

//! Single-acceptance latch over decoded values
//!
//! The detector keeps reporting the same code on consecutive frames until
//! navigation leaves the scanner. The gate turns that stream into at most
//! one triggering event per arm cycle.
//!
//! Every reset starts a new cycle. A pipeline offers values in the cycle
//! it was started in, so a worker that outlives its scanner cannot fire a
//! gate that was re-armed for the next one.

use crate::app::frame_processor::DecodedValue;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

/// Gate position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Next offer is accepted
    Armed,
    /// An offer was accepted; all others are refused until reset
    Fired,
}

#[derive(Debug, Default)]
struct Latch {
    cycle: u64,
    accepted: Option<DecodedValue>,
}

/// Latch shared between the analysis worker and the UI context
///
/// All mutation happens under one lock, so concurrent offers from
/// different contexts cannot both win.
#[derive(Debug, Default)]
pub struct DetectionGate {
    latch: Mutex<Latch>,
}

impl DetectionGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Latch> {
        self.latch.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current arm cycle
    pub fn cycle(&self) -> u64 {
        self.lock().cycle
    }

    /// Accept `value` if the gate is armed, in whatever cycle is current
    pub fn offer(&self, value: &DecodedValue) -> bool {
        let cycle = self.cycle();
        self.offer_in(cycle, value)
    }

    /// Accept `value` if the gate is armed and still in `cycle`
    ///
    /// Returns `true` for exactly one call per arm cycle. Offers made in
    /// an earlier cycle are always refused.
    pub fn offer_in(&self, cycle: u64, value: &DecodedValue) -> bool {
        let mut latch = self.lock();
        if latch.cycle != cycle {
            trace!(value = %value, cycle, current = latch.cycle, "Offer from a stale arm cycle");
            return false;
        }
        if latch.accepted.is_some() {
            trace!(value = %value, "Detection suppressed by gate");
            return false;
        }
        latch.accepted = Some(value.clone());
        debug!(value = %value, cycle, "Detection gate fired");
        true
    }

    /// Re-arm the gate, starting a new cycle
    pub fn reset(&self) -> u64 {
        let mut latch = self.lock();
        latch.cycle = latch.cycle.wrapping_add(1);
        if latch.accepted.take().is_some() {
            debug!(cycle = latch.cycle, "Detection gate re-armed");
        }
        latch.cycle
    }

    /// Value that fired the current cycle, if any
    pub fn accepted(&self) -> Option<DecodedValue> {
        self.lock().accepted.clone()
    }

    pub fn state(&self) -> GateState {
        if self.lock().accepted.is_some() {
            GateState::Fired
        } else {
            GateState::Armed
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state() == GateState::Armed
    }
}
