// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame analysis results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload decoded from a frame by a detector
///
/// Immutable once produced. Only the first value accepted by the
/// detection gate in an arm cycle has any effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodedValue(String);

impl DecodedValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DecodedValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DecodedValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Counters describing what the analysis worker did with its frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Frames taken from the slot by the worker
    pub admitted: u64,
    /// Frames without image payload, released without analysis
    pub skipped: u64,
    /// Frames the detector finished successfully
    pub analyzed: u64,
    /// Frames whose detection failed
    pub failed: u64,
    /// Frames released by the worker (every admitted frame, once)
    pub released: u64,
    /// Frames superseded in the slot before the worker took them
    pub superseded: u64,
    /// Values accepted by the detection gate
    pub accepted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_plain_string() {
        let value = DecodedValue::from("CODE123");
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"CODE123\"");
        assert_eq!(value.to_string(), "CODE123");
    }
}
