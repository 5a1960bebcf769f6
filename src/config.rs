// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON under the platform config directory
//! (e.g. `~/.config/qrscan/config.json`). Missing fields fall back to
//! their defaults so older files keep loading.

use crate::backends::permission::PermissionPolicy;
use crate::constants::{config_file, frames, lookup};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Simulated lookup latency in milliseconds
    pub lookup_delay_ms: u64,
    /// Lowest lookup outcome (inclusive)
    pub outcome_min: i32,
    /// Upper lookup outcome bound (exclusive)
    pub outcome_max: i32,
    /// Interval between frames of file-backed sources
    pub frame_interval_ms: u64,
    /// Detector downscale bound in pixels
    pub max_dimension: u32,
    /// How the camera capability is answered
    pub camera_permission: PermissionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lookup_delay_ms: lookup::DEFAULT_DELAY.as_millis() as u64,
            outcome_min: lookup::OUTCOME_MIN,
            outcome_max: lookup::OUTCOME_MAX,
            frame_interval_ms: frames::DEFAULT_INTERVAL.as_millis() as u64,
            max_dimension: frames::DETECTOR_MAX_DIMENSION,
            camera_permission: PermissionPolicy::default(),
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(config_file::APP_DIR).join(config_file::FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    ///
    /// A missing file is normal on first run. A malformed file is logged
    /// and ignored rather than aborting startup.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Load and validate a configuration file
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Persist to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Reject settings the scanner cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.outcome_min >= self.outcome_max {
            return Err(AppError::Config(format!(
                "outcome range is empty ({}..{})",
                self.outcome_min, self.outcome_max
            )));
        }
        if self.frame_interval_ms == 0 {
            return Err(AppError::Config(
                "frame_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_dimension == 0 {
            return Err(AppError::Config(
                "max_dimension must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn lookup_delay(&self) -> Duration {
        Duration::from_millis(self.lookup_delay_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn outcome_range(&self) -> Range<i32> {
        self.outcome_min..self.outcome_max
    }
}
