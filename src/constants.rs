// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Simulated result lookup defaults
pub mod lookup {
    use super::Duration;

    /// Latency of the simulated remote fetch
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

    /// Smallest outcome the simulated lookup can produce (inclusive)
    pub const OUTCOME_MIN: i32 = 100;

    /// Upper bound of the simulated outcome (exclusive)
    pub const OUTCOME_MAX: i32 = 1000;
}

/// Frame acquisition and analysis defaults
pub mod frames {
    use super::Duration;

    /// Interval between frames emitted by file-backed sources (~30 FPS)
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(33);

    /// Frames larger than this (in either dimension) are downscaled before decoding
    pub const DETECTOR_MAX_DIMENSION: u32 = 640;
}

/// User interface timing
pub mod ui {
    use super::Duration;

    /// How long a transient notice stays visible
    pub const NOTICE_DURATION: Duration = Duration::from_secs(2);

    /// Terminal input poll interval (also the redraw cadence)
    pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

    /// Text shown when the camera capability is refused
    pub const PERMISSION_DENIED_NOTICE: &str = "Camera permission denied";

    /// Text shown when the frame source cannot be started
    pub const CAMERA_UNAVAILABLE_NOTICE: &str = "Camera unavailable";
}

/// Configuration file location (under the platform config directory)
pub mod config_file {
    /// Directory name below the user's config directory
    pub const APP_DIR: &str = "qrscan";

    /// File name of the persisted configuration
    pub const FILE_NAME: &str = "config.json";
}

/// Image file extensions accepted by file-backed frame sources
pub mod file_formats {
    /// Supported image extensions (lowercase)
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

    /// Check whether an extension (without the dot) is a supported image
    pub fn is_image_extension(ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        IMAGE_EXTENSIONS.contains(&ext.as_str())
    }
}
