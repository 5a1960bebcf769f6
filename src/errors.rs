// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for frame source operations
pub type CameraResult<T> = Result<T, CameraError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Frame source errors
    Camera(CameraError),
    /// Scan flow errors (permission, detection, lookup, navigation)
    Scan(ScanError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Errors raised by the scan flow
///
/// Frame-level variants (`FrameUnusable`, `DetectionFailure`) are absorbed by
/// the analysis pipeline and never reach navigation. Only `PermissionDenied`
/// is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Camera capability refused, Home -> Scanner blocked
    PermissionDenied,
    /// Frame carried no image payload
    FrameUnusable,
    /// Detector invocation failed
    DetectionFailure(String),
    /// Result lookup failed
    LookupFailure(String),
    /// Navigation action does not apply to the visible route
    InvalidTransition {
        /// Route on top of the stack when the action arrived
        from: &'static str,
        /// Requested action
        action: &'static str,
    },
}

/// Frame source errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Source already feeds a pipeline
    AlreadyBound,
    /// Source cannot produce frames
    SourceUnavailable(String),
    /// Failed to read frame data
    Io(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Scan(e) => write!(f, "Scan error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::PermissionDenied => write!(f, "Camera permission denied"),
            ScanError::FrameUnusable => write!(f, "Frame has no image payload"),
            ScanError::DetectionFailure(msg) => write!(f, "Detection failed: {}", msg),
            ScanError::LookupFailure(msg) => write!(f, "Lookup failed: {}", msg),
            ScanError::InvalidTransition { from, action } => {
                write!(f, "Cannot {} while {} is showing", action, from)
            }
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::AlreadyBound => write!(f, "Frame source is already bound"),
            CameraError::SourceUnavailable(msg) => write!(f, "Frame source unavailable: {}", msg),
            CameraError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for ScanError {}
impl std::error::Error for CameraError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        AppError::Scan(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::Io(err.to_string())
    }
}
