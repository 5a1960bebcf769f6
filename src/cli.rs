// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for scanning without the interactive UI
//!
//! This module provides command-line functionality for:
//! - Scanning image files end to end (detection, then lookup)
//! - Decoding a single image
//! - Building the configuration and frame source shared with terminal mode

use chrono::{DateTime, Local};
use qrscan::app::frame_processor::tasks::Detector;
use qrscan::app::frame_processor::{DecodedValue, PipelineStats, QrDetector};
use qrscan::app::lookup::SimulatedLookup;
use qrscan::app::{Capabilities, Message, ResultStatus, ScanApp};
use qrscan::backends::camera::file_source::load_image_as_frame;
use qrscan::backends::camera::{FileFrameSource, Frame, SensorRotation};
use qrscan::backends::permission::{PermissionPolicy, StaticPermission};
use qrscan::config::Config;
use qrscan::constants::file_formats;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Overrides applied on top of the loaded configuration
#[derive(clap::Args, Debug, Default)]
pub struct ScanOptions {
    /// Simulated lookup latency in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Interval between replayed frames in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// How the camera permission is answered
    #[arg(long, value_enum)]
    pub permission: Option<PermissionPolicy>,

    /// Downscale frames larger than this before decoding
    #[arg(long)]
    pub max_dimension: Option<u32>,

    /// Sensor rotation stamped on every frame (0, 90, 180, 270)
    #[arg(long, default_value = "0")]
    pub rotation: i32,
}

impl ScanOptions {
    fn apply(&self, config: &mut Config) {
        if let Some(delay) = self.delay_ms {
            config.lookup_delay_ms = delay;
        }
        if let Some(interval) = self.interval_ms {
            config.frame_interval_ms = interval;
        }
        if let Some(policy) = self.permission {
            config.camera_permission = policy;
        }
        if let Some(max_dimension) = self.max_dimension {
            config.max_dimension = max_dimension;
        }
    }
}

/// Load the configuration (explicit path or default location) and apply overrides
pub fn load_config(
    path: Option<&Path>,
    options: &ScanOptions,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    options.apply(&mut config);
    config.validate()?;
    debug!(?config, "Effective configuration");
    Ok(config)
}

/// Frame source replaying the given images (directories are expanded)
pub fn open_source(
    inputs: &[PathBuf],
    config: &Config,
    options: &ScanOptions,
) -> Result<FileFrameSource, Box<dyn std::error::Error>> {
    let paths = collect_image_paths(inputs)?;
    if paths.is_empty() {
        return Err("No supported image files found".into());
    }
    info!(count = paths.len(), "Replaying images as camera frames");

    let source = FileFrameSource::open(&paths, config.frame_interval())?
        .with_rotation(SensorRotation::from_degrees_int(options.rotation));
    Ok(source)
}

/// Outcome of a headless scan
#[derive(Debug, Serialize)]
struct ScanReport {
    session: Uuid,
    value: DecodedValue,
    result: ResultStatus,
    scanned_at: DateTime<Local>,
    frames: Option<PipelineStats>,
}

/// Scan images until the first code is accepted, then run its lookup
pub fn scan(
    inputs: &[PathBuf],
    config: Config,
    options: &ScanOptions,
    timeout: Duration,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = open_source(inputs, &config, options)?;

    // Nobody to prompt: anything but an explicit refusal is a grant
    let granted = config.camera_permission != PermissionPolicy::Denied;
    let capabilities = Capabilities {
        source: Arc::new(source),
        detector: Arc::new(QrDetector::with_max_dimension(config.max_dimension)),
        permission: Arc::new(StaticPermission::new(granted)),
        lookup: Arc::new(SimulatedLookup::from_config(&config)),
    };
    let lookup_timeout = config.lookup_delay() + timeout;

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(async move {
        let mut app = ScanApp::new(config, capabilities);
        app.update(Message::OpenScanner)?;

        let mut frames = None;
        let detected = tokio::time::timeout(timeout, async {
            while let Some(message) = app.next_message().await {
                if matches!(message, Message::CodeDetected(_)) {
                    frames = app.pipeline_stats();
                }
                app.update(message)?;
                if app.current_route().is_result() {
                    return Ok(true);
                }
            }
            Ok::<bool, qrscan::ScanError>(false)
        })
        .await;

        match detected {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => return Err("Scanner stopped without a detection".into()),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(format!("No QR code detected within {}s", timeout.as_secs()).into());
            }
        }

        let Some(session) = app.session() else {
            return Err("Result opened without a lookup".into());
        };
        let mut status = session.subscribe();
        let settled = tokio::time::timeout(lookup_timeout, status.wait_for(|s| s.is_settled()))
            .await
            .map_err(|_| "Lookup timed out")??
            .clone();

        Ok::<_, Box<dyn std::error::Error>>(ScanReport {
            session: session.id(),
            value: session.value().clone(),
            result: settled,
            scanned_at: Local::now(),
            frames,
        })
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Decoded: {}", report.value);
    match &report.result {
        ResultStatus::Success { outcome, .. } => println!("Outcome: {}", outcome),
        ResultStatus::Failed { reason, .. } => println!("Lookup failed: {}", reason),
        ResultStatus::Loading => println!("Lookup pending"),
    }
    if let Some(frames) = report.frames {
        println!(
            "Frames: {} analyzed, {} skipped, {} superseded",
            frames.analyzed, frames.skipped, frames.superseded
        );
    }
    Ok(())
}

/// Run the detector once on an image and print every decoded value
pub fn decode(path: &Path, config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let image = load_image_as_frame(path)?;
    let frame = Frame::new(0, Some(image), SensorRotation::None);
    let detector = QrDetector::with_max_dimension(config.max_dimension);

    let runtime = tokio::runtime::Runtime::new()?;
    let values = runtime.block_on(detector.analyze(&frame))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else if values.is_empty() {
        println!("No QR code found in {}", path.display());
    } else {
        for value in &values {
            println!("{}", value);
        }
    }
    Ok(())
}

/// Collect all image paths from input (files or directories)
fn collect_image_paths(input: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();

    for path in input {
        if path.is_dir() {
            let mut entries = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let file_path = entry?.path();
                if is_supported_image(&file_path) {
                    entries.push(file_path);
                }
            }
            // Sort by filename for consistent ordering
            entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            paths.extend(entries);
        } else if is_supported_image(path) {
            paths.push(path.clone());
        } else {
            return Err(format!("Unsupported image file: {}", path.display()).into());
        }
    }

    Ok(paths)
}

/// Check if a path is a supported image file
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| file_formats::is_image_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}
