use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Shortest recording that may be kept, in seconds.
pub const RECORDING_DURATION_MIN: f64 = 20.0;

/// Recording length at which a session finalizes on its own, in seconds.
pub const RECORDING_DURATION_MAX: f64 = 300.0;

/// Number of queued tapes needed before an upload batch is released.
pub const QUEUE_MIN: usize = 2;

/// Number of completed tapes that may wait for upload.
pub const QUEUE_MAX: usize = 10;

/// Minimum spacing between tape locations, in metres (100 miles).
pub const RADIUS_METERS: f64 = 160_934.0;

/// Container extension of recorded tapes.
pub const FILE_EXTENSION: &str = ".m4a";

/// Configuration shared by capture sessions and the segment queue manager.
///
/// Built once and passed by value; nothing in the pipeline mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfiguration {
    /// Recordings shorter than this fail with `TooShort` (default: 20 s).
    pub recording_duration_min: f64,

    /// Recordings reaching this length finalize automatically (default: 300 s).
    pub recording_duration_max: f64,

    /// Tapes required before an upload batch is handed out (default: 2).
    pub queue_min: usize,

    /// Tapes that may wait for upload (default: 10).
    pub queue_max: usize,

    /// Location-radius policy distance in metres (default: 160934).
    pub radius_meters: f64,

    /// Extension of tape files, including the dot (default: ".m4a").
    pub file_extension: String,

    /// Directory where tape files are written.
    pub output_directory: PathBuf,

    /// Interval between progress ticks.
    #[serde(with = "duration_millis")]
    pub tick_interval: Duration,

    /// Write a JSON metadata sidecar next to each completed tape.
    pub write_metadata_sidecar: bool,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), CaptureError> {
        if !(self.recording_duration_min > 0.0) {
            return Err(CaptureError::ConfigurationFailed(
                "minimum duration must be positive".into(),
            ));
        }
        if self.recording_duration_max < self.recording_duration_min {
            return Err(CaptureError::ConfigurationFailed(format!(
                "maximum duration {} is below minimum {}",
                self.recording_duration_max, self.recording_duration_min
            )));
        }
        if self.queue_max == 0 {
            return Err(CaptureError::ConfigurationFailed(
                "queue capacity must be at least 1".into(),
            ));
        }
        if self.queue_min > self.queue_max {
            return Err(CaptureError::ConfigurationFailed(format!(
                "queue minimum {} exceeds capacity {}",
                self.queue_min, self.queue_max
            )));
        }
        if !(self.radius_meters > 0.0) {
            return Err(CaptureError::ConfigurationFailed(
                "radius must be positive".into(),
            ));
        }
        if self.file_extension.len() < 2 || !self.file_extension.starts_with('.') {
            return Err(CaptureError::ConfigurationFailed(format!(
                "invalid file extension: {:?}",
                self.file_extension
            )));
        }
        if self.tick_interval.is_zero() {
            return Err(CaptureError::ConfigurationFailed(
                "tick interval must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            recording_duration_min: RECORDING_DURATION_MIN,
            recording_duration_max: RECORDING_DURATION_MAX,
            queue_min: QUEUE_MIN,
            queue_max: QUEUE_MAX,
            radius_meters: RADIUS_METERS,
            file_extension: FILE_EXTENSION.to_string(),
            output_directory: PathBuf::from("."),
            tick_interval: Duration::from_secs(1),
            write_metadata_sidecar: false,
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
