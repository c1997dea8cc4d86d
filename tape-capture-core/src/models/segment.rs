use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Geographic tag of a tape, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in metres (haversine).
    pub fn distance_to(&self, other: &Location) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_METERS * c
    }
}

/// Bulk payload applied to a segment once its recording completes.
///
/// Keys follow the upload payload naming (`audioUrl`, `recordedAt`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmentInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub size: Option<u64>,
    pub audio_url: Option<PathBuf>,
    pub location: Option<Location>,
    pub checksum: Option<String>,
    pub recorded_at: Option<String>,
}

/// One recorded tape.
///
/// A segment starts empty (or holding only its file handle) while recording
/// is in progress, receives its metadata through a single `set_info`, and is
/// read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    id: Option<String>,
    location: Option<Location>,
    title: Option<String>,
    duration: Option<f64>,
    size: Option<u64>,
    audio_url: Option<PathBuf>,
    checksum: Option<String>,
    recorded_at: Option<String>,
    #[serde(skip)]
    sealed: bool,
}

impl Segment {
    pub fn from_audio_url(audio_url: impl Into<PathBuf>) -> Self {
        Self {
            audio_url: Some(audio_url.into()),
            ..Default::default()
        }
    }

    /// Apply completion metadata. Fields absent from `info` keep their value.
    pub fn set_info(&mut self, info: SegmentInfo) -> Result<(), CaptureError> {
        if self.sealed {
            return Err(CaptureError::SegmentSealed);
        }

        let SegmentInfo {
            id,
            title,
            duration,
            size,
            audio_url,
            location,
            checksum,
            recorded_at,
        } = info;

        self.id = id.or(self.id.take());
        self.title = title.or(self.title.take());
        self.duration = duration.or(self.duration);
        self.size = size.or(self.size);
        self.audio_url = audio_url.or(self.audio_url.take());
        self.location = location.or(self.location);
        self.checksum = checksum.or(self.checksum.take());
        self.recorded_at = recorded_at.or(self.recorded_at.take());
        self.sealed = true;
        Ok(())
    }

    /// `set_info` from a key-value JSON object.
    pub fn apply_payload(&mut self, payload: &serde_json::Value) -> Result<(), CaptureError> {
        let info = SegmentInfo::deserialize(payload)
            .map_err(|e| CaptureError::InvalidPayload(e.to_string()))?;
        self.set_info(info)
    }

    /// A segment without a file handle is still being recorded.
    pub fn is_in_progress(&self) -> bool {
        self.audio_url.is_none()
    }

    pub(crate) fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn audio_url(&self) -> Option<&Path> {
        self.audio_url.as_deref()
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    pub fn recorded_at(&self) -> Option<&str> {
        self.recorded_at.as_deref()
    }
}
