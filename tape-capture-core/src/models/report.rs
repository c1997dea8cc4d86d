use super::error::CaptureError;
use super::segment::Segment;

/// Observer key for session events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Progress,
    Success,
    Failure,
    Pause,
    Resume,
    Skip,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Progress,
        Status::Success,
        Status::Failure,
        Status::Pause,
        Status::Resume,
        Status::Skip,
    ];
}

/// Snapshot of a session delivered to observers.
///
/// Built fresh for every event. `progress` is the elapsed recording time in
/// seconds; at most one of `error` / `segment` is meaningful per status, except
/// a queue rejection, which carries both the error and the un-queued segment.
#[derive(Debug, Clone)]
pub struct SessionReport {
    progress: f64,
    error: Option<CaptureError>,
    segment: Option<Segment>,
}

impl SessionReport {
    pub fn progress(progress: f64) -> Self {
        Self {
            progress,
            error: None,
            segment: None,
        }
    }

    pub fn success(progress: f64, segment: Segment) -> Self {
        Self {
            progress,
            error: None,
            segment: Some(segment),
        }
    }

    pub fn failure(progress: f64, error: CaptureError) -> Self {
        Self {
            progress,
            error: Some(error),
            segment: None,
        }
    }

    /// Recording succeeded but the queue refused the segment.
    pub fn rejected(progress: f64, error: CaptureError, segment: Segment) -> Self {
        Self {
            progress,
            error: Some(error),
            segment: Some(segment),
        }
    }

    pub fn skipped(progress: f64) -> Self {
        Self::failure(progress, CaptureError::Skipped)
    }

    pub fn progress_secs(&self) -> f64 {
        self.progress
    }

    pub fn error(&self) -> Option<&CaptureError> {
        self.error.as_ref()
    }

    pub fn segment(&self) -> Option<&Segment> {
        self.segment.as_ref()
    }

    pub fn into_segment(self) -> Option<Segment> {
        self.segment
    }
}
