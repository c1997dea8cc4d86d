use std::error::Error as StdError;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use thiserror::Error;

/// Errors surfaced by the tape capture pipeline.
///
/// Cloneable so a single failure can be fanned out to every observer of a
/// session. Platform causes are kept behind `System` and remain reachable
/// through `Error::source`.
#[derive(Debug, Error, Clone)]
pub enum CaptureError {
    #[error("recording is shorter than the minimum duration")]
    TooShort,

    #[error("microphone permission denied")]
    MicPermissionDenied,

    #[error("location permission unavailable")]
    LocationPermissionError,

    #[error("system error: {0}")]
    System(#[source] SystemCause),

    #[error("unknown error")]
    Unknown,

    #[error("playback ended")]
    PlaybackEnded,

    #[error("recording skipped")]
    Skipped,

    #[error("tape queue cannot accept more tapes")]
    NeedMoreTapes,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("segment info has already been set")]
    SegmentSealed,

    #[error("segment has no audio file and cannot be queued")]
    SegmentInProgress,

    #[error("invalid segment payload: {0}")]
    InvalidPayload(String),
}

impl CaptureError {
    /// Wrap an underlying platform error.
    pub fn system<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::System(SystemCause(Arc::new(err)))
    }

    /// Wrap a bare message as a platform error.
    pub fn system_msg(message: impl Into<String>) -> Self {
        Self::System(SystemCause(Arc::new(SystemMessage(message.into()))))
    }

    /// Whether this error belongs to the queue manager rather than the recording.
    pub fn is_queue_rejection(&self) -> bool {
        matches!(self, Self::NeedMoreTapes)
    }
}

/// Shared platform cause carried by `CaptureError::System`.
///
/// Derefs to the wrapped error and does not implement `Error` itself, so
/// `CaptureError::source` returns the cause rather than this wrapper.
#[derive(Clone)]
pub struct SystemCause(Arc<dyn StdError + Send + Sync>);

impl Deref for SystemCause {
    type Target = dyn StdError + Send + Sync;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Display for SystemCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl fmt::Debug for SystemCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct SystemMessage(String);

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn system_preserves_source() {
        let err = CaptureError::system(io::Error::new(io::ErrorKind::NotFound, "no mic node"));
        assert_eq!(err.to_string(), "system error: no mic node");

        let source = err.source().expect("source kept");
        let io_err = source.downcast_ref::<io::Error>().expect("io error");
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn system_msg_displays_message() {
        let err = CaptureError::system_msg("encoder stalled");
        assert_eq!(err.to_string(), "system error: encoder stalled");
    }

    #[test]
    fn system_msg_source_is_the_message() {
        let err = CaptureError::system_msg("device lost");
        let source = err.source().expect("source kept");
        assert_eq!(source.to_string(), "device lost");
        assert!(source.source().is_none());
    }

    #[test]
    fn clone_shares_cause() {
        let err = CaptureError::system_msg("boom");
        let copy = err.clone();
        assert_eq!(err.to_string(), copy.to_string());
    }

    #[test]
    fn queue_rejection_is_distinguished() {
        assert!(CaptureError::NeedMoreTapes.is_queue_rejection());
        assert!(!CaptureError::TooShort.is_queue_rejection());
    }
}
