use std::path::Path;
use std::sync::Arc;

use crate::models::error::CaptureError;

/// Callback a recorder uses to report a fault that happens after `start`
/// returned (device unplugged, encoder crash). The session turns it into a
/// `failure` report.
pub type FaultCallback = Arc<dyn Fn(CaptureError) + Send + Sync + 'static>;

/// Outcome of a microphone permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Platform recording hardware: permission prompt plus an audio encoder
/// writing to a file.
///
/// Owned and driven by a single session worker thread. Every call must
/// return within the platform's own timeout; a hang here stalls the session.
pub trait TapeRecorder: Send + 'static {
    /// Ask for microphone access. Denial is `Ok(Permission::Denied)`;
    /// `Err` is reserved for the request itself failing.
    fn request_permission(&mut self) -> Result<Permission, CaptureError>;

    /// Begin encoding into `file_path`.
    fn start(&mut self, file_path: &Path, on_fault: FaultCallback) -> Result<(), CaptureError>;

    fn pause(&mut self) -> Result<(), CaptureError>;

    fn resume(&mut self) -> Result<(), CaptureError>;

    /// Stop encoding and flush the file. Must be safe to call more than once.
    fn stop(&mut self) -> Result<(), CaptureError>;
}
