//! Shared fixtures for session tests: a scripted recorder and report capture.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::report::{SessionReport, Status};
use crate::session::capture_session::CaptureSession;
use crate::traits::capture_provider::{FaultCallback, Permission, TapeRecorder};

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Config writing into a per-test temp directory, ticking every 5 ms.
pub(crate) fn test_config(name: &str) -> CaptureConfiguration {
    CaptureConfiguration {
        output_directory: std::env::temp_dir()
            .join(format!("tape_capture_{}_{}", std::process::id(), name)),
        tick_interval: Duration::from_millis(5),
        ..Default::default()
    }
}

/// Poll `condition` until it holds or the timeout passes.
pub(crate) fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

#[derive(Default)]
struct MonitorState {
    calls: Vec<&'static str>,
    recording: bool,
    on_fault: Option<FaultCallback>,
}

/// Test-side view of a `FakeRecorder`.
#[derive(Clone, Default)]
pub(crate) struct RecorderMonitor {
    inner: Arc<Mutex<MonitorState>>,
}

impl RecorderMonitor {
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.inner.lock().calls.clone()
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.inner.lock().recording
    }

    /// Raise an asynchronous hardware fault, as a device would.
    pub(crate) fn fault(&self, error: CaptureError) {
        let callback = self.inner.lock().on_fault.clone();
        if let Some(callback) = callback {
            callback(error);
        }
    }
}

/// Recorder that writes a few bytes to the tape path instead of encoding audio.
pub(crate) struct FakeRecorder {
    permission: Permission,
    fail_on: Option<&'static str>,
    monitor: RecorderMonitor,
}

impl FakeRecorder {
    pub(crate) fn new() -> (Self, RecorderMonitor) {
        Self::build(Permission::Granted, None)
    }

    pub(crate) fn denied() -> (Self, RecorderMonitor) {
        Self::build(Permission::Denied, None)
    }

    /// Recorder whose `call` ("start", "pause", "resume" or "stop") errors.
    pub(crate) fn failing_on(call: &'static str) -> (Self, RecorderMonitor) {
        Self::build(Permission::Granted, Some(call))
    }

    fn build(permission: Permission, fail_on: Option<&'static str>) -> (Self, RecorderMonitor) {
        let monitor = RecorderMonitor::default();
        let recorder = Self {
            permission,
            fail_on,
            monitor: monitor.clone(),
        };
        (recorder, monitor)
    }

    fn record(&self, call: &'static str) -> Result<(), CaptureError> {
        self.monitor.inner.lock().calls.push(call);
        if self.fail_on == Some(call) {
            return Err(CaptureError::system_msg(format!("{} failed", call)));
        }
        Ok(())
    }
}

impl TapeRecorder for FakeRecorder {
    fn request_permission(&mut self) -> Result<Permission, CaptureError> {
        self.record("permission")?;
        Ok(self.permission)
    }

    fn start(&mut self, file_path: &Path, on_fault: FaultCallback) -> Result<(), CaptureError> {
        self.record("start")?;
        fs::write(file_path, b"fake aac frames").map_err(CaptureError::system)?;

        let mut state = self.monitor.inner.lock();
        state.recording = true;
        state.on_fault = Some(on_fault);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), CaptureError> {
        self.record("pause")
    }

    fn resume(&mut self) -> Result<(), CaptureError> {
        self.record("resume")
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.record("stop")?;
        let mut state = self.monitor.inner.lock();
        state.recording = false;
        state.on_fault = None;
        Ok(())
    }
}

/// Every report a session published, per status.
#[derive(Clone, Default)]
pub(crate) struct ReportLog {
    reports: Arc<Mutex<Vec<(Status, SessionReport)>>>,
}

impl ReportLog {
    pub(crate) fn attach<R: TapeRecorder>(session: &CaptureSession<R>) -> Self {
        let log = Self::default();
        for status in Status::ALL {
            let reports = Arc::clone(&log.reports);
            session.observe(status, move |report| reports.lock().push((status, report)));
        }
        log
    }

    pub(crate) fn count(&self, status: Status) -> usize {
        self.reports.lock().iter().filter(|(s, _)| *s == status).count()
    }

    /// Reports other than progress ticks.
    pub(crate) fn total(&self) -> usize {
        self.reports
            .lock()
            .iter()
            .filter(|(s, _)| *s != Status::Progress)
            .count()
    }

    pub(crate) fn last(&self, status: Status) -> Option<SessionReport> {
        self.reports
            .lock()
            .iter()
            .rev()
            .find(|(s, _)| *s == status)
            .map(|(_, report)| report.clone())
    }
}
