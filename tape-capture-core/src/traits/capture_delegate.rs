use crate::models::report::SessionReport;

/// Single-object observer for every session status.
///
/// An alternative to registering one closure per status on the `StatusBus`.
/// All methods are called from the session's worker thread; keep them short
/// and marshal to the UI thread if needed. Every method defaults to a no-op.
pub trait SessionDelegate: Send + Sync {
    /// Called on each progress tick while recording.
    fn on_progress(&self, _report: &SessionReport) {}

    /// Called once when a tape completes and is queued.
    fn on_success(&self, _report: &SessionReport) {}

    /// Called once when a session fails, including queue rejections.
    fn on_failure(&self, _report: &SessionReport) {}

    fn on_pause(&self, _report: &SessionReport) {}

    fn on_resume(&self, _report: &SessionReport) {}

    /// Called once when the user skips the recording.
    fn on_skip(&self, _report: &SessionReport) {}
}
