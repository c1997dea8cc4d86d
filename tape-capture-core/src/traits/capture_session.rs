use crate::bus::status_bus::Subscription;
use crate::models::report::{SessionReport, Status};
use crate::models::state::SessionState;

/// Control surface of a single recording attempt.
///
/// Every command is fire-and-forget: it is handed to the session's worker
/// and its effect is observed only through subscribed callbacks. Commands
/// that do not apply to the current state are ignored.
pub trait TapeSession: Send + Sync {
    /// Current session state.
    fn state(&self) -> SessionState;

    /// Request permission and begin recording. Transitions: idle → recording.
    fn start(&self);

    /// Transitions: recording → paused.
    fn pause(&self);

    /// Transitions: paused → recording.
    fn resume(&self);

    /// Finalize the tape.
    /// Transitions: recording/paused → finalizing → succeeded/failed.
    fn stop(&self);

    /// Discard the recording on purpose. Transitions: recording/paused → skipped.
    fn skip(&self);

    /// Abort from any state. Idempotent; no events are delivered afterwards.
    fn cancel(&self);

    /// Register `callback` for `status`. Observers of one status run in
    /// registration order.
    fn observe(
        &self,
        status: Status,
        callback: Box<dyn Fn(SessionReport) + Send + Sync + 'static>,
    ) -> Subscription;

    fn unobserve(&self, subscription: Subscription) -> bool;
}
