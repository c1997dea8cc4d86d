//! # tape-capture-core
//!
//! Tape capture pipeline for short location-tagged audio recordings.
//!
//! Provides the capture session state machine, the status-keyed observer
//! bus, and the bounded queue that holds completed tapes until upload.
//! Platform recording hardware implements the `TapeRecorder` trait and plugs
//! into the generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! tape-capture-core (this crate)
//! ├── traits/       ← TapeRecorder, TapeSession, SessionDelegate, Clock
//! ├── models/       ← CaptureError, SessionState, CaptureConfiguration, Segment, SessionReport
//! ├── processing/   ← BoundedQueue
//! ├── queue/        ← SegmentQueueManager, location-radius policy
//! ├── bus/          ← StatusBus
//! ├── session/      ← CaptureSession (worker thread orchestrator)
//! └── storage/      ← tape file finalization, metadata sidecar
//! ```

pub mod bus;
pub mod models;
pub mod processing;
pub mod queue;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience.
pub use bus::status_bus::{StatusBus, StatusCallback, Subscription};
pub use models::config::{
    CaptureConfiguration, FILE_EXTENSION, QUEUE_MAX, QUEUE_MIN, RADIUS_METERS,
    RECORDING_DURATION_MAX, RECORDING_DURATION_MIN,
};
pub use models::error::{CaptureError, SystemCause};
pub use models::report::{SessionReport, Status};
pub use models::segment::{Location, Segment, SegmentInfo};
pub use models::state::SessionState;
pub use processing::bounded_queue::BoundedQueue;
pub use queue::manager::{is_eligible, SegmentQueueManager};
pub use session::capture_session::CaptureSession;
pub use storage::tape_file::TapeFileInfo;
pub use traits::capture_delegate::SessionDelegate;
pub use traits::capture_provider::{FaultCallback, Permission, TapeRecorder};
pub use traits::capture_session::TapeSession;
pub use traits::clock::{Clock, ManualClock, MonotonicClock};
