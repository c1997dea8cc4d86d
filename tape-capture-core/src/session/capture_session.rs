use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use parking_lot::{Mutex, ReentrantMutex};

use crate::bus::status_bus::{StatusBus, Subscription};
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::report::{SessionReport, Status};
use crate::models::segment::{Location, Segment, SegmentInfo};
use crate::models::state::SessionState;
use crate::queue::manager::SegmentQueueManager;
use crate::session::duration::DurationTracker;
use crate::storage::{metadata, tape_file};
use crate::traits::capture_delegate::SessionDelegate;
use crate::traits::capture_provider::{FaultCallback, Permission, TapeRecorder};
use crate::traits::capture_session::TapeSession;
use crate::traits::clock::{Clock, MonotonicClock};

/// Commands handed from callers to the session worker.
#[derive(Debug)]
enum Command {
    Pause,
    Resume,
    Stop,
    Skip,
    Cancel,
    Fault(CaptureError),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Skip => "skip",
            Self::Cancel => "cancel",
            Self::Fault(_) => "fault",
        }
    }
}

/// State visible to both the caller-side handle and the worker.
struct Shared {
    state: Mutex<SessionState>,
    bus: StatusBus,
    cancelled: AtomicBool,
    /// Held by `cancel` and while a finished tape is queued and reported, so
    /// a cancel lands either before the commit or after its report.
    commit: ReentrantMutex<()>,
}

impl Shared {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Everything the worker needs, collected before `start`.
struct WorkerSetup<R: TapeRecorder> {
    recorder: R,
    config: CaptureConfiguration,
    clock: Arc<dyn Clock>,
    location: Option<Location>,
    title: Option<String>,
    queue: Option<Arc<SegmentQueueManager>>,
}

/// One recording attempt, from `start` to a terminal state.
///
/// Generic over the recording hardware via the `TapeRecorder` trait. All
/// transitions run on a dedicated worker thread that owns the recorder, the
/// tape file and the progress timer:
/// ```text
/// [caller] ── start/pause/resume/stop/skip/cancel ──→ [command channel]
///                                                           ↓
/// [TapeRecorder] ←── worker thread ── ticks ──→ [StatusBus] → observers
///                         ↓ finalize
///                  [SegmentQueueManager]
/// ```
///
/// A session records at most once. After a terminal state, build a new one.
pub struct CaptureSession<R: TapeRecorder> {
    shared: Arc<Shared>,
    setup: Mutex<Option<WorkerSetup<R>>>,
    commands: Mutex<Option<Sender<Command>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl<R: TapeRecorder> CaptureSession<R> {
    pub fn new(recorder: R, config: CaptureConfiguration) -> Result<Self, CaptureError> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::Idle),
                bus: StatusBus::new(),
                cancelled: AtomicBool::new(false),
                commit: ReentrantMutex::new(()),
            }),
            setup: Mutex::new(Some(WorkerSetup {
                recorder,
                config,
                clock: Arc::new(MonotonicClock::new()),
                location: None,
                title: None,
                queue: None,
            })),
            commands: Mutex::new(None),
            worker: Mutex::new(None),
        })
    }

    /// Time source for duration accounting (default: `MonotonicClock`).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        if let Some(setup) = self.setup.get_mut() {
            setup.clock = clock;
        }
        self
    }

    /// Geographic tag stored on the completed segment.
    pub fn with_location(mut self, location: Location) -> Self {
        if let Some(setup) = self.setup.get_mut() {
            setup.location = Some(location);
        }
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        if let Some(setup) = self.setup.get_mut() {
            setup.title = Some(title.into());
        }
        self
    }

    /// Queue that receives the completed segment.
    pub fn with_queue(mut self, queue: Arc<SegmentQueueManager>) -> Self {
        if let Some(setup) = self.setup.get_mut() {
            setup.queue = Some(queue);
        }
        self
    }

    pub fn state(&self) -> SessionState {
        self.shared.state.lock().clone()
    }

    pub fn observe<F>(&self, status: Status, callback: F) -> Subscription
    where
        F: Fn(SessionReport) + Send + Sync + 'static,
    {
        self.shared.bus.subscribe(status, callback)
    }

    pub fn unobserve(&self, subscription: Subscription) -> bool {
        self.shared.bus.unsubscribe(subscription)
    }

    pub fn attach_delegate(&self, delegate: Arc<dyn SessionDelegate>) -> Vec<Subscription> {
        self.shared.bus.attach_delegate(delegate)
    }

    /// Request permission and begin recording. Transitions: idle → recording.
    pub fn start(&self) {
        let Some(setup) = self.setup.lock().take() else {
            log::warn!("start ignored: session is {}", self.state().name());
            return;
        };

        let (tx, rx) = mpsc::channel();
        let fault_tx = tx.clone();
        let on_fault: FaultCallback = Arc::new(move |error: CaptureError| {
            // The worker may already have finished; late faults are dropped.
            let _ = fault_tx.send(Command::Fault(error));
        });

        let worker = Worker::new(setup, Arc::clone(&self.shared), rx, on_fault);
        let spawned = thread::Builder::new()
            .name("tape-capture-session".into())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                *self.commands.lock() = Some(tx);
                *self.worker.lock() = Some(handle);
            }
            Err(e) => {
                log::error!("Failed to spawn capture worker: {}", e);
                let error = CaptureError::system(e);
                *self.shared.state.lock() = SessionState::Failed(error.clone());
                self.shared
                    .bus
                    .publish(Status::Failure, &SessionReport::failure(0.0, error));
            }
        }
    }

    /// Transitions: recording → paused.
    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    /// Transitions: paused → recording.
    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    /// Finalize the tape. Transitions: recording/paused → finalizing → succeeded/failed.
    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Discard the recording. Transitions: recording/paused → skipped.
    pub fn skip(&self) {
        self.send(Command::Skip);
    }

    /// Abort from any state. Idempotent.
    ///
    /// Observers are unregistered before this returns; the worker releases
    /// the recorder and removes the partial tape. A pending `stop` is
    /// superseded: its tape is discarded instead of queued.
    pub fn cancel(&self) {
        {
            let _commit = self.shared.commit.lock();
            self.shared.cancelled.store(true, Ordering::SeqCst);
            self.shared.bus.close();
        }

        if self.setup.lock().take().is_some() {
            *self.shared.state.lock() = SessionState::Cancelled;
            log::info!("Capture session cancelled before start");
            return;
        }

        if let Some(tx) = self.commands.lock().as_ref() {
            // A finished worker has dropped its receiver; nothing left to cancel.
            let _ = tx.send(Command::Cancel);
        }
    }

    fn send(&self, command: Command) {
        let name = command.name();
        let delivered = match self.commands.lock().as_ref() {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        };
        if !delivered {
            log::warn!("{} ignored: session is {}", name, self.state().name());
        }
    }
}

impl<R: TapeRecorder> TapeSession for CaptureSession<R> {
    fn state(&self) -> SessionState {
        CaptureSession::state(self)
    }

    fn start(&self) {
        CaptureSession::start(self)
    }

    fn pause(&self) {
        CaptureSession::pause(self)
    }

    fn resume(&self) {
        CaptureSession::resume(self)
    }

    fn stop(&self) {
        CaptureSession::stop(self)
    }

    fn skip(&self) {
        CaptureSession::skip(self)
    }

    fn cancel(&self) {
        CaptureSession::cancel(self)
    }

    fn observe(
        &self,
        status: Status,
        callback: Box<dyn Fn(SessionReport) + Send + Sync + 'static>,
    ) -> Subscription {
        self.shared.bus.subscribe(status, callback)
    }

    fn unobserve(&self, subscription: Subscription) -> bool {
        CaptureSession::unobserve(self, subscription)
    }
}

impl<R: TapeRecorder> Drop for CaptureSession<R> {
    fn drop(&mut self) {
        self.cancel();
        self.commands.lock().take();

        if let Some(handle) = self.worker.lock().take() {
            // An observer dropping the last handle runs on the worker itself.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

/// Owns the recorder for the lifetime of one recording.
///
/// Dropping the worker stops active hardware and removes an unfinished tape,
/// whichever path the thread leaves by.
struct Worker<R: TapeRecorder> {
    recorder: R,
    config: CaptureConfiguration,
    clock: Arc<dyn Clock>,
    location: Option<Location>,
    title: Option<String>,
    queue: Option<Arc<SegmentQueueManager>>,
    shared: Arc<Shared>,
    commands: Receiver<Command>,
    on_fault: FaultCallback,
    tracker: DurationTracker,
    tape_path: Option<PathBuf>,
    hardware_active: bool,
    next_tick: Instant,
}

impl<R: TapeRecorder> Worker<R> {
    fn new(
        setup: WorkerSetup<R>,
        shared: Arc<Shared>,
        commands: Receiver<Command>,
        on_fault: FaultCallback,
    ) -> Self {
        Self {
            recorder: setup.recorder,
            config: setup.config,
            clock: setup.clock,
            location: setup.location,
            title: setup.title,
            queue: setup.queue,
            shared,
            commands,
            on_fault,
            tracker: DurationTracker::new(),
            tape_path: None,
            hardware_active: false,
            next_tick: Instant::now(),
        }
    }

    fn run(mut self) {
        self.begin();

        while !self.state().is_terminal() {
            if self.shared.is_cancelled() {
                self.cancel();
                break;
            }
            let command = if self.state().is_recording() {
                let timeout = self.next_tick.saturating_duration_since(Instant::now());
                match self.commands.recv_timeout(timeout) {
                    Ok(command) => command,
                    Err(RecvTimeoutError::Timeout) => {
                        self.tick();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => Command::Cancel,
                }
            } else {
                self.commands.recv().unwrap_or(Command::Cancel)
            };
            self.handle(command);
        }

        log::debug!("Capture worker exiting in state {}", self.state().name());
    }

    fn handle(&mut self, command: Command) {
        let state = self.state();
        match (command, state) {
            (Command::Pause, SessionState::Recording { .. }) => self.pause(),
            (Command::Resume, SessionState::Paused { .. }) => self.resume(),
            (Command::Stop, s) if s.is_active() => self.finalize(),
            (Command::Skip, s) if s.is_active() => self.skip(),
            (Command::Cancel, _) => self.cancel(),
            (Command::Fault(error), s) if s.is_active() => {
                log::error!("Recorder fault: {}", error);
                self.fail(error);
            }
            (command, state) => {
                log::warn!("{} ignored: session is {}", command.name(), state.name());
            }
        }
    }

    /// idle → recording, or a terminal failure if permission or hardware says no.
    fn begin(&mut self) {
        log::info!("Starting tape capture");
        match self.recorder.request_permission() {
            Ok(Permission::Granted) => {}
            Ok(Permission::Denied) => {
                log::warn!("Microphone permission denied");
                self.fail(CaptureError::MicPermissionDenied);
                return;
            }
            Err(e) => {
                self.fail(e);
                return;
            }
        }

        if let Err(e) = self.start_recorder() {
            log::error!("Failed to start recorder: {}", e);
            self.fail(e);
        }
    }

    fn start_recorder(&mut self) -> Result<(), CaptureError> {
        tape_file::prepare_directory(&self.config.output_directory)?;
        let path = tape_file::tape_path(&self.config.output_directory, &self.config.file_extension);
        self.tape_path = Some(path.clone());

        self.recorder.start(&path, Arc::clone(&self.on_fault))?;
        self.hardware_active = true;

        self.tracker.start(self.clock.now());
        self.next_tick = Instant::now() + self.config.tick_interval;
        self.set_state(SessionState::Recording { duration_secs: 0.0 });
        log::info!("Recording tape to {}", path.display());
        Ok(())
    }

    fn tick(&mut self) {
        let now = Instant::now();
        self.next_tick += self.config.tick_interval;
        if self.next_tick <= now {
            // Fell behind (slow observers); skip missed ticks instead of bursting.
            self.next_tick = now + self.config.tick_interval;
        }

        let elapsed = self.elapsed_secs();
        self.set_state(SessionState::Recording {
            duration_secs: elapsed,
        });
        self.publish(Status::Progress, SessionReport::progress(elapsed));

        if elapsed >= self.config.recording_duration_max {
            log::info!(
                "Maximum duration {}s reached, finalizing",
                self.config.recording_duration_max
            );
            self.finalize();
        }
    }

    fn pause(&mut self) {
        if let Err(e) = self.recorder.pause() {
            self.fail(e);
            return;
        }
        self.tracker.pause(self.clock.now());

        let elapsed = self.elapsed_secs();
        self.set_state(SessionState::Paused {
            duration_secs: elapsed,
        });
        self.publish(Status::Pause, SessionReport::progress(elapsed));
    }

    fn resume(&mut self) {
        if let Err(e) = self.recorder.resume() {
            self.fail(e);
            return;
        }
        self.tracker.resume(self.clock.now());
        self.next_tick = Instant::now() + self.config.tick_interval;

        let elapsed = self.elapsed_secs();
        self.set_state(SessionState::Recording {
            duration_secs: elapsed,
        });
        self.publish(Status::Resume, SessionReport::progress(elapsed));
    }

    /// recording/paused → finalizing → succeeded, or failed when too short,
    /// unreadable, or refused by the queue.
    fn finalize(&mut self) {
        let elapsed = self.elapsed_secs();
        self.set_state(SessionState::Finalizing);

        if let Err(e) = self.stop_hardware() {
            self.fail(e);
            return;
        }

        if elapsed < self.config.recording_duration_min {
            log::info!(
                "Tape of {:.1}s is below the {}s minimum",
                elapsed,
                self.config.recording_duration_min
            );
            self.fail(CaptureError::TooShort);
            return;
        }

        let shared = Arc::clone(&self.shared);
        let _commit = shared.commit.lock();
        if shared.is_cancelled() {
            self.cancel();
            return;
        }

        let segment = match self.build_segment(elapsed) {
            Ok(segment) => segment,
            Err(e) => {
                log::error!("Failed to finalize tape: {}", e);
                self.fail(e);
                return;
            }
        };

        // From here on the file belongs to the segment.
        self.tape_path = None;

        if let Some(queue) = &self.queue {
            if let Err(error) = queue.try_enqueue(segment.clone()) {
                if error.is_queue_rejection() {
                    log::warn!("Queue full, keeping tape {:?} out of the queue", segment.id());
                } else {
                    log::error!("Failed to enqueue tape: {}", error);
                }
                self.set_state(SessionState::Failed(error.clone()));
                self.publish(
                    Status::Failure,
                    SessionReport::rejected(elapsed, error, segment),
                );
                return;
            }
        }

        log::info!("Tape {:?} completed ({:.1}s)", segment.id(), elapsed);
        self.set_state(SessionState::Succeeded {
            duration_secs: elapsed,
        });
        self.publish(Status::Success, SessionReport::success(elapsed, segment));
    }

    fn build_segment(&self, elapsed: f64) -> Result<Segment, CaptureError> {
        let path = self
            .tape_path
            .clone()
            .ok_or_else(|| CaptureError::system_msg("tape file path missing"))?;
        let file = tape_file::finalize(&path)?;

        let mut segment = Segment::from_audio_url(path.clone());
        segment.set_info(SegmentInfo {
            id: Some(uuid::Uuid::new_v4().to_string()),
            title: self.title.clone(),
            duration: Some(elapsed),
            size: Some(file.size),
            location: self.location,
            checksum: Some(file.checksum),
            recorded_at: Some(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        })?;

        if self.config.write_metadata_sidecar {
            metadata::write_metadata(&segment, &path)?;
        }
        Ok(segment)
    }

    fn skip(&mut self) {
        let elapsed = self.elapsed_secs();
        self.release();
        log::info!("Tape skipped after {:.1}s", elapsed);
        self.set_state(SessionState::Skipped);
        self.publish(Status::Skip, SessionReport::skipped(elapsed));
    }

    fn cancel(&mut self) {
        self.release();
        self.shared.bus.close();
        log::info!("Capture session cancelled");
        self.set_state(SessionState::Cancelled);
    }

    /// Terminal failure: release everything, then report once.
    fn fail(&mut self, error: CaptureError) {
        let elapsed = self.elapsed_secs();
        self.release();
        self.set_state(SessionState::Failed(error.clone()));
        self.publish(Status::Failure, SessionReport::failure(elapsed, error));
    }

    fn stop_hardware(&mut self) -> Result<(), CaptureError> {
        if self.hardware_active {
            self.hardware_active = false;
            self.recorder.stop()?;
        }
        Ok(())
    }

    /// Stop the recorder and delete the unfinished tape, logging failures.
    fn release(&mut self) {
        if let Err(e) = self.stop_hardware() {
            log::error!("Failed to stop recorder: {}", e);
        }
        if let Some(path) = self.tape_path.take() {
            if let Err(e) = tape_file::discard(&path) {
                log::error!("Failed to discard {}: {}", path.display(), e);
            }
        }
    }

    fn elapsed_secs(&self) -> f64 {
        self.tracker.elapsed_secs(self.clock.now())
    }

    fn state(&self) -> SessionState {
        self.shared.state.lock().clone()
    }

    fn set_state(&self, new_state: SessionState) {
        let mut state = self.shared.state.lock();
        if state.name() != new_state.name() {
            log::info!("Capture session {} → {}", state.name(), new_state.name());
        }
        *state = new_state;
    }

    fn publish(&self, status: Status, report: SessionReport) {
        self.shared.bus.publish(status, &report);
    }
}

impl<R: TapeRecorder> Drop for Worker<R> {
    fn drop(&mut self) {
        self.release();
    }
}
