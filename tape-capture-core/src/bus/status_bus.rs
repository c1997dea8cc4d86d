use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::report::{SessionReport, Status};
use crate::traits::capture_delegate::SessionDelegate;

/// Observer callback. Each invocation receives its own copy of the report.
pub type StatusCallback = Arc<dyn Fn(SessionReport) + Send + Sync + 'static>;

/// Handle returned by `subscribe`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
    status: Status,
}

impl Subscription {
    pub fn status(&self) -> Status {
        self.status
    }
}

struct Registration {
    id: u64,
    status: Status,
    callback: StatusCallback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Registration>,
}

/// Status-keyed observer registry.
///
/// `publish` runs every callback registered for a status, in registration
/// order, on the calling thread. The subscriber list is snapshotted before
/// any callback runs, so callbacks may subscribe or unsubscribe freely; such
/// changes take effect from the next `publish`.
#[derive(Default)]
pub struct StatusBus {
    registry: Mutex<Registry>,
    closed: AtomicBool,
}

impl StatusBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, status: Status, callback: F) -> Subscription
    where
        F: Fn(SessionReport) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;

        if self.is_closed() {
            log::debug!("Ignoring {:?} subscription on closed status bus", status);
        } else {
            registry.entries.push(Registration {
                id,
                status,
                callback: Arc::new(callback),
            });
        }

        Subscription { id, status }
    }

    /// Remove a registration. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut registry = self.registry.lock();
        let before = registry.entries.len();
        registry.entries.retain(|entry| entry.id != subscription.id);
        registry.entries.len() != before
    }

    /// Deliver `report` to every subscriber of `status`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn publish(&self, status: Status, report: &SessionReport) -> usize {
        if self.is_closed() {
            return 0;
        }

        let snapshot: Vec<StatusCallback> = {
            let registry = self.registry.lock();
            registry
                .entries
                .iter()
                .filter(|entry| entry.status == status)
                .map(|entry| Arc::clone(&entry.callback))
                .collect()
        };

        let mut delivered = 0;
        for callback in snapshot {
            if self.is_closed() {
                break;
            }
            callback(report.clone());
            delivered += 1;
        }
        log::trace!("Published {:?} to {} subscriber(s)", status, delivered);
        delivered
    }

    /// Route every status to one delegate.
    pub fn attach_delegate(&self, delegate: Arc<dyn SessionDelegate>) -> Vec<Subscription> {
        Status::ALL
            .iter()
            .map(|&status| {
                let delegate = Arc::clone(&delegate);
                self.subscribe(status, move |report| match status {
                    Status::Progress => delegate.on_progress(&report),
                    Status::Success => delegate.on_success(&report),
                    Status::Failure => delegate.on_failure(&report),
                    Status::Pause => delegate.on_pause(&report),
                    Status::Resume => delegate.on_resume(&report),
                    Status::Skip => delegate.on_skip(&report),
                })
            })
            .collect()
    }

    pub fn subscriber_count(&self, status: Status) -> usize {
        self.registry
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }

    /// Drop every registration and stop delivering events.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.registry.lock().entries.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
