use parking_lot::Mutex;

use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::segment::{Location, Segment};
use crate::processing::bounded_queue::BoundedQueue;

/// Whether `candidate` is at least `radius_meters` from every queued location.
///
/// Pure predicate; callers consult it before starting a session. An empty
/// list is always eligible.
pub fn is_eligible(candidate: &Location, queued: &[Location], radius_meters: f64) -> bool {
    queued
        .iter()
        .all(|location| candidate.distance_to(location) >= radius_meters)
}

/// Holds completed segments until the upload pipeline takes them.
///
/// One producer (a finalizing capture session) and one consumer (upload) may
/// use it concurrently; every mutation happens inside a single lock scope.
pub struct SegmentQueueManager {
    queue: Mutex<BoundedQueue<Segment>>,
    queue_min: usize,
    queue_max: usize,
    radius_meters: f64,
}

impl SegmentQueueManager {
    pub fn new(config: &CaptureConfiguration) -> Self {
        Self {
            queue: Mutex::new(BoundedQueue::with_capacity(config.queue_max)),
            queue_min: config.queue_min,
            queue_max: config.queue_max,
            radius_meters: config.radius_meters,
        }
    }

    /// Queue a completed segment, returning the new queue size.
    ///
    /// Fails with `NeedMoreTapes` once `queue_max` segments are waiting, and
    /// with `SegmentInProgress` for a segment that has no audio file.
    pub fn try_enqueue(&self, segment: Segment) -> Result<usize, CaptureError> {
        if segment.is_in_progress() {
            return Err(CaptureError::SegmentInProgress);
        }

        let mut queue = self.queue.lock();
        if queue.count() >= self.queue_max {
            log::warn!(
                "Tape queue full ({}/{}), rejecting segment {:?}",
                queue.count(),
                self.queue_max,
                segment.id()
            );
            return Err(CaptureError::NeedMoreTapes);
        }

        queue.enqueue(segment);
        let size = queue.count();
        log::debug!("Queued segment, {} waiting for upload", size);
        Ok(size)
    }

    /// Pop the oldest segment for upload.
    pub fn dequeue(&self) -> Option<Segment> {
        self.queue.lock().dequeue()
    }

    pub fn peek_front(&self) -> Option<Segment> {
        self.queue.lock().peek_front().cloned()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().count()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.lock().count() >= self.queue_max
    }

    /// Whether enough segments are waiting to release an upload batch.
    pub fn has_minimum(&self) -> bool {
        self.queue.lock().count() >= self.queue_min
    }

    /// Drain every queued segment, oldest first, once `queue_min` is reached.
    pub fn take_batch(&self) -> Result<Vec<Segment>, CaptureError> {
        let mut queue = self.queue.lock();
        if queue.count() < self.queue_min {
            return Err(CaptureError::NeedMoreTapes);
        }

        let mut batch = Vec::with_capacity(queue.count());
        while let Some(segment) = queue.dequeue() {
            batch.push(segment);
        }
        Ok(batch)
    }

    /// Locations of queued segments that carry one.
    pub fn queued_locations(&self) -> Vec<Location> {
        self.queue
            .lock()
            .iter()
            .filter_map(Segment::location)
            .collect()
    }

    /// Apply the radius policy against the current queue.
    pub fn is_location_eligible(&self, candidate: &Location) -> bool {
        is_eligible(candidate, &self.queued_locations(), self.radius_meters)
    }
}
