/// Storage length above which dequeues may trigger compaction.
const COMPACT_MIN_LEN: usize = 50;

/// Fraction of dead head slots that triggers compaction.
const COMPACT_HEAD_RATIO: f64 = 0.25;

/// FIFO queue with a head cursor and periodic compaction.
///
/// Dequeued slots are cleared in place and only dropped from the backing
/// vector once they make up more than a quarter of a storage longer than 50
/// slots, so memory stays bounded by the queue's high-water mark while
/// dequeue remains amortized O(1).
///
/// Not synchronized: wrap in `parking_lot::Mutex` for cross-thread access.
/// Capacity limits belong to the owner (see `SegmentQueueManager`).
#[derive(Debug, Clone)]
pub struct BoundedQueue<T> {
    storage: Vec<Option<T>>,
    head: usize,
}

impl<T> BoundedQueue<T> {
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            head: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Vec::with_capacity(capacity),
            head: 0,
        }
    }

    /// Append to the tail. Always succeeds.
    pub fn enqueue(&mut self, item: T) {
        self.storage.push(Some(item));
    }

    /// Remove and return the oldest item.
    pub fn dequeue(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let item = self.storage[self.head].take();
        self.head += 1;

        let len = self.storage.len();
        if len > COMPACT_MIN_LEN && (self.head as f64 / len as f64) > COMPACT_HEAD_RATIO {
            self.storage.drain(..self.head);
            self.head = 0;
        }

        item
    }

    /// The oldest item, without removing it.
    pub fn peek_front(&self) -> Option<&T> {
        self.storage.get(self.head).and_then(Option::as_ref)
    }

    /// Number of live items.
    pub fn count(&self) -> usize {
        self.storage.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Length of the backing storage, cleared slots included.
    pub fn storage_len(&self) -> usize {
        self.storage.len()
    }

    /// Live items, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.storage[self.head..].iter().filter_map(Option::as_ref)
    }
}

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let mut queue = BoundedQueue::new();
        queue.enqueue(1);
        queue.enqueue(2);
        queue.enqueue(3);

        assert_eq!(queue.count(), 3);
        assert_eq!(queue.peek_front(), Some(&1));
        assert_eq!(queue.dequeue(), Some(1));
        assert_eq!(queue.dequeue(), Some(2));
        assert_eq!(queue.peek_front(), Some(&3));
        assert_eq!(queue.count(), 1);
    }

    #[test]
    fn dequeue_empty_does_not_mutate() {
        let mut queue: BoundedQueue<u32> = BoundedQueue::new();
        assert!(queue.dequeue().is_none());
        assert!(queue.is_empty());
        assert_eq!(queue.storage_len(), 0);

        queue.enqueue(7);
        queue.dequeue();
        let len_before = queue.storage_len();
        assert!(queue.dequeue().is_none());
        assert_eq!(queue.storage_len(), len_before);
        assert_eq!(queue.count(), 0);
    }

    #[test]
    fn small_queue_keeps_cleared_slots() {
        let mut queue = BoundedQueue::new();
        for i in 0..10 {
            queue.enqueue(i);
        }
        for _ in 0..8 {
            queue.dequeue();
        }

        // Below the 50-slot threshold nothing is compacted.
        assert_eq!(queue.storage_len(), 10);
        assert_eq!(queue.count(), 2);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![8, 9]);
    }

    #[test]
    fn compaction_preserves_live_items() {
        let mut queue = BoundedQueue::new();
        for i in 0..60 {
            queue.enqueue(i);
        }

        // 15 / 60 = 0.25 is not above the ratio yet.
        for i in 0..15 {
            assert_eq!(queue.dequeue(), Some(i));
        }
        assert_eq!(queue.storage_len(), 60);

        // 16 / 60 crosses it: storage shrinks to the live items.
        assert_eq!(queue.dequeue(), Some(15));
        assert_eq!(queue.storage_len(), 44);
        assert_eq!(queue.count(), 44);

        let rest: Vec<_> = std::iter::from_fn(|| queue.dequeue()).collect();
        assert_eq!(rest, (16..60).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn count_tracks_interleaved_operations() {
        let mut queue = BoundedQueue::new();
        let mut enqueued = 0usize;
        let mut dequeued = 0usize;

        for round in 0..200 {
            queue.enqueue(round);
            enqueued += 1;
            if round % 3 != 0 && queue.dequeue().is_some() {
                dequeued += 1;
            }
            assert_eq!(queue.count(), enqueued - dequeued);
            assert!(queue.storage_len() >= queue.count());
        }

        let mut expected = dequeued;
        while let Some(item) = queue.dequeue() {
            assert_eq!(item, expected);
            expected += 1;
        }
        assert_eq!(expected, enqueued);
    }

    #[test]
    fn memory_bounded_under_churn() {
        let mut queue = BoundedQueue::new();
        for i in 0..10_000 {
            queue.enqueue(i);
            queue.dequeue();
        }
        assert!(queue.is_empty());
        assert!(queue.storage_len() <= 51);
    }
}
