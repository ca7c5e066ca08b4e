//! Timestamp-ordered event queue.
//!
//! A binary min-heap laid out in a [`GrowableBuffer`]. The root always holds
//! the earliest event; events with equal timestamps come out in no
//! particular order.

use contagion_buffer::{BufferError, GrowableBuffer};
use contagion_types::{NodeIndex, Timestamp};
use thiserror::Error;

/// Pops between attempts to hand unused buffer chunks back.
const COMPACTION_INTERVAL: u32 = 8;

/// What an event does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Try to infect the target.
    Transmit,
    /// Move the target to Recovered.
    Recover,
    /// End-of-run drain marker. Never dispatched.
    Sentinel,
}

/// A timestamped state change for one node.
///
/// Events are plain owned values: the queue owns them until popped, the
/// runner owns them while processing, and dropping one destroys it.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// When the event fires.
    pub timestamp: Timestamp,
    /// What the event does.
    pub kind: EventKind,
    /// Node the event applies to.
    pub target: NodeIndex,
    /// Coin-toss probability used when this event schedules follow-ups.
    pub probability: f64,
}

impl Event {
    /// Marker carrying the largest timestamp; sorts after every real event.
    pub fn sentinel() -> Self {
        Self {
            timestamp: Timestamp::MAX,
            kind: EventKind::Sentinel,
            target: 0,
            probability: 0.0,
        }
    }

    /// Whether this is the drain marker.
    pub fn is_sentinel(&self) -> bool {
        self.kind == EventKind::Sentinel
    }
}

/// Probabilities attached to newly created events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventProbabilities {
    /// Attached to Transmit events.
    pub transmission: f64,
    /// Attached to Recover events.
    pub recovery: f64,
}

/// Errors from enqueuing events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The heap buffer could not grow.
    #[error("failed to grow event buffer: {0}")]
    Grow(#[from] BufferError),
}

/// Min-heap of pending events keyed by timestamp.
#[derive(Debug)]
pub struct PriorityQueue {
    heap: GrowableBuffer<Event>,
    probabilities: EventProbabilities,
    /// Pops since the buffer was last compacted.
    pops_since_compaction: u32,
}

impl PriorityQueue {
    /// Create an empty queue.
    pub fn new(probabilities: EventProbabilities) -> Result<Self, QueueError> {
        Ok(Self {
            heap: GrowableBuffer::new()?,
            probabilities,
            pops_since_compaction: 0,
        })
    }

    /// Bound the number of pending events.
    pub fn with_max_pending(mut self, max: usize) -> Self {
        self.heap = self.heap.with_max_len(max);
        self
    }

    /// Create an event for `target` at time zero.
    ///
    /// Transmit events carry the transmission probability, Recover events
    /// the recovery probability.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is [`EventKind::Sentinel`].
    pub fn new_event(&self, target: NodeIndex, kind: EventKind) -> Event {
        let probability = match kind {
            EventKind::Transmit => self.probabilities.transmission,
            EventKind::Recover => self.probabilities.recovery,
            EventKind::Sentinel => panic!("sentinel events are not created through new_event"),
        };
        Event {
            timestamp: Timestamp::ZERO,
            kind,
            target,
            probability,
        }
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The earliest pending event.
    pub fn peek(&self) -> Option<&Event> {
        self.heap.get(0)
    }

    /// Enqueue `event`.
    ///
    /// On failure the event is dropped and the queue is unchanged.
    pub fn add(&mut self, event: Event) -> Result<(), QueueError> {
        self.heap.push_back(event)?;
        self.sift_up(self.heap.len() - 1);
        Ok(())
    }

    /// Enqueue both events or neither.
    pub fn add_pair(&mut self, first: Event, second: Event) -> Result<(), QueueError> {
        self.heap.reserve(2)?;
        self.add(first)?;
        self.add(second)
    }

    /// Remove and return the earliest event.
    pub fn pop(&mut self) -> Option<Event> {
        let len = self.heap.len();
        if len == 0 {
            return None;
        }

        self.heap.swap(0, len - 1);
        let event = self.heap.pop_back()?;
        self.sift_down(0);

        self.pops_since_compaction += 1;
        if self.pops_since_compaction >= COMPACTION_INTERVAL && !self.heap.is_empty() {
            self.heap.shrink_to_fit();
            self.pops_since_compaction = 0;
        }
        Some(event)
    }

    fn sift_up(&mut self, mut index: usize) {
        let events = self.heap.as_mut_slice();
        while index > 0 {
            let parent = (index - 1) / 2;
            if events[index].timestamp >= events[parent].timestamp {
                break;
            }
            events.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let events = self.heap.as_mut_slice();
        let len = events.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < len && events[left].timestamp < events[smallest].timestamp {
                smallest = left;
            }
            if right < len && events[right].timestamp < events[smallest].timestamp {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            events.swap(index, smallest);
            index = smallest;
        }
    }

    /// Whether every parent is no later than its children.
    #[cfg(test)]
    fn is_heap(&self) -> bool {
        let events = self.heap.as_slice();
        (1..events.len()).all(|i| events[(i - 1) / 2].timestamp <= events[i].timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const PROBABILITIES: EventProbabilities = EventProbabilities {
        transmission: 0.5,
        recovery: 0.2,
    };

    fn event_at(queue: &PriorityQueue, time: u64, target: NodeIndex) -> Event {
        let mut event = queue.new_event(target, EventKind::Transmit);
        event.timestamp = Timestamp(time);
        event
    }

    #[test]
    fn test_new_event_probabilities() {
        let queue = PriorityQueue::new(PROBABILITIES).unwrap();
        let transmit = queue.new_event(3, EventKind::Transmit);
        let recover = queue.new_event(3, EventKind::Recover);

        assert_eq!(transmit.probability, 0.5);
        assert_eq!(recover.probability, 0.2);
        assert_eq!(transmit.timestamp, Timestamp::ZERO);
        assert_eq!(recover.target, 3);
    }

    #[test]
    #[should_panic(expected = "sentinel")]
    fn test_new_sentinel_event_panics() {
        let queue = PriorityQueue::new(PROBABILITIES).unwrap();
        queue.new_event(0, EventKind::Sentinel);
    }

    #[test]
    fn test_pop_empty() {
        let mut queue = PriorityQueue::new(PROBABILITIES).unwrap();
        assert!(queue.pop().is_none());
        assert!(queue.peek().is_none());
    }

    #[test]
    fn test_pops_in_timestamp_order() {
        let mut queue = PriorityQueue::new(PROBABILITIES).unwrap();
        for (i, time) in [5u64, 1, 9, 3, 3, 7, 0].into_iter().enumerate() {
            let event = event_at(&queue, time, i as NodeIndex);
            queue.add(event).unwrap();
            assert!(queue.is_heap());
        }
        assert_eq!(queue.peek().map(|e| e.timestamp), Some(Timestamp(0)));

        let mut times = Vec::new();
        while let Some(event) = queue.pop() {
            assert!(queue.is_heap());
            times.push(event.timestamp.get());
        }
        assert_eq!(times, vec![0, 1, 3, 3, 5, 7, 9]);
    }

    #[test]
    fn test_heap_invariant_under_random_interleaving() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut queue = PriorityQueue::new(PROBABILITIES).unwrap();
        let mut last_popped = Timestamp::ZERO;

        for round in 0..5_000 {
            if rng.gen_bool(0.6) {
                // Only schedule into the future, as the runner does
                let time = last_popped.get() + rng.gen_range(0..50);
                let event = event_at(&queue, time, round);
                queue.add(event).unwrap();
            } else if let Some(event) = queue.pop() {
                assert!(event.timestamp >= last_popped);
                last_popped = event.timestamp;
            }
            assert!(queue.is_heap());
        }
    }

    #[test]
    fn test_sentinel_sorts_last() {
        let mut queue = PriorityQueue::new(PROBABILITIES).unwrap();
        queue.add(Event::sentinel()).unwrap();
        queue.add(event_at(&queue, u64::MAX - 1, 0)).unwrap();
        queue.add(event_at(&queue, 4, 1)).unwrap();

        assert_eq!(queue.pop().unwrap().timestamp, Timestamp(4));
        assert!(!queue.pop().unwrap().is_sentinel());
        assert!(queue.pop().unwrap().is_sentinel());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_add_fails_when_bounded_queue_is_full() {
        let mut queue = PriorityQueue::new(PROBABILITIES)
            .unwrap()
            .with_max_pending(2);
        queue.add(event_at(&queue, 2, 0)).unwrap();
        queue.add(event_at(&queue, 1, 1)).unwrap();

        let err = queue.add(event_at(&queue, 0, 2)).unwrap_err();
        assert!(matches!(
            err,
            QueueError::Grow(BufferError::CapacityExceeded { .. })
        ));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.peek().unwrap().timestamp, Timestamp(1));
    }

    #[test]
    fn test_add_pair_is_all_or_nothing() {
        let mut queue = PriorityQueue::new(PROBABILITIES)
            .unwrap()
            .with_max_pending(3);
        queue.add(event_at(&queue, 5, 0)).unwrap();
        queue
            .add_pair(event_at(&queue, 1, 1), event_at(&queue, 2, 1))
            .unwrap();

        assert!(queue
            .add_pair(event_at(&queue, 0, 2), event_at(&queue, 0, 2))
            .is_err());
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek().unwrap().timestamp, Timestamp(1));
    }

    #[test]
    fn test_pops_compact_at_chunk_boundaries() {
        let mut queue = PriorityQueue::new(PROBABILITIES).unwrap();
        for i in 0..1_000u64 {
            queue.add(event_at(&queue, i, 0)).unwrap();
        }
        // 24-byte events in 4096-byte chunks
        assert_eq!(std::mem::size_of::<Event>(), 24);
        assert_eq!(queue.heap.chunks(), 6);

        // 480 pops: a compaction attempt at 520 pending, not a chunk boundary
        for _ in 0..480 {
            queue.pop().unwrap();
        }
        assert_eq!(queue.len(), 520);
        assert_eq!(queue.heap.chunks(), 6);

        // 488 pops: attempt at 512 pending, exactly three chunks of events
        for _ in 0..8 {
            queue.pop().unwrap();
        }
        assert_eq!(queue.len(), 512);
        assert_eq!(queue.heap.chunks(), 3);
        assert!(queue.is_heap());
        assert_eq!(queue.peek().unwrap().timestamp, Timestamp(488));
    }

    #[test]
    fn test_queue_survives_emptying_and_compaction() {
        let mut queue = PriorityQueue::new(PROBABILITIES).unwrap();
        for round in 0..3u64 {
            for i in 0..1_000u64 {
                queue.add(event_at(&queue, i * 3 % 1_000 + round, 0)).unwrap();
            }
            let mut previous = Timestamp::ZERO;
            while let Some(event) = queue.pop() {
                assert!(event.timestamp >= previous);
                previous = event.timestamp;
            }
            assert!(queue.is_empty());
        }
    }
}
