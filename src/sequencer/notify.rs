//! Deferred beat notifications.
//!
//! Each scheduled beat arms one notification due at the wall-clock instant the
//! beat actually sounds. The host loop drains due entries in order, so the
//! visual layer follows the audio without ever feeding back into it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Payload delivered to the beat subscriber
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beat {
    /// Position within the bar, 0 is the accented downbeat
    pub index: usize,
    /// Audio-clock time (seconds) the beat was scheduled for
    pub time: f64,
}

impl Beat {
    pub fn is_accent(&self) -> bool {
        self.index == 0
    }
}

#[derive(Debug, Clone)]
struct PendingBeat {
    due: Instant,
    /// Arming order, breaks ties between equal due times
    seq: u64,
    beat: Beat,
}

impl Eq for PendingBeat {}

impl PartialEq for PendingBeat {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Ord for PendingBeat {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PendingBeat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of beat notifications keyed by due time
#[derive(Debug, Default)]
pub struct NotificationQueue {
    heap: BinaryHeap<PendingBeat>,
    next_seq: u64,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a notification for `beat`, due at `due`
    pub fn push(&mut self, due: Instant, beat: Beat) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(PendingBeat { due, seq, beat });
    }

    /// Pop the earliest notification if it is due at or before `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<Beat> {
        match self.heap.peek() {
            Some(pending) if pending.due <= now => self.heap.pop().map(|p| p.beat),
            _ => None,
        }
    }

    /// Due time of the earliest armed notification
    pub fn next_due(&self) -> Option<Instant> {
        self.heap.peek().map(|p| p.due)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
