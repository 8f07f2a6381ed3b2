use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Deferred tasks ordered by due time, then by scheduling order.
///
/// The timeline never sleeps or spawns; its owner asks for
/// [`next_deadline`](Timeline::next_deadline), waits however it likes, and
/// drains with [`pop_due`](Timeline::pop_due). Two tasks due at the same
/// instant come out in the order they were scheduled.
pub struct Timeline<T> {
    heap: BinaryHeap<Slot<T>>,
    next_seq: u64,
}

struct Slot<T> {
    due: Instant,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Slot<T> {}

impl<T> PartialOrd for Slot<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Slot<T> {
    // Reversed: BinaryHeap is a max-heap and we want the earliest slot on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> Timeline<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, due: Instant, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Slot { due, seq, task });
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|s| s.due)
    }

    /// Remove and return the earliest task if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(Instant, T)> {
        if self.heap.peek()?.due > now {
            return None;
        }
        self.heap.pop().map(|s| (s.due, s.task))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}
