//! The virtual-time event queue.
//!
//! Events fire in non-decreasing order of their fire time. Events with equal fire times fire in
//! the order they were scheduled. Nothing can be cancelled once scheduled; instead a run is
//! bounded by a stop time and anything scheduled past it never fires.

use crate::priv_prelude::*;
use crate::error::ScheduleError;

/// Returned by `Scheduler::schedule_at`. Ids grow in scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

struct Scheduled<T> {
    at: Duration,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        (self.at, self.seq) == (other.at, other.seq)
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        // reversed, BinaryHeap is a max-heap
        (other.at, other.seq).cmp(&(self.at, self.seq))
    }
}

/// A time-ordered queue of events carrying items of type `T`.
pub struct Scheduler<T> {
    heap: BinaryHeap<Scheduled<T>>,
    now: Duration,
    next_seq: u64,
    executed: u64,
    stopped: bool,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Scheduler<T> {
        Scheduler::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Scheduler<T> {
        Scheduler {
            heap: BinaryHeap::new(),
            now: Duration::ZERO,
            next_seq: 0,
            executed: 0,
            stopped: false,
        }
    }

    /// The current virtual time: the fire time of the most recently popped event.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Queue `item` to fire at `at`. Fails if `at` is in the past or the scheduler has been
    /// stopped.
    pub fn schedule_at(&mut self, at: Duration, item: T) -> Result<EventId, ScheduleError> {
        if self.stopped {
            return Err(ScheduleError::Stopped { at });
        }
        if at < self.now {
            return Err(ScheduleError::InPast { at, now: self.now });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { at, seq, item });
        Ok(EventId(seq))
    }

    /// Queue `item` to fire `delay` from now.
    pub fn schedule_in(&mut self, delay: Duration, item: T) -> Result<EventId, ScheduleError> {
        let at = self.now.saturating_add(delay);
        self.schedule_at(at, item)
    }

    /// The fire time of the next event, if any.
    pub fn next_time(&self) -> Option<Duration> {
        self.heap.peek().map(|scheduled| scheduled.at)
    }

    /// Pop the next event if it fires no later than `stop`, advancing the clock to its fire
    /// time.
    pub fn pop_until(&mut self, stop: Duration) -> Option<(Duration, T)> {
        if self.stopped || self.next_time()? > stop {
            return None;
        }
        let Scheduled { at, item, .. } = self.heap.pop()?;
        self.now = at;
        self.executed += 1;
        Some((at, item))
    }

    /// Stop the scheduler at `at`. The clock moves forward to `at` if it is behind it. Pending
    /// events are kept but will never fire and nothing more can be scheduled.
    pub fn stop_at(&mut self, at: Duration) {
        if at > self.now {
            self.now = at;
        }
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Number of events still queued.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of events popped so far.
    pub fn executed(&self) -> u64 {
        self.executed
    }
}
