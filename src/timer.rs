use std::time::{Duration, Instant};

/// Handle to a scheduled timer, used to cancel it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<E> {
    id: TimerId,
    deadline: Instant,
    event: E,
}

/// Deadline-ordered one-shot timers owned by the event loop.
///
/// Nothing fires on its own: the loop calls [`TimerQueue::expire`] with the
/// current time and handles whatever came due.
#[derive(Debug)]
pub struct TimerQueue<E> {
    entries: Vec<Entry<E>>,
    next_id: u64,
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        TimerQueue {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let deadline = now + delay;
        // Keep entries sorted by deadline, FIFO among equal deadlines
        let index = self.entries.partition_point(|e| e.deadline <= deadline);
        self.entries.insert(
            index,
            Entry {
                id,
                deadline,
                event,
            },
        );
        id
    }

    /// Returns `true` if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.first().map(|e| e.deadline)
    }

    /// Removes and returns every timer whose deadline is at or before `now`.
    pub fn expire(&mut self, now: Instant) -> Vec<(TimerId, E)> {
        let due = self.entries.partition_point(|e| e.deadline <= now);
        self.entries
            .drain(..due)
            .map(|e| (e.id, e.event))
            .collect()
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
