//! Cancelable timers driven by the host event loop.
//!
//! Nothing here sleeps or spawns. The host passes its clock into
//! [`TimerQueue::poll`] on every loop iteration and runs whatever came due,
//! which keeps every state transition on the loop's thread.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Handle to a scheduled action, used to cancel it.
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Entry<T> {
    handle: TimerHandle,
    deadline: Instant,
    action: T,
}

#[derive(Debug)]
/// Ordered set of pending actions keyed by deadline.
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    next_handle: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_handle: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to fire `delay` after `now`.
    pub fn schedule(&mut self, now: Instant, delay: Duration, action: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        let deadline = now + delay;
        // keep entries sorted by deadline, FIFO among equal deadlines
        let position = self
            .entries
            .partition_point(|entry| entry.deadline <= deadline);
        self.entries.insert(
            position,
            Entry {
                handle,
                deadline,
                action,
            },
        );
        handle
    }

    /// Drop a pending action. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.handle != handle);
        self.entries.len() != before
    }

    /// Whether `handle` is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|entry| entry.handle == handle)
    }

    /// Remove and return every action whose deadline is at or before `now`.
    pub fn poll(&mut self, now: Instant) -> Vec<T> {
        let due = self.entries.partition_point(|entry| entry.deadline <= now);
        self.entries
            .drain(..due)
            .map(|entry| entry.action)
            .collect()
    }

    /// Deadline of the earliest pending action.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.first().map(|entry| entry.deadline)
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
/// Trailing-edge debounce: the last request within the quiet period wins.
pub struct Debouncer<T> {
    quiet_period: Duration,
    queue: TimerQueue<T>,
    pending: Option<TimerHandle>,
}

impl<T> Debouncer<T> {
    /// Debouncer firing `quiet_period` after the latest request.
    #[must_use]
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            queue: TimerQueue::new(),
            pending: None,
        }
    }

    /// Replace any outstanding request with `action`.
    pub fn request(&mut self, now: Instant, action: T) {
        self.cancel();
        self.pending = Some(self.queue.schedule(now, self.quiet_period, action));
    }

    /// The action, once its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let fired = self.queue.poll(now).pop();
        if fired.is_some() {
            self.pending = None;
        }
        fired
    }

    /// Drop the outstanding request, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending
            .take()
            .is_some_and(|handle| self.queue.cancel(handle))
    }

    /// Whether a request is waiting for its quiet period.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .is_some_and(|handle| self.queue.is_pending(handle))
    }

    /// When the outstanding request will fire.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn fires_in_deadline_order() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        queue.schedule(start, MS * 30, "late");
        queue.schedule(start, MS * 10, "early");
        queue.schedule(start, MS * 20, "middle");

        assert!(queue.poll(start + MS * 5).is_empty());
        assert_eq!(queue.poll(start + MS * 20), vec!["early", "middle"]);
        assert_eq!(queue.poll(start + MS * 100), vec!["late"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn cancelled_actions_never_fire() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        let first = queue.schedule(start, MS * 10, 1);
        queue.schedule(start, MS * 10, 2);

        assert!(queue.cancel(first));
        assert!(!queue.cancel(first));
        assert!(!queue.is_pending(first));
        assert_eq!(queue.poll(start + MS * 10), vec![2]);
    }

    #[test]
    fn debounce_keeps_only_the_last_request() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(MS * 500);
        for (offset, value) in [(0, 'a'), (100, 'b'), (450, 'c')] {
            debouncer.request(start + MS * offset, value);
        }

        // 500 ms after the first request, but only 50 ms after the last one
        assert_eq!(debouncer.poll(start + MS * 500), None);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.poll(start + MS * 950), Some('c'));
        assert_eq!(debouncer.poll(start + MS * 2000), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn cancel_clears_pending_request() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(MS * 500);
        debouncer.request(start, ());
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        assert_eq!(debouncer.poll(start + MS * 1000), None);
    }
}
