//! Timer bookkeeping.
//!
//! [`TimerSlot`] is the single cancelable timer a component owns.
//! [`TimerQueue`] is a deterministic one-shot scheduler driven by an external
//! clock, used by in-memory hosts and tests.

use std::time::Duration;

use log::debug;

use crate::page::{PageDocument, TimerId};

/// At most one pending timer, owned by the component that scheduled it.
#[derive(Debug, Default)]
pub struct TimerSlot {
    pending: Option<TimerId>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Cancel whatever is pending and schedule a fresh timer.
    pub fn replace<P: PageDocument>(&mut self, page: &mut P, delay: Duration) -> TimerId {
        self.cancel(page);
        let id = page.schedule_timer(delay);
        self.pending = Some(id);
        id
    }

    pub fn cancel<P: PageDocument>(&mut self, page: &mut P) {
        if let Some(old) = self.pending.take() {
            debug!("timer slot: cancel {old:?}");
            page.cancel_timer(old);
        }
    }

    /// Consume the slot if `id` is the pending timer.
    ///
    /// Returns false for ids that were cancelled or belong to someone else.
    pub fn fire(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }
}

struct Entry {
    deadline: Duration,
    id: TimerId,
}

/// One-shot timers keyed by deadline on a clock the owner advances.
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry>,
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 1,
            entries: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            deadline: self.now + delay,
            id,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.entries.retain(|e| e.id != id);
    }

    /// Move the clock forward. The clock never runs backwards.
    pub fn advance_to(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Pop the earliest timer whose deadline has passed.
    ///
    /// Ties resolve in scheduling order.
    pub fn pop_due(&mut self) -> Option<TimerId> {
        let (idx, _) = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= self.now)
            .min_by_key(|(_, e)| (e.deadline, e.id))?;
        Some(self.entries.remove(idx).id)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
