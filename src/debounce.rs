//! Trailing-edge debounce for scroll signals.
//!
//! IDLE --signal--> PENDING (timer scheduled)
//! PENDING --signal--> PENDING (old timer cancelled, new one scheduled)
//! PENDING --timer--> IDLE (evaluation runs once)
//!
//! A zero delay still coalesces: the evaluation is deferred past every
//! signal dispatched in the current turn of the event loop.

use std::time::Duration;

use log::debug;

use crate::page::{PageDocument, TimerId};
use crate::timer::TimerSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending(TimerId),
}

#[derive(Debug)]
pub struct ScrollDebouncer {
    delay: Duration,
    slot: TimerSlot,
}

impl ScrollDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: TimerSlot::new(),
        }
    }

    /// Register a scroll signal, resetting the quiescence window.
    pub fn signal<P: PageDocument>(&mut self, page: &mut P) {
        let id = self.slot.replace(page, self.delay);
        debug!("debounce: scheduled {id:?} (delay={}ms)", self.delay.as_millis());
    }

    /// Timer expiry. Returns true when the evaluation should run now.
    pub fn fire(&mut self, id: TimerId) -> bool {
        self.slot.fire(id)
    }

    pub fn state(&self) -> DebounceState {
        match self.slot.pending() {
            Some(id) => DebounceState::Pending(id),
            None => DebounceState::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePage;

    fn drain(page: &mut FakePage, debouncer: &mut ScrollDebouncer) -> usize {
        let mut runs = 0;
        while let Some(id) = page.timers.pop_due() {
            if debouncer.fire(id) {
                runs += 1;
            }
        }
        runs
    }

    #[test]
    fn burst_runs_once() {
        for n in 1..=20 {
            let mut page = FakePage::new(100.0, 100.0);
            let mut d = ScrollDebouncer::new(Duration::ZERO);
            for _ in 0..n {
                d.signal(&mut page);
            }
            assert!(matches!(d.state(), DebounceState::Pending(_)));
            assert_eq!(drain(&mut page, &mut d), 1, "burst of {n}");
            assert_eq!(d.state(), DebounceState::Idle);
            assert_eq!(page.cancelled.len(), n - 1);
        }
    }

    #[test]
    fn late_signal_resets_window() {
        let mut page = FakePage::new(100.0, 100.0);
        let mut d = ScrollDebouncer::new(Duration::from_millis(50));
        d.signal(&mut page);
        page.timers.advance_to(Duration::from_millis(40));
        assert_eq!(drain(&mut page, &mut d), 0);
        d.signal(&mut page);
        page.timers.advance_to(Duration::from_millis(80));
        assert_eq!(drain(&mut page, &mut d), 0);
        page.timers.advance_to(Duration::from_millis(90));
        assert_eq!(drain(&mut page, &mut d), 1);
    }

    #[test]
    fn stale_id_is_ignored() {
        let mut page = FakePage::new(100.0, 100.0);
        let mut d = ScrollDebouncer::new(Duration::ZERO);
        d.signal(&mut page);
        let DebounceState::Pending(first) = d.state() else {
            panic!("expected pending");
        };
        d.signal(&mut page);
        assert!(!d.fire(first));
        assert!(matches!(d.state(), DebounceState::Pending(_)));
    }

    #[test]
    fn separate_bursts_each_run() {
        let mut page = FakePage::new(100.0, 100.0);
        let mut d = ScrollDebouncer::new(Duration::ZERO);
        d.signal(&mut page);
        d.signal(&mut page);
        assert_eq!(drain(&mut page, &mut d), 1);
        d.signal(&mut page);
        assert_eq!(drain(&mut page, &mut d), 1);
    }
}
