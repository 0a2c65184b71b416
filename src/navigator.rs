//! Click-driven navigation and the stepped scroll-to-top animation.

use std::time::Duration;

use log::debug;

use crate::page::{EventDisposition, PageDocument, TARGET_ATTRIBUTE, TimerId};
use crate::timer::TimerSlot;

#[derive(Debug)]
pub struct ScrollNavigator {
    step_divisor: u32,
    step_interval: Duration,
    stepper: TimerSlot,
}

impl ScrollNavigator {
    pub fn new(step_divisor: u32, step_interval: Duration) -> Self {
        Self {
            step_divisor: step_divisor.max(1),
            step_interval,
            stepper: TimerSlot::new(),
        }
    }

    /// Follow a click inside the navigation menu.
    ///
    /// Only anchors are routed; anything else falls through untouched.
    pub fn on_navigation_click<P: PageDocument>(
        &mut self,
        page: &mut P,
        target: P::Element,
    ) -> EventDisposition {
        if !page.is_anchor(target) {
            debug!("navigator: click on non-anchor {target:?}, ignoring");
            return EventDisposition::Ignored;
        }
        let Some(section_id) = page.attribute(target, TARGET_ATTRIBUTE) else {
            debug!("navigator: anchor {target:?} has no {TARGET_ATTRIBUTE}");
            return EventDisposition::DefaultPrevented;
        };

        page.push_history(&section_id);
        match page.get_element_by_id(&section_id) {
            Some(section) => {
                debug!("navigator: smooth scroll to #{section_id}");
                page.smooth_scroll_to(section);
            }
            None => debug!("navigator: #{section_id} not on page"),
        }
        EventDisposition::DefaultPrevented
    }

    /// Start (or restart) the stepped animation back to offset zero.
    ///
    /// The first step is applied immediately; the rest run one per tick.
    /// A restart cancels the previous run's pending tick.
    pub fn scroll_to_top<P: PageDocument>(&mut self, page: &mut P) {
        self.stepper.cancel(page);
        debug!("navigator: scroll to top from {}", page.scroll_offset());
        self.step(page);
    }

    /// Timer expiry. Returns false when `id` is not this navigator's tick.
    pub fn on_step_tick<P: PageDocument>(&mut self, page: &mut P, id: TimerId) -> bool {
        if !self.stepper.fire(id) {
            return false;
        }
        self.step(page);
        true
    }

    pub fn is_stepping(&self) -> bool {
        self.stepper.pending().is_some()
    }

    fn step<P: PageDocument>(&mut self, page: &mut P) {
        let next = next_step_offset(page.scroll_offset(), self.step_divisor);
        page.set_scroll_offset(next);
        if next > 0.0 {
            self.stepper.replace(page, self.step_interval);
        }
    }
}

/// Offset after one step: reduce by `max(1, floor(offset / divisor))`.
pub fn next_step_offset(offset: f64, divisor: u32) -> f64 {
    if offset <= 0.0 {
        return 0.0;
    }
    let step = (offset / f64::from(divisor.max(1))).floor().max(1.0);
    (offset - step).max(0.0)
}
