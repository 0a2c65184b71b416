//! Event dispatch: hosts translate platform callbacks into [`PageEvent`]s and
//! hand them to a [`NavigationController`].

use log::{debug, info};

use crate::config::NavigationConfig;
use crate::debounce::ScrollDebouncer;
use crate::menu::build_navigation;
use crate::navigator::ScrollNavigator;
use crate::page::{EventDisposition, PageDocument, SectionQuery, TimerId};
use crate::sync::{NavigationSync, TickOutcome};

/// The page scrolled (user or programmatic).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollSignal;

/// A click landed on `target` inside the navigation container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationClick<E> {
    pub target: E,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent<E> {
    Scroll(ScrollSignal),
    NavigationClick(NavigationClick<E>),
    /// The back-to-top affordance was activated.
    BackToTop,
    TimerFired(TimerId),
}

pub struct NavigationController {
    query: SectionQuery,
    container: String,
    debouncer: ScrollDebouncer,
    sync: NavigationSync,
    navigator: ScrollNavigator,
    last_tick: Option<TickOutcome>,
}

impl NavigationController {
    pub fn new(config: &NavigationConfig) -> Self {
        let query = SectionQuery::new(config.marker_attribute.clone());
        Self {
            sync: NavigationSync::new(
                query.clone(),
                config.container.clone(),
                config.containment,
                &config.active_class,
            ),
            query,
            container: config.container.clone(),
            debouncer: ScrollDebouncer::new(config.debounce),
            navigator: ScrollNavigator::new(config.step_divisor, config.step_interval),
            last_tick: None,
        }
    }

    /// Build the menu and schedule an initial evaluation so the first
    /// highlight does not wait for the user to scroll.
    pub fn start<P: PageDocument>(&mut self, page: &mut P) -> usize {
        let n = build_navigation(page, &self.query, &self.container);
        self.debouncer.signal(page);
        info!("controller: started with {n} navigation entries");
        n
    }

    pub fn handle<P: PageDocument>(
        &mut self,
        event: PageEvent<P::Element>,
        page: &mut P,
    ) -> EventDisposition {
        match event {
            PageEvent::Scroll(ScrollSignal) => {
                self.debouncer.signal(page);
                EventDisposition::Ignored
            }
            PageEvent::NavigationClick(NavigationClick { target }) => {
                self.navigator.on_navigation_click(page, target)
            }
            PageEvent::BackToTop => {
                self.navigator.scroll_to_top(page);
                EventDisposition::DefaultPrevented
            }
            PageEvent::TimerFired(id) => {
                if self.debouncer.fire(id) {
                    self.last_tick = Some(self.sync.on_scroll_tick(page));
                } else if !self.navigator.on_step_tick(page, id) {
                    debug!("controller: stale timer {id:?}");
                }
                EventDisposition::Ignored
            }
        }
    }

    /// Outcome of the most recent synchronization pass.
    pub fn last_tick(&self) -> Option<&TickOutcome> {
        self.last_tick.as_ref()
    }

    pub fn is_scrolling_to_top(&self) -> bool {
        self.navigator.is_stepping()
    }
}
