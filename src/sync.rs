//! Scroll-tick synchronization: pick the section in view and mirror it onto
//! the navigation menu.

use log::debug;

use crate::active_set::ActiveSetCoordinator;
use crate::page::{PageDocument, SectionQuery, TARGET_ATTRIBUTE};
use crate::viewport::{Containment, classify};

/// Result of one synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub back_to_top_visible: bool,
    /// Whether some section qualified and took the active class.
    pub section_activated: bool,
    /// Id of the winning section; `None` when nothing qualified or the
    /// winner carries no id (it is still highlighted, but has no entry).
    pub active_section: Option<String>,
    /// Whether a navigation entry paired with the winner was highlighted.
    pub entry_activated: bool,
}

pub struct NavigationSync {
    query: SectionQuery,
    container: String,
    containment: Containment,
    sections: ActiveSetCoordinator,
    entries: ActiveSetCoordinator,
}

impl NavigationSync {
    pub fn new(
        query: SectionQuery,
        container: impl Into<String>,
        containment: Containment,
        active_class: &str,
    ) -> Self {
        Self {
            query,
            container: container.into(),
            containment,
            sections: ActiveSetCoordinator::new(active_class),
            entries: ActiveSetCoordinator::new(active_class),
        }
    }

    pub fn on_scroll_tick<P: PageDocument>(&self, page: &mut P) -> TickOutcome {
        let viewport = page.viewport();
        let visible = back_to_top_visible(page.scroll_offset(), viewport.height());
        page.set_back_to_top_visible(visible);

        let sections = page.query_sections(&self.query);
        let winner = pick_winner(
            sections
                .iter()
                .map(|&s| (s, classify(&page.bounding_rect(s), &viewport, self.containment))),
        );

        let Some(winner) = winner else {
            debug!("sync: none of {} sections in view, keeping highlight", sections.len());
            return TickOutcome {
                back_to_top_visible: visible,
                section_activated: false,
                active_section: None,
                entry_activated: false,
            };
        };

        self.sections.activate(page, &sections, Some(winner));

        let id = page.element_id(winner);
        let mut entry_activated = false;
        if let Some(id) = &id {
            let entries = page.navigation_entries(&self.container);
            let paired = find_entry(page, &entries, id);
            entry_activated = paired.is_some();
            self.entries.activate(page, &entries, paired);
        }
        debug!("sync: active section {id:?} (menu entry paired: {entry_activated})");

        TickOutcome {
            back_to_top_visible: visible,
            section_activated: true,
            active_section: id,
            entry_activated,
        }
    }
}

/// Back-to-top affordance shows once the page has scrolled a full screen.
pub fn back_to_top_visible(scroll_offset: f64, viewport_height: f64) -> bool {
    scroll_offset >= viewport_height
}

/// Last qualifying candidate in iteration order.
pub fn pick_winner<E>(candidates: impl IntoIterator<Item = (E, bool)>) -> Option<E> {
    let mut winner = None;
    for (el, in_view) in candidates {
        if in_view {
            winner = Some(el);
        }
    }
    winner
}

/// Linear scan for the entry whose stored target equals `section_id`.
pub fn find_entry<P: PageDocument>(
    page: &P,
    entries: &[P::Element],
    section_id: &str,
) -> Option<P::Element> {
    entries
        .iter()
        .copied()
        .find(|&e| page.attribute(e, TARGET_ATTRIBUTE).as_deref() == Some(section_id))
}
