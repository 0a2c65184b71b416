//! Viewer state: layout, the live page/controller pair, sidebar hit-testing.

use log::debug;
use std::time::Duration;

use crate::config::{NavigationConfig, ViewerConfig};
use crate::controller::{NavigationClick, NavigationController, PageEvent, ScrollSignal};
use crate::document::{MarkdownPage, MenuRow, NodeId};
use crate::page::{EventDisposition, PageDocument};

/// Column where menu labels start; columns before it are the bullet.
pub(super) const MENU_LABEL_COL: u16 = 3;
/// Sidebar row of the first menu entry (row 0 is the header).
pub(super) const MENU_FIRST_ROW: u16 = 1;
/// Width of the active-section gutter in front of the content.
pub(super) const GUTTER_COLS: u16 = 2;

// ---------------------------------------------------------------------------
// Layout / ViewState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Layout {
    pub sidebar_cols: u16,  // menu width, separator excluded
    pub content_col: u16,   // first column of the gutter
    pub content_cols: u16,  // text width after the gutter
    pub content_rows: u16,  // = term_rows - 1
    pub status_row: u16,    // = term_rows - 1
    pub term_cols: u16,
}

pub(super) struct ViewState {
    pub filename: String,
    pub flash: Option<String>,
}

/// Split the terminal into sidebar, separator, gutter and content.
///
/// The sidebar gives way first on narrow terminals.
pub(super) fn compute_layout(term_cols: u16, term_rows: u16, sidebar_cols: u16) -> Layout {
    let sidebar_cols = sidebar_cols.min(term_cols / 3);
    let content_col = if sidebar_cols == 0 { 0 } else { sidebar_cols + 1 };
    let content_cols = term_cols.saturating_sub(content_col + GUTTER_COLS);
    let content_rows = term_rows.saturating_sub(1);
    let status_row = term_rows.saturating_sub(1);
    Layout {
        sidebar_cols,
        content_col,
        content_cols,
        content_rows,
        status_row,
        term_cols,
    }
}

/// Element under a sidebar click: the anchor when the label was hit, the
/// list item for the bullet and trailing padding.
pub(super) fn hit_test_menu(layout: &Layout, rows: &[MenuRow], col: u16, row: u16) -> Option<NodeId> {
    if col >= layout.sidebar_cols || row < MENU_FIRST_ROW {
        return None;
    }
    let entry = rows.get((row - MENU_FIRST_ROW) as usize)?;
    let label = MENU_LABEL_COL as usize..MENU_LABEL_COL as usize + entry.label.chars().count();
    if label.contains(&(col as usize)) {
        Some(entry.anchor)
    } else {
        Some(entry.item)
    }
}

/// Why the inner event loop returned.
pub(super) enum ExitReason {
    Quit,
    Reload,
}

// ---------------------------------------------------------------------------
// Session: one loaded document and the controller driving it
// ---------------------------------------------------------------------------

pub(super) struct Session {
    pub page: MarkdownPage,
    controller: NavigationController,
    nav: NavigationConfig,
}

impl Session {
    /// Lay out `markdown`, build its menu and queue the first highlight.
    ///
    /// `now` is the viewer clock; a reloaded page starts its timers there.
    pub(super) fn open(
        markdown: &str,
        nav: &NavigationConfig,
        viewer: &ViewerConfig,
        layout: &Layout,
        now: Duration,
    ) -> Self {
        let mut page = MarkdownPage::new(
            markdown,
            &nav.container,
            layout.content_cols as usize,
            layout.content_rows as usize,
        )
        .with_smooth_scroll(viewer.smooth_scroll);
        page.advance_clock(now);
        let mut controller = NavigationController::new(nav);
        controller.start(&mut page);
        Self {
            page,
            controller,
            nav: nav.clone(),
        }
    }

    /// Deliver scroll signals and expired timers until the page settles.
    /// Returns whether anything happened.
    pub(super) fn pump(&mut self, now: Duration) -> bool {
        let mut changed = false;
        self.page.advance_clock(now);
        loop {
            if self.page.take_scrolled() {
                self.controller
                    .handle(PageEvent::Scroll(ScrollSignal), &mut self.page);
                changed = true;
            }
            let Some(id) = self.page.pop_due_timer() else {
                break;
            };
            self.controller.handle(PageEvent::TimerFired(id), &mut self.page);
            changed = true;
        }
        changed
    }

    pub(super) fn next_deadline(&self) -> Option<Duration> {
        self.page.next_timer_deadline()
    }

    pub(super) fn menu_rows(&self) -> Vec<MenuRow> {
        self.page.menu_rows(&self.nav.container)
    }

    pub(super) fn active_class(&self) -> &str {
        &self.nav.active_class
    }

    pub(super) fn scroll_lines(&mut self, delta: f64) {
        self.page.scroll_by(delta);
    }

    pub(super) fn click(&mut self, target: NodeId) -> EventDisposition {
        self.controller.handle(
            PageEvent::NavigationClick(NavigationClick { target }),
            &mut self.page,
        )
    }

    /// Follow the `n`-th (1-based) menu entry as if its link was clicked.
    pub(super) fn follow(&mut self, n: u32) -> Result<String, String> {
        let rows = self.menu_rows();
        let Some(row) = (n as usize).checked_sub(1).and_then(|i| rows.get(i)) else {
            return Err(format!("No entry {n} (menu has {})", rows.len()));
        };
        self.click(row.anchor);
        Ok(row.label.clone())
    }

    /// Start the stepped return to the top; only while the affordance shows.
    pub(super) fn back_to_top(&mut self) -> bool {
        if !self.page.back_to_top_visible() {
            return false;
        }
        self.controller.handle(PageEvent::BackToTop, &mut self.page);
        true
    }

    /// Position the page at section `id` without animation.
    pub(super) fn jump_to(&mut self, id: &str) -> bool {
        let Some(start) = self
            .page
            .get_element_by_id(id)
            .and_then(|el| self.page.section_of(el))
            .map(|s| s.start)
        else {
            return false;
        };
        debug!("viewer: jump to #{id} (line {start})");
        self.page.set_scroll_offset(start as f64);
        true
    }

    pub(super) fn resize(&mut self, layout: &Layout) {
        self.page
            .resize(layout.content_cols as usize, layout.content_rows as usize);
    }

    pub(super) fn is_scrolling_to_top(&self) -> bool {
        self.controller.is_scrolling_to_top()
    }
}
