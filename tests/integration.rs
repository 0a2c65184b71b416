use std::fs;
use std::time::Duration;

use navspy::config::{ConfigFile, NavigationConfig};
use navspy::controller::{NavigationClick, NavigationController, PageEvent, ScrollSignal};
use navspy::document::{MarkdownPage, outline};
use navspy::page::{EventDisposition, PageDocument, SectionQuery, TARGET_ATTRIBUTE};
use navspy::viewport::Containment;

const IDS: [&str; 5] = ["zeta", "alpha", "m3", "b-7", "omega"];
/// Each fixture section is heading, blank, body, blank.
const SECTION_LINES: f64 = 4.0;

fn load_handbook() -> String {
    fs::read_to_string("tests/fixtures/handbook.md").expect("fixture should exist")
}

/// Long document: `n` marked sections of four lines each.
fn long_document(n: usize) -> String {
    (0..n)
        .map(|i| format!("## Part {i} {{#p{i} data-nav}}\n\nBody {i}.\n\n"))
        .collect()
}

fn nav_config() -> NavigationConfig {
    let mut cfg = ConfigFile::default().resolve().navigation;
    cfg.container = "#menu".into();
    cfg
}

/// Host loop over an in-memory page with a manual clock.
struct Harness {
    page: MarkdownPage,
    controller: NavigationController,
    now: Duration,
    step: Duration,
}

impl Harness {
    fn new(markdown: &str, height: usize, nav: &NavigationConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut page = MarkdownPage::new(markdown, &nav.container, 40, height)
            .with_smooth_scroll(Duration::from_millis(100));
        let mut controller = NavigationController::new(nav);
        controller.start(&mut page);
        let mut h = Self {
            page,
            controller,
            now: Duration::ZERO,
            step: nav.step_interval,
        };
        h.pump();
        h
    }

    /// Deliver scroll signals and due timers until the page settles.
    /// Returns how many timers fired.
    fn pump(&mut self) -> usize {
        let mut fired = 0;
        self.page.advance_clock(self.now);
        loop {
            if self.page.take_scrolled() {
                self.controller
                    .handle(PageEvent::Scroll(ScrollSignal), &mut self.page);
            }
            let Some(id) = self.page.pop_due_timer() else {
                break;
            };
            self.controller.handle(PageEvent::TimerFired(id), &mut self.page);
            fired += 1;
        }
        fired
    }

    fn advance(&mut self, by: Duration) -> usize {
        self.now += by;
        self.pump()
    }

    fn scroll_to(&mut self, offset: f64) {
        self.page.set_scroll_offset(offset);
        self.pump();
    }

    fn active_sections(&self) -> Vec<String> {
        self.page
            .sections()
            .iter()
            .filter(|s| self.page.has_class_on(s.node, "active"))
            .map(|s| s.id.clone())
            .collect()
    }

    /// Target ids of highlighted menu entries.
    fn active_entries(&self) -> Vec<String> {
        self.page
            .navigation_entries("#menu")
            .into_iter()
            .filter(|&a| self.page.has_class(a, "active"))
            .filter_map(|a| self.page.attribute(a, TARGET_ATTRIBUTE))
            .collect()
    }
}

#[test]
fn test_menu_mirrors_marked_sections() {
    let markdown = load_handbook();
    let h = Harness::new(&markdown, 4, &nav_config());
    let rows = h.page.menu_rows("#menu");
    let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, ["Overview", "Install", "Setup", "Build", "Outro"]);
    for (row, id) in rows.iter().zip(IDS) {
        assert_eq!(h.page.attribute(row.anchor, "href"), Some(format!("#{id}")));
    }
}

#[test]
fn test_scroll_burst_evaluates_once() {
    let markdown = load_handbook();
    let mut h = Harness::new(&markdown, 4, &nav_config());
    for _ in 0..25 {
        h.controller
            .handle(PageEvent::Scroll(ScrollSignal), &mut h.page);
    }
    assert_eq!(h.pump(), 1, "a burst must coalesce into a single evaluation");
}

#[test]
fn test_highlight_is_exclusive_and_paired() {
    let markdown = load_handbook();
    let mut h = Harness::new(&markdown, 4, &nav_config());
    for (k, id) in IDS.iter().enumerate() {
        let offset = (k as f64 * SECTION_LINES).min(h.page.max_scroll());
        h.scroll_to(offset);
        assert_eq!(h.active_sections(), [id.to_string()], "offset {offset}");
        assert_eq!(h.active_entries(), [id.to_string()], "offset {offset}");
        let tick = h.controller.last_tick().expect("tick should have run");
        assert_eq!(tick.active_section.as_deref(), Some(*id));
        assert!(tick.entry_activated);
    }
}

#[test]
fn test_no_qualifying_section_keeps_previous_highlight() {
    let markdown = load_handbook();
    let mut h = Harness::new(&markdown, 4, &nav_config());
    h.scroll_to(8.0);
    assert_eq!(h.active_sections(), ["m3"]);
    // Straddling two sections: neither fits entirely.
    h.scroll_to(9.0);
    assert_eq!(h.controller.last_tick().unwrap().active_section, None);
    assert_eq!(h.active_sections(), ["m3"]);
    assert_eq!(h.active_entries(), ["m3"]);
}

#[test]
fn test_last_qualifying_section_wins() {
    let markdown = load_handbook();
    let h = Harness::new(&markdown, 8, &nav_config());
    // zeta and alpha both fit at offset 0.
    assert_eq!(h.active_sections(), ["alpha"]);
    assert_eq!(h.active_entries(), ["alpha"]);
}

#[test]
fn test_partial_containment() {
    let markdown = load_handbook();
    let mut nav = nav_config();
    nav.containment = Containment::Partial;
    let mut h = Harness::new(&markdown, 4, &nav);
    h.scroll_to(9.0);
    assert_eq!(h.active_sections(), ["b-7"]);
}

#[test]
fn test_click_routing() {
    let markdown = load_handbook();
    let mut h = Harness::new(&markdown, 4, &nav_config());
    let rows = h.page.menu_rows("#menu");

    let d = h.controller.handle(
        PageEvent::NavigationClick(NavigationClick { target: rows[2].item }),
        &mut h.page,
    );
    assert_eq!(d, EventDisposition::Ignored);
    assert!(h.page.history().is_empty());
    assert!(!h.page.is_animating());

    let d = h.controller.handle(
        PageEvent::NavigationClick(NavigationClick { target: rows[2].anchor }),
        &mut h.page,
    );
    assert_eq!(d, EventDisposition::DefaultPrevented);
    assert_eq!(h.page.history(), ["m3"]);
    assert!(h.page.is_animating());

    h.advance(Duration::from_millis(150));
    assert!(!h.page.is_animating());
    assert_eq!(h.page.scroll_offset(), 2.0 * SECTION_LINES);
    assert_eq!(h.active_entries(), ["m3"]);
}

#[test]
fn test_click_reaches_explicit_id_shadowed_by_earlier_heading() {
    let markdown = "# Intro\n\nText.\n\n## Details {#intro data-nav}\n\nMore.\n\nEnd.\n";
    let mut h = Harness::new(markdown, 2, &nav_config());
    let rows = h.page.menu_rows("#menu");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].label, "Details");

    let d = h.controller.handle(
        PageEvent::NavigationClick(NavigationClick { target: rows[0].anchor }),
        &mut h.page,
    );
    assert_eq!(d, EventDisposition::DefaultPrevented);
    h.advance(Duration::from_millis(150));
    assert_eq!(h.page.scroll_offset(), 4.0);
    assert_eq!(h.page.history(), ["intro"]);
}

#[test]
fn test_back_to_top_threshold() {
    let markdown = long_document(10);
    let mut h = Harness::new(&markdown, 10, &nav_config());
    h.scroll_to(9.0);
    assert!(!h.page.back_to_top_visible());
    h.scroll_to(10.0);
    assert!(h.page.back_to_top_visible());
    assert!(h.controller.last_tick().unwrap().back_to_top_visible);
}

#[test]
fn test_stepped_scroll_to_top_terminates() {
    let markdown = long_document(120);
    let mut h = Harness::new(&markdown, 4, &nav_config());
    h.scroll_to(450.0);
    assert_eq!(h.page.scroll_offset(), 450.0);
    assert!(h.page.back_to_top_visible());

    h.controller.handle(PageEvent::BackToTop, &mut h.page);
    assert_eq!(h.page.scroll_offset(), 405.0, "first step is immediate");

    let mut ticks = 0;
    let mut last = h.page.scroll_offset();
    while h.controller.is_scrolling_to_top() {
        ticks += 1;
        assert!(ticks <= 50, "did not terminate within 50 ticks");
        h.advance(h.step);
        let offset = h.page.scroll_offset();
        assert!(offset < last, "offset must strictly decrease: {offset} >= {last}");
        last = offset;
    }
    assert_eq!(h.page.scroll_offset(), 0.0);
    assert!(!h.page.back_to_top_visible());
    assert_eq!(h.active_sections(), ["p0"]);
}

#[test]
fn test_back_to_top_restart_keeps_one_animation() {
    let markdown = long_document(40);
    let mut h = Harness::new(&markdown, 4, &nav_config());
    h.scroll_to(100.0);
    h.controller.handle(PageEvent::BackToTop, &mut h.page);
    h.controller.handle(PageEvent::BackToTop, &mut h.page);
    // Two immediate steps: 100 -> 90 -> 81.
    assert_eq!(h.page.scroll_offset(), 81.0);
    h.pump();
    h.advance(h.step);
    // Exactly one pending tick advanced the animation.
    assert_eq!(h.page.scroll_offset(), 73.0);
}

#[test]
fn test_outline_lists_entries() {
    let markdown = load_handbook();
    let items = outline(&markdown, &SectionQuery::default());
    let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, IDS);
    assert!(outline(&markdown, &SectionQuery::new("data-toc")).is_empty());
}
