//! Scriptable page used by unit tests: explicit rects, recorded side effects.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::page::{
    NavigationItem, PageDocument, Rect, SectionQuery, TARGET_ATTRIBUTE, TimerId, ViewportSize,
};
use crate::timer::TimerQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct El(pub usize);

struct Node {
    tag: &'static str,
    id: Option<String>,
    attrs: Vec<(String, String)>,
    classes: BTreeSet<String>,
    rect: Rect,
    parent: Option<usize>,
}

pub(crate) struct FakePage {
    nodes: Vec<Node>,
    pub viewport: ViewportSize,
    pub offset: f64,
    pub history: Vec<String>,
    pub smooth_scrolls: Vec<El>,
    pub back_to_top: Option<bool>,
    pub timers: TimerQueue,
    pub cancelled: Vec<TimerId>,
}

impl FakePage {
    pub(crate) fn new(width: f64, height: f64) -> Self {
        Self {
            nodes: Vec::new(),
            viewport: ViewportSize::uniform(width, height),
            offset: 0.0,
            history: Vec::new(),
            smooth_scrolls: Vec::new(),
            back_to_top: None,
            timers: TimerQueue::new(),
            cancelled: Vec::new(),
        }
    }

    fn push(&mut self, tag: &'static str, id: Option<&str>, parent: Option<usize>) -> El {
        self.nodes.push(Node {
            tag,
            id: id.map(str::to_string),
            attrs: Vec::new(),
            classes: BTreeSet::new(),
            rect: Rect::default(),
            parent,
        });
        El(self.nodes.len() - 1)
    }

    /// Section with marker `data-nav` and the given viewport-relative span.
    pub(crate) fn section(&mut self, id: &str, top: f64, bottom: f64) -> El {
        let el = self.push("section", Some(id), None);
        let node = &mut self.nodes[el.0];
        node.attrs.push(("data-nav".into(), id.to_uppercase()));
        node.rect = Rect::new(top, 0.0, bottom, self.viewport.width());
        el
    }

    /// Marked section with no id.
    pub(crate) fn anonymous_section(&mut self, top: f64, bottom: f64) -> El {
        let el = self.push("section", None, None);
        let node = &mut self.nodes[el.0];
        node.attrs.push(("data-nav".into(), String::new()));
        node.rect = Rect::new(top, 0.0, bottom, self.viewport.width());
        el
    }

    /// Section without the marker attribute.
    pub(crate) fn plain_section(&mut self, id: &str, top: f64, bottom: f64) -> El {
        let el = self.push("section", Some(id), None);
        self.nodes[el.0].rect = Rect::new(top, 0.0, bottom, self.viewport.width());
        el
    }

    pub(crate) fn container(&mut self, id: &str) -> El {
        self.push("ul", Some(id), None)
    }

    /// `<li><a data-section=target></a></li>` under `container`; returns (li, a).
    pub(crate) fn entry(&mut self, container: El, target: &str) -> (El, El) {
        let li = self.push("li", None, Some(container.0));
        let a = self.push("a", None, Some(li.0));
        self.nodes[a.0]
            .attrs
            .push((TARGET_ATTRIBUTE.into(), target.to_string()));
        (li, a)
    }

    pub(crate) fn active(&self, class: &str) -> Vec<El> {
        (0..self.nodes.len())
            .filter(|&i| self.nodes[i].classes.contains(class))
            .map(El)
            .collect()
    }

    pub(crate) fn set_class(&mut self, el: El, class: &str) {
        self.nodes[el.0].classes.insert(class.to_string());
    }

    fn under(&self, mut idx: usize, ancestor: usize) -> bool {
        while let Some(p) = self.nodes[idx].parent {
            if p == ancestor {
                return true;
            }
            idx = p;
        }
        false
    }
}

impl PageDocument for FakePage {
    type Element = El;
    type Fragment = Vec<NavigationItem>;

    fn query_sections(&self, query: &SectionQuery) -> Vec<El> {
        (0..self.nodes.len())
            .filter(|&i| {
                let n = &self.nodes[i];
                n.tag == "section" && n.attrs.iter().any(|(k, _)| *k == query.marker_attribute)
            })
            .map(El)
            .collect()
    }

    fn navigation_entries(&self, container: &str) -> Vec<El> {
        let Some(c) = self.query_selector(container) else {
            return Vec::new();
        };
        (0..self.nodes.len())
            .filter(|&i| self.nodes[i].tag == "a" && self.under(i, c.0))
            .map(El)
            .collect()
    }

    fn get_element_by_id(&self, id: &str) -> Option<El> {
        self.nodes
            .iter()
            .position(|n| n.id.as_deref() == Some(id))
            .map(El)
    }

    fn query_selector(&self, selector: &str) -> Option<El> {
        selector.strip_prefix('#').and_then(|id| self.get_element_by_id(id))
    }

    fn attribute(&self, el: El, name: &str) -> Option<String> {
        let n = &self.nodes[el.0];
        if name == "id" {
            return n.id.clone();
        }
        n.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    fn is_anchor(&self, el: El) -> bool {
        self.nodes[el.0].tag == "a"
    }

    fn bounding_rect(&self, el: El) -> Rect {
        self.nodes[el.0].rect
    }

    fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    fn scroll_offset(&self) -> f64 {
        self.offset
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    fn has_class(&self, el: El, class: &str) -> bool {
        self.nodes[el.0].classes.contains(class)
    }

    fn add_class(&mut self, el: El, class: &str) {
        self.nodes[el.0].classes.insert(class.to_string());
    }

    fn remove_class(&mut self, el: El, class: &str) {
        self.nodes[el.0].classes.remove(class);
    }

    fn create_navigation_fragment(&mut self, items: &[NavigationItem]) -> Vec<NavigationItem> {
        items.to_vec()
    }

    fn append_to_container(&mut self, selector: &str, fragment: Vec<NavigationItem>) -> bool {
        let Some(c) = self.query_selector(selector) else {
            return false;
        };
        for item in fragment {
            self.entry(c, &item.id);
        }
        true
    }

    fn set_back_to_top_visible(&mut self, visible: bool) {
        self.back_to_top = Some(visible);
    }

    fn push_history(&mut self, fragment: &str) {
        self.history.push(fragment.to_string());
    }

    fn smooth_scroll_to(&mut self, el: El) {
        self.smooth_scrolls.push(el);
    }

    fn schedule_timer(&mut self, delay: Duration) -> TimerId {
        self.timers.schedule(delay)
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.cancelled.push(id);
        self.timers.cancel(id);
    }
}
