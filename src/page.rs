//! Page document abstraction consumed by the navigation core.
//!
//! The core never builds markup or walks a tree itself. Everything it needs
//! from the hosting page goes through [`PageDocument`]: section discovery,
//! geometry, class toggling, history, scrolling and one-shot timers.
//! Hosts implement it over a real DOM (`web`) or over an in-memory
//! document (`document::MarkdownPage`).

use std::fmt::Debug;
use std::time::Duration;

/// Attribute on a navigation anchor holding the id of the section it targets.
pub const TARGET_ATTRIBUTE: &str = "data-section";

/// Bounding box relative to the viewport origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self { top, left, bottom, right }
    }
}

/// Viewport dimensions as reported by the host.
///
/// `inner_*` may be missing or zero in minimized or non-standard rendering
/// contexts; the root element's client size is used instead.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportSize {
    pub inner_width: Option<f64>,
    pub inner_height: Option<f64>,
    pub client_width: f64,
    pub client_height: f64,
}

impl ViewportSize {
    /// Viewport with both measurements agreeing.
    pub fn uniform(width: f64, height: f64) -> Self {
        Self {
            inner_width: Some(width),
            inner_height: Some(height),
            client_width: width,
            client_height: height,
        }
    }

    pub fn width(&self) -> f64 {
        self.inner_width
            .filter(|w| *w > 0.0)
            .unwrap_or(self.client_width)
    }

    pub fn height(&self) -> f64 {
        self.inner_height
            .filter(|h| *h > 0.0)
            .unwrap_or(self.client_height)
    }
}

/// Which sections belong in the navigation menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionQuery {
    pub marker_attribute: String,
}

impl SectionQuery {
    pub fn new(marker_attribute: impl Into<String>) -> Self {
        Self { marker_attribute: marker_attribute.into() }
    }
}

impl Default for SectionQuery {
    fn default() -> Self {
        Self::new("data-nav")
    }
}

/// Handle of a scheduled one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// What the host should do with the native event after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Let the platform run its default action.
    Ignored,
    /// The core handled the event; suppress the platform default.
    DefaultPrevented,
}

/// One menu entry to materialize: target section id and visible label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationItem {
    pub id: String,
    pub label: String,
}

/// Everything the navigation core needs from the hosting page.
///
/// Elements are opaque, cheap handles owned by the page. The core only reads
/// geometry and attributes and toggles classes; it never creates or destroys
/// sections.
pub trait PageDocument {
    type Element: Copy + Eq + Debug;
    type Fragment;

    /// Sections carrying the marker attribute, in document order.
    fn query_sections(&self, query: &SectionQuery) -> Vec<Self::Element>;

    /// Navigation anchors currently attached under `container`, in menu order.
    fn navigation_entries(&self, container: &str) -> Vec<Self::Element>;

    fn get_element_by_id(&self, id: &str) -> Option<Self::Element>;
    fn query_selector(&self, selector: &str) -> Option<Self::Element>;

    /// Attribute value; `"id"` resolves to the element identifier.
    fn attribute(&self, element: Self::Element, name: &str) -> Option<String>;
    fn is_anchor(&self, element: Self::Element) -> bool;

    fn bounding_rect(&self, element: Self::Element) -> Rect;
    fn viewport(&self) -> ViewportSize;
    fn scroll_offset(&self) -> f64;
    fn set_scroll_offset(&mut self, offset: f64);

    fn has_class(&self, element: Self::Element, class: &str) -> bool;
    fn add_class(&mut self, element: Self::Element, class: &str);
    fn remove_class(&mut self, element: Self::Element, class: &str);

    /// Build (detached) menu entries, one per item.
    fn create_navigation_fragment(&mut self, items: &[NavigationItem]) -> Self::Fragment;
    /// Attach a fragment under the element matching `selector`.
    /// Returns false when no such container exists.
    fn append_to_container(&mut self, selector: &str, fragment: Self::Fragment) -> bool;

    fn set_back_to_top_visible(&mut self, visible: bool);

    /// Push a session history entry whose URL fragment is `fragment` (no `#`).
    fn push_history(&mut self, fragment: &str);
    /// Animated scroll that aligns the element's top with the viewport top.
    /// Fire-and-forget.
    fn smooth_scroll_to(&mut self, element: Self::Element);

    fn schedule_timer(&mut self, delay: Duration) -> TimerId;
    fn cancel_timer(&mut self, id: TimerId);

    fn element_id(&self, element: Self::Element) -> Option<String> {
        self.attribute(element, "id")
    }
}
