//! In-memory page built from a Markdown document.
//!
//! Headings open sections that run until the next heading of the same or
//! higher level. A heading joins the navigation when it carries the marker
//! attribute (`# Usage {#usage data-nav=Usage}`); a valueless marker takes the
//! heading text as its label. The text is wrapped to the page width and
//! section geometry is measured in lines, viewport-relative.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;
use std::time::Duration;

use log::{debug, info};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::menu::navigation_items;
use crate::page::{
    NavigationItem, PageDocument, Rect, SectionQuery, TARGET_ATTRIBUTE, TimerId, ViewportSize,
};
use crate::timer::TimerQueue;

const MIN_WIDTH: usize = 8;
const DEFAULT_SMOOTH_SCROLL: Duration = Duration::from_millis(240);

static NON_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("slug pattern is valid"));

/// Handle of an element on a [`MarkdownPage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Section(usize),
    List,
    Item,
    Anchor,
}

impl NodeKind {
    fn tag(self) -> &'static str {
        match self {
            NodeKind::Section(_) => "section",
            NodeKind::List => "ul",
            NodeKind::Item => "li",
            NodeKind::Anchor => "a",
        }
    }
}

struct Node {
    kind: NodeKind,
    id: Option<String>,
    attrs: Vec<(String, String)>,
    classes: BTreeSet<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    text: String,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            id: None,
            attrs: Vec::new(),
            classes: BTreeSet::new(),
            parent: None,
            children: Vec::new(),
            text: String::new(),
        }
    }
}

/// A heading-delimited span of the document.
#[derive(Debug, Clone)]
pub struct Section {
    pub node: NodeId,
    pub id: String,
    pub title: String,
    pub level: usize,
    /// First line (the heading), inclusive.
    pub start: usize,
    /// Line after the last one belonging to the section.
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Heading(usize),
    Body,
    Code,
    Rule,
}

#[derive(Debug, Clone)]
pub struct Line {
    pub text: String,
    pub kind: LineKind,
}

enum Block {
    Heading(usize),
    Text {
        first: String,
        rest: String,
        text: String,
    },
    Code {
        indent: String,
        lines: Vec<String>,
    },
    Rule,
}

/// Menu entries under `<ul>` built by [`PageDocument::create_navigation_fragment`].
pub struct NavFragment(Vec<NodeId>);

/// One rendered row of the navigation menu.
#[derive(Debug, Clone)]
pub struct MenuRow {
    pub item: NodeId,
    pub anchor: NodeId,
    pub label: String,
}

struct SmoothScroll {
    from: f64,
    to: f64,
    start: Duration,
    duration: Duration,
}

impl SmoothScroll {
    /// Cubic ease-out between `from` and `to`.
    fn offset_at(&self, now: Duration) -> f64 {
        let elapsed = now.saturating_sub(self.start).as_secs_f64();
        let total = self.duration.as_secs_f64();
        let t = if total <= 0.0 { 1.0 } else { (elapsed / total).min(1.0) };
        let eased = 1.0 - (1.0 - t).powi(3);
        self.from + (self.to - self.from) * eased
    }

    fn finished(&self, now: Duration) -> bool {
        now.saturating_sub(self.start) >= self.duration
    }
}

pub struct MarkdownPage {
    nodes: Vec<Node>,
    sections: Vec<Section>,
    blocks: Vec<Block>,
    lines: Vec<Line>,
    width: usize,
    height: usize,
    offset: f64,
    smooth: Option<SmoothScroll>,
    smooth_duration: Duration,
    timers: TimerQueue,
    history: Vec<String>,
    back_to_top: bool,
    scrolled: bool,
}

impl MarkdownPage {
    /// Parse `markdown` and lay it out for a `width` x `height` viewport.
    ///
    /// `container` names the (empty) menu list the page provides, either as a
    /// bare id or as a `#id` selector.
    pub fn new(markdown: &str, container: &str, width: usize, height: usize) -> Self {
        let mut page = Self {
            nodes: Vec::new(),
            sections: Vec::new(),
            blocks: Vec::new(),
            lines: Vec::new(),
            width,
            height,
            offset: 0.0,
            smooth: None,
            smooth_duration: DEFAULT_SMOOTH_SCROLL,
            timers: TimerQueue::new(),
            history: Vec::new(),
            back_to_top: false,
            scrolled: false,
        };
        page.parse(markdown);
        let mut list = Node::new(NodeKind::List);
        list.id = Some(container.trim_start_matches('#').to_string());
        page.nodes.push(list);
        page.layout();
        info!(
            "document: {} sections, {} lines at width {}",
            page.sections.len(),
            page.lines.len(),
            page.width
        );
        page
    }

    pub fn with_smooth_scroll(mut self, duration: Duration) -> Self {
        self.smooth_duration = duration;
        self
    }

    fn parse(&mut self, markdown: &str) {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut b = BlockBuilder::default();
        // Explicit ids are reserved up front so a generated slug never takes
        // one that appears later in the document.
        let mut seen_ids: HashSet<String> = Parser::new_ext(markdown, options)
            .filter_map(|event| match event {
                Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
                _ => None,
            })
            .collect();

        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(Tag::Heading { level, id, attrs, .. }) => {
                    b.flush(&mut self.blocks);
                    b.heading = Some(PendingHeading {
                        level: level as usize,
                        id: id.map(|s| s.to_string()),
                        attrs: attrs
                            .into_iter()
                            .map(|(k, v)| (k.to_string(), v.map(|v| v.to_string())))
                            .collect(),
                        text: String::new(),
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(h) = b.heading.take() {
                        let idx = self.push_section(h, &mut seen_ids);
                        self.blocks.push(Block::Heading(idx));
                    }
                }
                Event::Start(Tag::BlockQuote(_)) => {
                    b.flush(&mut self.blocks);
                    b.quote_depth += 1;
                }
                Event::End(TagEnd::BlockQuote(_)) => {
                    b.flush(&mut self.blocks);
                    b.quote_depth = b.quote_depth.saturating_sub(1);
                }
                Event::Start(Tag::CodeBlock(_)) => {
                    b.flush(&mut self.blocks);
                    b.in_code = true;
                }
                Event::End(TagEnd::CodeBlock) => {
                    let code = std::mem::take(&mut b.code);
                    self.blocks.push(Block::Code {
                        indent: b.indent(),
                        lines: code.trim_end_matches('\n').lines().map(str::to_string).collect(),
                    });
                    b.in_code = false;
                }
                Event::Start(Tag::List(start)) => {
                    b.flush(&mut self.blocks);
                    b.lists.push(start);
                }
                Event::End(TagEnd::List(_)) => {
                    b.flush(&mut self.blocks);
                    b.lists.pop();
                }
                Event::Start(Tag::Item) => {
                    b.flush(&mut self.blocks);
                    let marker = match b.lists.last_mut() {
                        Some(Some(n)) => {
                            let m = format!("{n}. ");
                            *n += 1;
                            m
                        }
                        _ => "• ".to_string(),
                    };
                    b.item_marker = Some(marker);
                }
                Event::End(TagEnd::Item) => {
                    b.flush(&mut self.blocks);
                    b.item_marker = None;
                }
                Event::End(TagEnd::Paragraph) | Event::End(TagEnd::TableRow) => {
                    b.flush(&mut self.blocks);
                }
                Event::End(TagEnd::TableHead) => b.flush(&mut self.blocks),
                Event::End(TagEnd::TableCell) => b.sink().push_str(" | "),
                Event::Text(text) => {
                    if b.in_code {
                        b.code.push_str(&text);
                    } else {
                        b.sink().push_str(&text);
                    }
                }
                Event::Code(code) => {
                    let sink = b.sink();
                    sink.push('`');
                    sink.push_str(&code);
                    sink.push('`');
                }
                Event::SoftBreak | Event::HardBreak => b.sink().push(' '),
                Event::TaskListMarker(done) => {
                    b.sink().push_str(if done { "[x] " } else { "[ ] " });
                }
                Event::Rule => {
                    b.flush(&mut self.blocks);
                    self.blocks.push(Block::Rule);
                }
                _ => {}
            }
        }
        b.flush(&mut self.blocks);
    }

    fn push_section(&mut self, h: PendingHeading, seen: &mut HashSet<String>) -> usize {
        let title = h.text.trim().to_string();
        let id = match h.id {
            Some(id) => id,
            None => unique_slug(&title, seen),
        };
        seen.insert(id.clone());

        let idx = self.sections.len();
        let mut node = Node::new(NodeKind::Section(idx));
        node.id = Some(id.clone());
        node.text = title.clone();
        node.attrs = h
            .attrs
            .into_iter()
            .map(|(k, v)| {
                let v = v
                    .map(|v| v.trim_matches(|c| c == '"' || c == '\'').to_string())
                    .unwrap_or_else(|| title.clone());
                (k, v)
            })
            .collect();
        self.nodes.push(node);
        debug!("document: section #{id} (h{}) '{title}'", h.level);
        self.sections.push(Section {
            node: NodeId(self.nodes.len() - 1),
            id,
            title,
            level: h.level,
            start: 0,
            end: 0,
        });
        idx
    }

    fn layout(&mut self) {
        let width = self.width.max(MIN_WIDTH);
        self.lines.clear();
        for block in &self.blocks {
            if !self.lines.is_empty() {
                self.lines.push(Line {
                    text: String::new(),
                    kind: LineKind::Blank,
                });
            }
            match block {
                Block::Heading(idx) => {
                    let s = &mut self.sections[*idx];
                    s.start = self.lines.len();
                    let text = format!("{} {}", "#".repeat(s.level), s.title);
                    for l in wrap(&text, width) {
                        self.lines.push(Line {
                            text: l,
                            kind: LineKind::Heading(*idx),
                        });
                    }
                }
                Block::Text { first, rest, text } => {
                    let prefix_w = first.chars().count().max(rest.chars().count());
                    let body_w = width.saturating_sub(prefix_w).max(MIN_WIDTH / 2);
                    for (i, l) in wrap(text, body_w).into_iter().enumerate() {
                        let prefix = if i == 0 { first } else { rest };
                        self.lines.push(Line {
                            text: format!("{prefix}{l}"),
                            kind: LineKind::Body,
                        });
                    }
                }
                Block::Code { indent, lines } => {
                    for l in lines {
                        self.lines.push(Line {
                            text: format!("{indent}    {l}"),
                            kind: LineKind::Code,
                        });
                    }
                }
                Block::Rule => self.lines.push(Line {
                    text: "─".repeat(width),
                    kind: LineKind::Rule,
                }),
            }
        }

        let total = self.lines.len();
        for i in 0..self.sections.len() {
            let level = self.sections[i].level;
            self.sections[i].end = self.sections[i + 1..]
                .iter()
                .find(|s| s.level <= level)
                .map(|s| s.start)
                .unwrap_or(total);
        }
    }

    /// Re-wrap for a new viewport, keeping the scroll offset in range.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.layout();
        self.smooth = None;
        let clamped = self.offset.min(self.max_scroll());
        self.move_to(clamped);
        debug!("document: resized to {width}x{height}, {} lines", self.lines.len());
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_of(&self, node: NodeId) -> Option<&Section> {
        match self.nodes.get(node.0)?.kind {
            NodeKind::Section(idx) => self.sections.get(idx),
            _ => None,
        }
    }

    /// Innermost section currently carrying `class`.
    pub fn active_section(&self, class: &str) -> Option<&Section> {
        self.sections
            .iter()
            .rev()
            .find(|s| self.nodes[s.node.0].classes.contains(class))
    }

    pub fn max_scroll(&self) -> f64 {
        self.lines.len().saturating_sub(self.height) as f64
    }

    /// Scroll by `delta` lines as a user gesture (cancels any animation).
    pub fn scroll_by(&mut self, delta: f64) {
        let target = self.offset + delta;
        self.set_scroll_offset(target);
    }

    fn move_to(&mut self, offset: f64) {
        let clamped = offset.clamp(0.0, self.max_scroll());
        if clamped != self.offset {
            self.offset = clamped;
            self.scrolled = true;
        }
    }

    /// Whether the offset changed since the last call. Hosts turn this into
    /// a scroll signal, like a browser dispatching `scroll`.
    pub fn take_scrolled(&mut self) -> bool {
        std::mem::take(&mut self.scrolled)
    }

    /// Advance the page clock: expires timers and drives the smooth scroll.
    pub fn advance_clock(&mut self, now: Duration) {
        self.timers.advance_to(now);
        let now = self.timers.now();
        if let Some(anim) = &self.smooth {
            let (y, done) = (anim.offset_at(now), anim.finished(now));
            if done {
                self.smooth = None;
            }
            self.move_to(y);
        }
    }

    pub fn pop_due_timer(&mut self) -> Option<TimerId> {
        self.timers.pop_due()
    }

    pub fn next_timer_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn is_animating(&self) -> bool {
        self.smooth.is_some()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn back_to_top_visible(&self) -> bool {
        self.back_to_top
    }

    /// Menu rows attached under `container`, in order.
    pub fn menu_rows(&self, container: &str) -> Vec<MenuRow> {
        let Some(list) = self.query_selector(container) else {
            return Vec::new();
        };
        self.nodes[list.0]
            .children
            .iter()
            .filter_map(|&li| {
                let anchor = *self.nodes[li]
                    .children
                    .iter()
                    .find(|&&c| self.nodes[c].kind == NodeKind::Anchor)?;
                Some(MenuRow {
                    item: NodeId(li),
                    anchor: NodeId(anchor),
                    label: self.nodes[anchor].text.clone(),
                })
            })
            .collect()
    }

    pub fn has_class_on(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(node.0)
            .is_some_and(|n| n.classes.contains(class))
    }
}

/// Navigation entries a document would produce, without building a menu.
pub fn outline(markdown: &str, query: &SectionQuery) -> Vec<NavigationItem> {
    let page = MarkdownPage::new(markdown, "outline", 80, 24);
    let sections = page.query_sections(query);
    navigation_items(&page, &sections, query)
}

impl PageDocument for MarkdownPage {
    type Element = NodeId;
    type Fragment = NavFragment;

    fn query_sections(&self, query: &SectionQuery) -> Vec<NodeId> {
        self.sections
            .iter()
            .filter(|s| {
                self.nodes[s.node.0]
                    .attrs
                    .iter()
                    .any(|(k, _)| *k == query.marker_attribute)
            })
            .map(|s| s.node)
            .collect()
    }

    fn navigation_entries(&self, container: &str) -> Vec<NodeId> {
        self.menu_rows(container).into_iter().map(|r| r.anchor).collect()
    }

    fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.id.as_deref() == Some(id))
            .map(NodeId)
    }

    /// Supports `#id`, `.class` and bare tag names.
    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        if let Some(id) = selector.strip_prefix('#') {
            return self.get_element_by_id(id);
        }
        let pos = if let Some(class) = selector.strip_prefix('.') {
            self.nodes.iter().position(|n| n.classes.contains(class))
        } else {
            self.nodes.iter().position(|n| n.kind.tag() == selector)
        };
        pos.map(NodeId)
    }

    fn attribute(&self, el: NodeId, name: &str) -> Option<String> {
        let node = self.nodes.get(el.0)?;
        match name {
            "id" => node.id.clone(),
            "class" if !node.classes.is_empty() => Some(
                node.classes
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            _ => node
                .attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
        }
    }

    fn is_anchor(&self, el: NodeId) -> bool {
        self.nodes.get(el.0).is_some_and(|n| n.kind == NodeKind::Anchor)
    }

    /// Sections are measured in lines against the document viewport; menu
    /// elements report their row in the menu.
    fn bounding_rect(&self, el: NodeId) -> Rect {
        let Some(node) = self.nodes.get(el.0) else {
            return Rect::default();
        };
        match node.kind {
            NodeKind::Section(idx) => {
                let s = &self.sections[idx];
                Rect::new(
                    s.start as f64 - self.offset,
                    0.0,
                    s.end as f64 - self.offset,
                    self.width as f64,
                )
            }
            NodeKind::Item | NodeKind::Anchor => {
                let li = if node.kind == NodeKind::Anchor {
                    node.parent.unwrap_or(el.0)
                } else {
                    el.0
                };
                let row = self.nodes[li]
                    .parent
                    .and_then(|p| self.nodes[p].children.iter().position(|&c| c == li))
                    .unwrap_or(0) as f64;
                Rect::new(row, 0.0, row + 1.0, node.text.chars().count() as f64)
            }
            NodeKind::List => {
                Rect::new(0.0, 0.0, node.children.len() as f64, self.width as f64)
            }
        }
    }

    fn viewport(&self) -> ViewportSize {
        ViewportSize::uniform(self.width as f64, self.height as f64)
    }

    fn scroll_offset(&self) -> f64 {
        self.offset
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.smooth = None;
        self.move_to(offset);
    }

    fn has_class(&self, el: NodeId, class: &str) -> bool {
        self.has_class_on(el, class)
    }

    fn add_class(&mut self, el: NodeId, class: &str) {
        if let Some(n) = self.nodes.get_mut(el.0) {
            n.classes.insert(class.to_string());
        }
    }

    fn remove_class(&mut self, el: NodeId, class: &str) {
        if let Some(n) = self.nodes.get_mut(el.0) {
            n.classes.remove(class);
        }
    }

    fn create_navigation_fragment(&mut self, items: &[NavigationItem]) -> NavFragment {
        let mut lis = Vec::with_capacity(items.len());
        for item in items {
            let li = self.nodes.len();
            let mut li_node = Node::new(NodeKind::Item);
            li_node.children.push(li + 1);
            self.nodes.push(li_node);

            let mut a = Node::new(NodeKind::Anchor);
            a.parent = Some(li);
            a.text = item.label.clone();
            a.classes.insert("menu__link".to_string());
            a.attrs.push(("href".to_string(), format!("#{}", item.id)));
            a.attrs.push((TARGET_ATTRIBUTE.to_string(), item.id.clone()));
            self.nodes.push(a);
            lis.push(NodeId(li));
        }
        NavFragment(lis)
    }

    fn append_to_container(&mut self, selector: &str, fragment: NavFragment) -> bool {
        let Some(list) = self.query_selector(selector) else {
            return false;
        };
        for li in fragment.0 {
            self.nodes[li.0].parent = Some(list.0);
            self.nodes[list.0].children.push(li.0);
        }
        true
    }

    fn set_back_to_top_visible(&mut self, visible: bool) {
        self.back_to_top = visible;
    }

    fn push_history(&mut self, fragment: &str) {
        debug!("document: history push #{fragment}");
        self.history.push(fragment.to_string());
    }

    fn smooth_scroll_to(&mut self, el: NodeId) {
        let Some(section) = self.section_of(el) else {
            return;
        };
        let to = (section.start as f64).min(self.max_scroll());
        // A new request retargets the running animation from where it is now.
        self.smooth = Some(SmoothScroll {
            from: self.offset,
            to,
            start: self.timers.now(),
            duration: self.smooth_duration,
        });
    }

    fn schedule_timer(&mut self, delay: Duration) -> TimerId {
        self.timers.schedule(delay)
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.timers.cancel(id);
    }
}

#[derive(Default)]
struct PendingHeading {
    level: usize,
    id: Option<String>,
    attrs: Vec<(String, Option<String>)>,
    text: String,
}

/// Inline text accumulation between block boundaries.
#[derive(Default)]
struct BlockBuilder {
    buf: String,
    code: String,
    in_code: bool,
    heading: Option<PendingHeading>,
    lists: Vec<Option<u64>>,
    item_marker: Option<String>,
    quote_depth: usize,
}

impl BlockBuilder {
    fn sink(&mut self) -> &mut String {
        match &mut self.heading {
            Some(h) => &mut h.text,
            None => &mut self.buf,
        }
    }

    fn indent(&self) -> String {
        let quote = "> ".repeat(self.quote_depth);
        let list = "  ".repeat(self.lists.len().saturating_sub(1));
        format!("{quote}{list}")
    }

    fn flush(&mut self, blocks: &mut Vec<Block>) {
        let text = self.buf.split_whitespace().collect::<Vec<_>>().join(" ");
        self.buf.clear();
        if text.is_empty() {
            return;
        }
        let indent = self.indent();
        let (first, rest) = match self.item_marker.take() {
            Some(marker) => {
                let pad = " ".repeat(marker.chars().count());
                (format!("{indent}{marker}"), format!("{indent}{pad}"))
            }
            None if !self.lists.is_empty() => (format!("{indent}  "), format!("{indent}  ")),
            None => (indent.clone(), indent),
        };
        blocks.push(Block::Text { first, rest, text });
    }
}

/// Lowercase slug of `title`, suffixed with `-N` when already taken.
fn unique_slug(title: &str, seen: &HashSet<String>) -> String {
    let lower = title.to_lowercase();
    let base = NON_SLUG_RE.replace_all(&lower, "-");
    let base = base.trim_matches('-');
    let base = if base.is_empty() { "section" } else { base };
    if !seen.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_w = 0;
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if current_w > 0 {
                lines.push(std::mem::take(&mut current));
                current_w = 0;
            }
            lines.push(word.drain(..width).collect());
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current_w == 0 { word.len() } else { current_w + 1 + word.len() };
        if needed > width {
            lines.push(std::mem::take(&mut current));
            current_w = 0;
        }
        if current_w > 0 {
            current.push(' ');
            current_w += 1;
        }
        current.extend(word.iter());
        current_w += word.len();
    }
    if current_w > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}
