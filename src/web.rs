//! Browser binding: drives the navigation core from a live DOM.
//!
//! Elements are interned into an arena and handed to the core as
//! [`WebElement`] indices. Timers are `gloo` timeouts that call back into the
//! shared [`App`] through a weak handle, so a page torn down mid-flight simply
//! drops the late callback.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gloo_timers::callback::Timeout;
use log::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, DocumentFragment, Element, Event, ScrollBehavior, ScrollIntoViewOptions, Window,
};

use crate::config::{ConfigFile, NavigationConfig};
use crate::controller::{NavigationClick, NavigationController, PageEvent, ScrollSignal};
use crate::page::{
    EventDisposition, NavigationItem, PageDocument, Rect, SectionQuery, TARGET_ATTRIBUTE, TimerId,
    ViewportSize,
};

thread_local! {
    static APP: RefCell<Option<Rc<RefCell<App>>>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WebElement(usize);

pub struct WebPage {
    window: Window,
    document: Document,
    arena: RefCell<Vec<Element>>,
    timers: HashMap<TimerId, Timeout>,
    // A timeout must outlive its own callback; the one that just fired is
    // parked here until the next one does.
    _spent: Option<Timeout>,
    next_timer: u64,
    back_to_top: Option<Element>,
    app: Weak<RefCell<App>>,
}

impl WebPage {
    fn new(
        window: Window,
        document: Document,
        back_to_top: &str,
        app: Weak<RefCell<App>>,
    ) -> Self {
        let back_to_top = document.query_selector(back_to_top).ok().flatten();
        Self {
            window,
            document,
            arena: RefCell::new(Vec::new()),
            timers: HashMap::new(),
            _spent: None,
            next_timer: 0,
            back_to_top,
            app,
        }
    }

    fn intern(&self, el: Element) -> WebElement {
        let mut arena = self.arena.borrow_mut();
        if let Some(i) = arena.iter().position(|e| *e == el) {
            return WebElement(i);
        }
        arena.push(el);
        WebElement(arena.len() - 1)
    }

    fn element(&self, h: WebElement) -> Option<Element> {
        self.arena.borrow().get(h.0).cloned()
    }

    fn select_all(&self, selector: &str) -> Vec<WebElement> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            warn!("web: bad selector '{selector}'");
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|el| self.intern(el))
            .collect()
    }

    fn build_entry(&self, item: &NavigationItem) -> Result<Element, JsValue> {
        let li = self.document.create_element("li")?;
        let a = self.document.create_element("a")?;
        a.set_class_name("menu__link");
        a.set_attribute("href", &format!("#{}", item.id))?;
        a.set_attribute(TARGET_ATTRIBUTE, &item.id)?;
        a.set_text_content(Some(&item.label));
        li.append_child(&a)?;
        Ok(li)
    }

    fn timer_fired(&mut self, id: TimerId) {
        self._spent = self.timers.remove(&id);
    }
}

impl PageDocument for WebPage {
    type Element = WebElement;
    type Fragment = DocumentFragment;

    fn query_sections(&self, query: &SectionQuery) -> Vec<WebElement> {
        self.select_all(&format!("section[{}]", query.marker_attribute))
    }

    fn navigation_entries(&self, container: &str) -> Vec<WebElement> {
        self.select_all(&format!("{container} a"))
    }

    fn get_element_by_id(&self, id: &str) -> Option<WebElement> {
        self.document.get_element_by_id(id).map(|el| self.intern(el))
    }

    fn query_selector(&self, selector: &str) -> Option<WebElement> {
        self.document
            .query_selector(selector)
            .ok()
            .flatten()
            .map(|el| self.intern(el))
    }

    fn attribute(&self, element: WebElement, name: &str) -> Option<String> {
        let el = self.element(element)?;
        if name == "id" {
            let id = el.id();
            return (!id.is_empty()).then_some(id);
        }
        el.get_attribute(name)
    }

    fn is_anchor(&self, element: WebElement) -> bool {
        self.element(element)
            .is_some_and(|el| el.tag_name().eq_ignore_ascii_case("a"))
    }

    fn bounding_rect(&self, element: WebElement) -> Rect {
        let Some(el) = self.element(element) else {
            return Rect::default();
        };
        let r = el.get_bounding_client_rect();
        Rect::new(r.top(), r.left(), r.bottom(), r.right())
    }

    fn viewport(&self) -> ViewportSize {
        let root = self.document.document_element();
        ViewportSize {
            inner_width: self.window.inner_width().ok().and_then(|v| v.as_f64()),
            inner_height: self.window.inner_height().ok().and_then(|v| v.as_f64()),
            client_width: root.as_ref().map_or(0.0, |r| f64::from(r.client_width())),
            client_height: root.as_ref().map_or(0.0, |r| f64::from(r.client_height())),
        }
    }

    fn scroll_offset(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.window.scroll_to_with_x_and_y(0.0, offset);
    }

    fn has_class(&self, element: WebElement, class: &str) -> bool {
        self.element(element)
            .is_some_and(|el| el.class_list().contains(class))
    }

    fn add_class(&mut self, element: WebElement, class: &str) {
        if let Some(el) = self.element(element)
            && let Err(e) = el.class_list().add_1(class)
        {
            warn!("web: add class '{class}' failed: {e:?}");
        }
    }

    fn remove_class(&mut self, element: WebElement, class: &str) {
        if let Some(el) = self.element(element)
            && let Err(e) = el.class_list().remove_1(class)
        {
            warn!("web: remove class '{class}' failed: {e:?}");
        }
    }

    fn create_navigation_fragment(&mut self, items: &[NavigationItem]) -> DocumentFragment {
        let fragment = self.document.create_document_fragment();
        for item in items {
            let appended = self
                .build_entry(item)
                .and_then(|li| fragment.append_child(&li));
            if let Err(e) = appended {
                warn!("web: menu entry #{} not built: {e:?}", item.id);
            }
        }
        fragment
    }

    fn append_to_container(&mut self, selector: &str, fragment: DocumentFragment) -> bool {
        let Some(container) = self.document.query_selector(selector).ok().flatten() else {
            return false;
        };
        container.append_child(&fragment).is_ok()
    }

    fn set_back_to_top_visible(&mut self, visible: bool) {
        if let Some(button) = &self.back_to_top
            && let Err(e) = button.toggle_attribute_with_force("hidden", !visible)
        {
            warn!("web: back-to-top visibility not updated: {e:?}");
        }
    }

    fn push_history(&mut self, fragment: &str) {
        let pushed = self.window.history().and_then(|h| {
            h.push_state_with_url(&JsValue::NULL, "", Some(&format!("#{fragment}")))
        });
        if let Err(e) = pushed {
            warn!("web: pushState #{fragment} failed: {e:?}");
        }
    }

    fn smooth_scroll_to(&mut self, element: WebElement) {
        if let Some(el) = self.element(element) {
            let options = ScrollIntoViewOptions::new();
            options.set_behavior(ScrollBehavior::Smooth);
            el.scroll_into_view_with_scroll_into_view_options(&options);
        }
    }

    fn schedule_timer(&mut self, delay: Duration) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        let app = self.app.clone();
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        let timeout = Timeout::new(millis, move || {
            if let Some(app) = app.upgrade() {
                dispatch(&app, PageEvent::TimerFired(id));
            }
        });
        self.timers.insert(id, timeout);
        id
    }

    fn cancel_timer(&mut self, id: TimerId) {
        // Dropping a gloo timeout clears it.
        self.timers.remove(&id);
    }
}

struct App {
    page: WebPage,
    controller: NavigationController,
}

fn dispatch(app: &Rc<RefCell<App>>, event: PageEvent<WebElement>) -> EventDisposition {
    let Ok(mut app) = app.try_borrow_mut() else {
        debug!("web: {event:?} arrived during dispatch, dropped");
        return EventDisposition::Ignored;
    };
    let App { page, controller } = &mut *app;
    if let PageEvent::TimerFired(id) = event {
        page.timer_fired(id);
    }
    controller.handle(event, page)
}

fn listen(
    target: &web_sys::EventTarget,
    kind: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    // Listeners live as long as the page.
    closure.forget();
    Ok(())
}

/// Attach to the current document with default settings.
#[wasm_bindgen]
pub fn install() -> Result<(), JsValue> {
    let config = ConfigFile::default().resolve();
    install_with(&config.navigation)
}

/// Build the menu, then wire scroll, menu-click and back-to-top listeners.
pub fn install_with(config: &NavigationConfig) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let app = Rc::new_cyclic(|weak| {
        RefCell::new(App {
            page: WebPage::new(
                window.clone(),
                document.clone(),
                &config.back_to_top,
                weak.clone(),
            ),
            controller: NavigationController::new(config),
        })
    });
    {
        let mut guard = app.borrow_mut();
        let App { page, controller } = &mut *guard;
        controller.start(page);
    }

    let weak = Rc::downgrade(&app);
    listen(&window, "scroll", move |_| {
        if let Some(app) = weak.upgrade() {
            dispatch(&app, PageEvent::Scroll(ScrollSignal));
        }
    })?;

    match document.query_selector(&config.container)? {
        Some(container) => {
            let weak = Rc::downgrade(&app);
            listen(&container, "click", move |event| {
                let Some(app) = weak.upgrade() else { return };
                let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok())
                else {
                    return;
                };
                let Ok(target) = app.try_borrow().map(|a| a.page.intern(target)) else {
                    return;
                };
                let click = PageEvent::NavigationClick(NavigationClick { target });
                if dispatch(&app, click) == EventDisposition::DefaultPrevented {
                    event.prevent_default();
                }
            })?;
        }
        None => warn!("web: container '{}' not found, menu clicks unhandled", config.container),
    }

    if let Some(button) = document.query_selector(&config.back_to_top)? {
        let weak = Rc::downgrade(&app);
        listen(&button, "click", move |event| {
            if let Some(app) = weak.upgrade() {
                event.prevent_default();
                dispatch(&app, PageEvent::BackToTop);
            }
        })?;
    }

    info!("web: installed on '{}'", config.container);
    APP.with(|slot| *slot.borrow_mut() = Some(app));
    Ok(())
}
