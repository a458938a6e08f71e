//! Browser platform built on `IntersectionObserver` and `scrollIntoView`
//!
//! [`WebScrollSpy`] is the JavaScript-facing handle: it mounts a tracker on
//! the current document, wires every `[data-section-link]` anchor rendered by
//! the HTML exporter to [`VisibilityTracker::navigate_to`] and keeps the
//! links' `active` class in step with the active section.

use super::{Platform, PlatformError};
use crate::active_section::{ActiveSectionHandle, SubscriptionId};
use crate::observer::{IntersectionEntry, ObserverOptions};
use crate::page_config::PageConfig;
use crate::section_registry::SectionId;
use crate::tracker::VisibilityTracker;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition,
};

/// Receives each batch the browser delivers to the observer callback
pub type EntrySink = Rc<dyn Fn(Vec<IntersectionEntry<Element>>)>;

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;
type ClickCallback = Closure<dyn FnMut(Event)>;

const SECTION_LINK_SELECTOR: &str = "[data-section-link]";
const POPOVER_SELECTOR: &str = "[data-nav-popover]";
const POPOVER_TOGGLE_SELECTOR: &str = "[data-popover-toggle]";

/// [`Platform`] backed by the browser DOM
pub struct WebPlatform {
    document: Document,
    sink: EntrySink,
    // The closure must live as long as the observer that calls it
    observer: Option<(IntersectionObserver, ObserverCallback)>,
}

impl WebPlatform {
    pub fn new(document: Document, sink: EntrySink) -> Self {
        Self {
            document,
            sink,
            observer: None,
        }
    }

    /// Create the shared observer on first use
    fn observer(&mut self, options: &ObserverOptions) -> Result<&IntersectionObserver, PlatformError> {
        if !options.is_valid_threshold() {
            return Err(PlatformError::InvalidThreshold(options.threshold));
        }

        if self.observer.is_none() {
            let sink = Rc::clone(&self.sink);
            let callback: ObserverCallback = Closure::wrap(Box::new(
                move |records: js_sys::Array, _observer: IntersectionObserver| {
                    let entries = records
                        .iter()
                        .filter_map(|record| record.dyn_into::<IntersectionObserverEntry>().ok())
                        .map(|record| {
                            IntersectionEntry::new(
                                record.target(),
                                record.is_intersecting(),
                                record.intersection_ratio(),
                            )
                        })
                        .collect();
                    sink(entries);
                },
            )
                as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

            let init = IntersectionObserverInit::new();
            init.set_threshold(&JsValue::from_f64(options.threshold));
            init.set_root_margin(&options.root_margin);

            let observer =
                IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
                    .map_err(|e| PlatformError::ObserverUnavailable(format!("{:?}", e)))?;
            self.observer = Some((observer, callback));
        }

        self.observer
            .as_ref()
            .map(|(observer, _)| observer)
            .ok_or_else(|| PlatformError::ObserverUnavailable("observer not created".to_string()))
    }
}

impl Platform for WebPlatform {
    type Element = Element;

    fn find_element(&self, id: &SectionId) -> Option<Element> {
        self.document.get_element_by_id(id.as_str())
    }

    fn observe(&mut self, element: &Element, options: &ObserverOptions) -> Result<(), PlatformError> {
        if !element.is_connected() {
            return Err(PlatformError::DetachedElement(element.id()));
        }
        self.observer(options)?.observe(element);
        Ok(())
    }

    fn unobserve(&mut self, element: &Element) {
        if let Some((observer, _)) = &self.observer {
            observer.unobserve(element);
        }
    }

    fn disconnect(&mut self) {
        if let Some((observer, _callback)) = self.observer.take() {
            observer.disconnect();
        }
    }

    fn scroll_into_view(&mut self, element: &Element) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Start);
        element.scroll_into_view_with_scroll_into_view_options(&options);
    }
}

type SharedTracker = Rc<RefCell<VisibilityTracker<WebPlatform>>>;

/// Scroll-spy mounted on the current page
#[wasm_bindgen]
pub struct WebScrollSpy {
    tracker: SharedTracker,
    active: ActiveSectionHandle,
    subscription: Option<SubscriptionId>,
    listeners: Vec<(Element, ClickCallback)>,
}

#[wasm_bindgen]
impl WebScrollSpy {
    /// Mount on `window.document` using a page.toml description
    pub fn mount(page_toml: &str) -> Result<WebScrollSpy, JsValue> {
        let page = PageConfig::from_toml(page_toml).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let registry = page
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("No document available"))?;

        let options = page.observer.clone();
        let platform_document = document.clone();
        let tracker: SharedTracker = Rc::new_cyclic(|weak: &Weak<RefCell<_>>| {
            let weak = weak.clone();
            let sink: EntrySink = Rc::new(move |entries: Vec<IntersectionEntry<Element>>| {
                deliver(&weak, entries)
            });
            RefCell::new(VisibilityTracker::new(
                registry,
                WebPlatform::new(platform_document, sink),
                options,
            ))
        });

        let observed = tracker
            .borrow_mut()
            .attach()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        log::info!("Observing {} sections", observed);

        let active = tracker.borrow().active_handle();
        highlight_links(&document, &active.get());
        let link_document = document.clone();
        let subscription = active.subscribe(move |id, source| {
            log::debug!("Active section '{}' ({})", id, source);
            highlight_links(&link_document, id);
        });

        let mut spy = WebScrollSpy {
            tracker,
            active,
            subscription: Some(subscription),
            listeners: Vec::new(),
        };
        spy.bind_links(&document)?;
        spy.bind_popover_toggle(&document)?;
        Ok(spy)
    }

    /// Make `id` active and scroll it into view
    pub fn navigate(&self, id: &str) {
        match self.tracker.try_borrow_mut() {
            Ok(mut tracker) => tracker.navigate_to(id),
            Err(_) => log::warn!("Tracker busy; dropping navigation to '{}'", id),
        }
    }

    /// Id of the active section
    pub fn active(&self) -> String {
        self.active.get().as_str().to_string()
    }

    /// Remove every listener and observation; safe to call more than once
    pub fn unmount(&mut self) {
        for (element, callback) in self.listeners.drain(..) {
            let _ = element
                .remove_event_listener_with_callback("click", callback.as_ref().unchecked_ref());
        }
        if let Some(subscription) = self.subscription.take() {
            self.active.unsubscribe(subscription);
        }
        match self.tracker.try_borrow_mut() {
            Ok(mut tracker) => tracker.detach(),
            Err(_) => log::warn!("Tracker busy; observers stay bound until it is dropped"),
        }
    }
}

impl WebScrollSpy {
    fn bind_links(&mut self, document: &Document) -> Result<(), JsValue> {
        let links = document.query_selector_all(SECTION_LINK_SELECTOR)?;
        for index in 0..links.length() {
            let Some(link) = links
                .item(index)
                .and_then(|node| node.dyn_into::<Element>().ok())
            else {
                continue;
            };
            let Some(target) = link.get_attribute("data-section-link") else {
                continue;
            };

            let tracker = Rc::clone(&self.tracker);
            let in_popover = link.closest(POPOVER_SELECTOR)?;
            let callback: ClickCallback = Closure::wrap(Box::new(move |event: Event| {
                event.prevent_default();
                if let Some(popover) = &in_popover {
                    let _ = popover.class_list().remove_1("open");
                }
                match tracker.try_borrow_mut() {
                    Ok(mut tracker) => tracker.navigate_to(target.as_str()),
                    Err(_) => log::warn!("Tracker busy; dropping click on '{}'", target),
                }
            }) as Box<dyn FnMut(Event)>);

            link.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())?;
            self.listeners.push((link, callback));
        }
        Ok(())
    }

    fn bind_popover_toggle(&mut self, document: &Document) -> Result<(), JsValue> {
        let (Some(toggle), Some(popover)) = (
            document.query_selector(POPOVER_TOGGLE_SELECTOR)?,
            document.query_selector(POPOVER_SELECTOR)?,
        ) else {
            return Ok(());
        };

        let button = toggle.clone();
        let callback: ClickCallback = Closure::wrap(Box::new(move |_event: Event| {
            let open = popover.class_list().toggle("open").unwrap_or(false);
            let _ = button.set_attribute("aria-expanded", if open { "true" } else { "false" });
        }) as Box<dyn FnMut(Event)>);

        toggle.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())?;
        self.listeners.push((toggle, callback));
        Ok(())
    }
}

impl Drop for WebScrollSpy {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Forward a batch to the tracker if it is still alive
fn deliver(
    tracker: &Weak<RefCell<VisibilityTracker<WebPlatform>>>,
    entries: Vec<IntersectionEntry<Element>>,
) {
    let Some(tracker) = tracker.upgrade() else {
        return;
    };
    match tracker.try_borrow_mut() {
        Ok(mut tracker) => {
            tracker.on_intersection_batch(entries);
        }
        Err(_) => log::warn!("Tracker busy; dropping {} intersection entries", entries.len()),
    }
}

/// Mark the links pointing at `active` and clear the rest
fn highlight_links(document: &Document, active: &SectionId) {
    let Ok(links) = document.query_selector_all(SECTION_LINK_SELECTOR) else {
        return;
    };
    for index in 0..links.length() {
        let Some(link) = links
            .item(index)
            .and_then(|node| node.dyn_into::<Element>().ok())
        else {
            continue;
        };
        // The hero button is a link too but is never highlighted
        if link.class_list().contains("cta") {
            continue;
        }
        let is_active = link
            .get_attribute("data-section-link")
            .is_some_and(|target| *active == target.as_str());
        let classes = link.class_list();
        if is_active {
            let _ = classes.add_1("active");
            let _ = link.set_attribute("aria-current", "true");
        } else {
            let _ = classes.remove_1("active");
            let _ = link.remove_attribute("aria-current");
        }
    }
}
