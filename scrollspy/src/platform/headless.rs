//! In-memory page used by the simulator and tests
//!
//! Sections are laid out as vertical boxes (`top`, `height`) inside a
//! scrollable document. Observation follows browser semantics closely enough
//! for the scroll-spy: observing an element queues an initial entry, each
//! scroll queues an entry for every observed element whose visibility
//! crossed its threshold, and [`HeadlessDocument::take_records`] drains the
//! queue in observation order. Unlike a browser, `is_intersecting` is
//! reported relative to the configured threshold rather than to any overlap.
//! The root margin grows or shrinks the viewport vertically, as it does for
//! the browser's root rectangle.
//!
//! `HeadlessDocument` is a cheap handle: clones share the same page, so a
//! test can keep one while the tracker owns another.

use super::{Platform, PlatformError};
use crate::observer::{IntersectionEntry, ObserverOptions};
use crate::section_registry::SectionId;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Handle to an element mounted in a [`HeadlessDocument`]
///
/// Handles are never reused, so a remounted section gets a new handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A smooth scroll requested through [`Platform::scroll_into_view`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRequest {
    pub target: ElementHandle,
    pub section: SectionId,
}

#[derive(Debug, Clone)]
struct MountedElement {
    handle: ElementHandle,
    id: SectionId,
    top: f64,
    height: f64,
}

#[derive(Debug, Clone)]
struct Observation {
    handle: ElementHandle,
    threshold: f64,
    /// Root margin `(top, bottom)` in pixels
    margin: (f64, f64),
    satisfied: bool,
}

#[derive(Debug)]
struct DocumentState {
    viewport_height: f64,
    scroll_top: f64,
    elements: Vec<MountedElement>,
    observations: Vec<Observation>,
    pending: Vec<IntersectionEntry<ElementHandle>>,
    scroll_requests: Vec<ScrollRequest>,
    next_handle: u64,
}

impl DocumentState {
    fn element(&self, handle: ElementHandle) -> Option<&MountedElement> {
        self.elements.iter().find(|e| e.handle == handle)
    }

    fn document_height(&self) -> f64 {
        self.elements
            .iter()
            .map(|e| e.top + e.height)
            .fold(0.0, f64::max)
    }

    fn ratio(&self, handle: ElementHandle) -> f64 {
        self.ratio_within(handle, (0.0, 0.0))
    }

    /// Visible fraction with the viewport grown (or shrunk) by `margin`
    fn ratio_within(&self, handle: ElementHandle, (top, bottom): (f64, f64)) -> f64 {
        let Some(element) = self.element(handle) else {
            return 0.0;
        };
        if element.height <= 0.0 {
            return 0.0;
        }
        let view_top = self.scroll_top - top;
        let view_bottom = self.scroll_top + self.viewport_height + bottom;
        let visible = (element.top + element.height).min(view_bottom) - element.top.max(view_top);
        (visible.max(0.0) / element.height).min(1.0)
    }

    /// Queue entries for every observation whose threshold state flipped
    fn recompute(&mut self) {
        for index in 0..self.observations.len() {
            let handle = self.observations[index].handle;
            let ratio = self.ratio_within(handle, self.observations[index].margin);
            let observation = &mut self.observations[index];
            let satisfied = meets_threshold(ratio, observation.threshold);
            if satisfied != observation.satisfied {
                observation.satisfied = satisfied;
                self.pending
                    .push(IntersectionEntry::new(handle, satisfied, ratio));
            }
        }
    }
}

fn meets_threshold(ratio: f64, threshold: f64) -> bool {
    if threshold <= 0.0 {
        ratio > 0.0
    } else {
        ratio >= threshold
    }
}

/// In-memory document with a scrollable viewport
#[derive(Debug, Clone)]
pub struct HeadlessDocument {
    state: Rc<RefCell<DocumentState>>,
}

impl HeadlessDocument {
    /// Create an empty document with the given viewport height
    pub fn new(viewport_height: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(DocumentState {
                viewport_height: viewport_height.max(0.0),
                scroll_top: 0.0,
                elements: Vec::new(),
                observations: Vec::new(),
                pending: Vec::new(),
                scroll_requests: Vec::new(),
                next_handle: 0,
            })),
        }
    }

    /// Create a document with one section per id, stacked top to bottom
    pub fn with_stacked_sections<'a, I>(viewport_height: f64, ids: I, section_height: f64) -> Self
    where
        I: IntoIterator<Item = &'a SectionId>,
    {
        let document = Self::new(viewport_height);
        for id in ids {
            document.append_section(id.clone(), section_height);
        }
        document
    }

    /// Mount a section element at an explicit position
    pub fn mount(&self, id: impl Into<SectionId>, top: f64, height: f64) -> ElementHandle {
        let mut state = self.state.borrow_mut();
        let handle = ElementHandle(state.next_handle);
        state.next_handle += 1;
        state.elements.push(MountedElement {
            handle,
            id: id.into(),
            top,
            height: height.max(0.0),
        });
        state.recompute();
        handle
    }

    /// Mount a section element directly below the current content
    pub fn append_section(&self, id: impl Into<SectionId>, height: f64) -> ElementHandle {
        let top = self.state.borrow().document_height();
        self.mount(id, top, height)
    }

    /// Remove an element from the document; returns `false` if it was not mounted
    pub fn unmount(&self, handle: ElementHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.elements.len();
        state.elements.retain(|e| e.handle != handle);
        let removed = state.elements.len() != before;
        if removed {
            state.recompute();
        }
        removed
    }

    /// Remove every element bearing `id`
    pub fn unmount_section(&self, id: &str) -> usize {
        let handles: Vec<ElementHandle> = self
            .state
            .borrow()
            .elements
            .iter()
            .filter(|e| e.id == id)
            .map(|e| e.handle)
            .collect();
        handles.into_iter().filter(|h| self.unmount(*h)).count()
    }

    pub fn viewport_height(&self) -> f64 {
        self.state.borrow().viewport_height
    }

    pub fn scroll_top(&self) -> f64 {
        self.state.borrow().scroll_top
    }

    pub fn document_height(&self) -> f64 {
        self.state.borrow().document_height()
    }

    /// Top offset of the first element bearing `id`
    pub fn section_top(&self, id: &str) -> Option<f64> {
        self.state
            .borrow()
            .elements
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.top)
    }

    /// Current visible fraction of an element
    pub fn intersection_ratio(&self, handle: ElementHandle) -> f64 {
        self.state.borrow().ratio(handle)
    }

    /// Scroll the viewport (clamped to the document) and return the resulting batch
    pub fn scroll_to(&self, y: f64) -> Vec<IntersectionEntry<ElementHandle>> {
        {
            let mut state = self.state.borrow_mut();
            let max = (state.document_height() - state.viewport_height).max(0.0);
            state.scroll_top = y.clamp(0.0, max);
            state.recompute();
        }
        self.take_records()
    }

    pub fn scroll_by(&self, dy: f64) -> Vec<IntersectionEntry<ElementHandle>> {
        let y = self.scroll_top() + dy;
        self.scroll_to(y)
    }

    /// Drain the queued intersection entries in delivery order
    pub fn take_records(&self) -> Vec<IntersectionEntry<ElementHandle>> {
        std::mem::take(&mut self.state.borrow_mut().pending)
    }

    /// Smooth scrolls requested so far and not yet settled
    pub fn scroll_requests(&self) -> Vec<ScrollRequest> {
        self.state.borrow().scroll_requests.clone()
    }

    /// Finish the pending scroll animation
    ///
    /// A later request supersedes earlier ones, so the viewport ends at the
    /// top of the most recently requested element. Returns the batch the
    /// movement produced (or the queued entries if nothing was requested).
    pub fn settle_scroll(&self) -> Vec<IntersectionEntry<ElementHandle>> {
        let target_top = {
            let mut state = self.state.borrow_mut();
            let last = state.scroll_requests.pop();
            state.scroll_requests.clear();
            last.and_then(|request| state.element(request.target).map(|e| e.top))
        };
        match target_top {
            Some(top) => self.scroll_to(top),
            None => self.take_records(),
        }
    }

    /// Number of elements currently observed
    pub fn observed_count(&self) -> usize {
        self.state.borrow().observations.len()
    }

    pub fn is_observed(&self, handle: ElementHandle) -> bool {
        self.state
            .borrow()
            .observations
            .iter()
            .any(|o| o.handle == handle)
    }
}

impl Platform for HeadlessDocument {
    type Element = ElementHandle;

    fn find_element(&self, id: &SectionId) -> Option<ElementHandle> {
        self.state
            .borrow()
            .elements
            .iter()
            .find(|e| e.id == *id)
            .map(|e| e.handle)
    }

    fn observe(
        &mut self,
        element: &ElementHandle,
        options: &ObserverOptions,
    ) -> Result<(), PlatformError> {
        if !options.is_valid_threshold() {
            return Err(PlatformError::InvalidThreshold(options.threshold));
        }
        let margin = options
            .parsed_root_margin()
            .ok_or_else(|| PlatformError::InvalidRootMargin(options.root_margin.clone()))?;

        let mut state = self.state.borrow_mut();
        if state.element(*element).is_none() {
            return Err(PlatformError::DetachedElement(element.to_string()));
        }
        if state.observations.iter().any(|o| o.handle == *element) {
            return Ok(());
        }

        let margin = margin.resolve(state.viewport_height);
        let ratio = state.ratio_within(*element, margin);
        let satisfied = meets_threshold(ratio, options.threshold);
        state.observations.push(Observation {
            handle: *element,
            threshold: options.threshold,
            margin,
            satisfied,
        });
        state
            .pending
            .push(IntersectionEntry::new(*element, satisfied, ratio));
        Ok(())
    }

    fn unobserve(&mut self, element: &ElementHandle) {
        let mut state = self.state.borrow_mut();
        state.observations.retain(|o| o.handle != *element);
        state.pending.retain(|entry| entry.target != *element);
    }

    fn scroll_into_view(&mut self, element: &ElementHandle) {
        let mut state = self.state.borrow_mut();
        let Some(section) = state.element(*element).map(|e| e.id.clone()) else {
            log::debug!("Ignoring scroll request for unmounted element {}", element);
            return;
        };
        state.scroll_requests.push(ScrollRequest {
            target: *element,
            section,
        });
    }
}
