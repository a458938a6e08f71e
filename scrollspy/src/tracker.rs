//! Visibility tracker: keeps the active section in sync with the viewport
//!
//! The tracker owns the active section state and the map of observed
//! elements. Its lifecycle is explicit: [`VisibilityTracker::attach`] binds
//! one observation per rendered section, [`VisibilityTracker::detach`]
//! releases all of them, and dropping the tracker detaches as well, so the
//! bindings never outlive the page instance that made them.

use crate::active_section::{ActiveSection, ActiveSectionHandle, ChangeSource};
use crate::observer::{select_active, IntersectionEntry, ObserverOptions};
use crate::platform::{Platform, PlatformError};
use crate::section_registry::{SectionId, SectionRegistry};

/// Elements currently observed, in registry order
#[derive(Debug)]
struct ObservedElements<E> {
    entries: Vec<(SectionId, E)>,
}

impl<E: PartialEq> ObservedElements<E> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn insert(&mut self, id: SectionId, element: E) {
        self.entries.push((id, element));
    }

    fn element(&self, id: &str) -> Option<&E> {
        self.entries
            .iter()
            .find(|(section, _)| *section == id)
            .map(|(_, element)| element)
    }

    fn section_of(&self, element: &E) -> Option<&SectionId> {
        self.entries
            .iter()
            .find(|(_, bound)| bound == element)
            .map(|(section, _)| section)
    }

    fn drain(&mut self) -> std::vec::Drain<'_, (SectionId, E)> {
        self.entries.drain(..)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Tracks which registered section dominates the viewport
pub struct VisibilityTracker<P: Platform> {
    registry: SectionRegistry,
    platform: P,
    options: ObserverOptions,
    active: ActiveSection,
    observed: ObservedElements<P::Element>,
    attached: bool,
}

impl<P: Platform> VisibilityTracker<P> {
    /// Create a detached tracker; the active section starts at the first registered id
    pub fn new(registry: SectionRegistry, platform: P, options: ObserverOptions) -> Self {
        let active = ActiveSection::new(registry.first().id.clone());
        Self {
            registry,
            platform,
            options,
            active,
            observed: ObservedElements::new(),
            attached: false,
        }
    }

    /// Bind an observation to every registered section that is rendered
    ///
    /// Sections without an element are skipped. Attaching an attached
    /// tracker releases the previous bindings first, which picks up sections
    /// mounted since. If the platform refuses an observation, every binding
    /// made so far is released before the error is returned.
    ///
    /// Returns the number of observed sections.
    pub fn attach(&mut self) -> Result<usize, PlatformError> {
        if self.attached {
            log::debug!("Re-attaching tracker; releasing previous bindings");
            self.detach();
        }

        let registry = self.registry.clone();
        for section in &registry {
            let Some(element) = self.platform.find_element(&section.id) else {
                log::debug!("No element rendered for section '{}'; skipping", section.id);
                continue;
            };
            if let Err(e) = self.platform.observe(&element, &self.options) {
                log::warn!("Failed to observe section '{}': {}", section.id, e);
                self.detach();
                return Err(e);
            }
            self.observed.insert(section.id.clone(), element);
        }

        self.attached = true;
        log::debug!(
            "Observing {} of {} sections (threshold {}, {})",
            self.observed.len(),
            self.registry.len(),
            self.options.threshold,
            self.options.tie_break
        );
        Ok(self.observed.len())
    }

    /// Apply one batch of intersection entries
    ///
    /// Entries are considered in delivery order; only intersecting entries
    /// whose target is currently observed are candidates, and the configured
    /// tie-break picks the winner. Returns the section the batch selected,
    /// if any.
    pub fn on_intersection_batch<I>(&mut self, entries: I) -> Option<SectionId>
    where
        I: IntoIterator<Item = IntersectionEntry<P::Element>>,
    {
        let observed = &self.observed;
        let candidates = entries.into_iter().filter_map(|entry| {
            if !entry.is_intersecting {
                return None;
            }
            match observed.section_of(&entry.target) {
                Some(id) => Some((id.clone(), entry.intersection_ratio)),
                None => {
                    log::trace!("Ignoring entry for unobserved element {:?}", entry.target);
                    None
                }
            }
        });

        let winner = select_active(candidates, self.options.tie_break)?;
        self.active.set(winner.clone(), ChangeSource::Observed);
        Some(winner)
    }

    /// Make `id` active immediately and request a smooth scroll to it
    ///
    /// The state update does not wait for observation; the scroll itself
    /// produces fresh entries that confirm or correct it. An id without an
    /// element only updates the state.
    pub fn navigate_to(&mut self, id: impl Into<SectionId>) {
        let id = id.into();
        self.active.set(id.clone(), ChangeSource::Navigated);

        let element = self
            .observed
            .element(id.as_str())
            .cloned()
            .or_else(|| self.platform.find_element(&id));
        match element {
            Some(element) => self.platform.scroll_into_view(&element),
            None => log::debug!("No element for section '{}'; nothing to scroll to", id),
        }
    }

    /// Release every observation; safe to call any number of times
    pub fn detach(&mut self) {
        let released = self.observed.len();
        let platform = &mut self.platform;
        for (id, element) in self.observed.drain() {
            log::trace!("Unobserving section '{}'", id);
            platform.unobserve(&element);
        }
        if self.attached || released > 0 {
            self.platform.disconnect();
            self.attached = false;
        }
    }

    pub fn active(&self) -> SectionId {
        self.active.get()
    }

    /// Read-only handle for navigation views
    pub fn active_handle(&self) -> ActiveSectionHandle {
        self.active.handle()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Ids of the sections currently observed, in registry order
    pub fn observed_sections(&self) -> Vec<SectionId> {
        self.observed
            .entries
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }
}

impl<P: Platform> Drop for VisibilityTracker<P> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::TieBreak;
    use crate::platform::headless::{ElementHandle, HeadlessDocument};
    use crate::section_registry::SectionDescriptor;

    fn registry(ids: &[&str]) -> SectionRegistry {
        SectionRegistry::new(
            ids.iter()
                .map(|id| SectionDescriptor::new(*id, id.to_uppercase(), "dot"))
                .collect(),
        )
        .unwrap()
    }

    fn tracker(ids: &[&str]) -> (VisibilityTracker<HeadlessDocument>, HeadlessDocument) {
        let registry = registry(ids);
        let document = HeadlessDocument::with_stacked_sections(500.0, registry.ids(), 1000.0);
        let tracker = VisibilityTracker::new(registry, document.clone(), ObserverOptions::default());
        (tracker, document)
    }

    fn handle(document: &HeadlessDocument, id: &str) -> ElementHandle {
        document.find_element(&SectionId::new(id)).unwrap()
    }

    #[test]
    fn test_initial_state_is_first_section() {
        let (tracker, _) = tracker(&["a", "b", "c"]);
        assert_eq!(tracker.active(), "a");
        assert!(!tracker.is_attached());
    }

    #[test]
    fn test_attach_observes_rendered_sections_only() {
        let registry = registry(&["a", "b", "c"]);
        let document = HeadlessDocument::new(500.0);
        document.append_section("a", 1000.0);
        document.append_section("c", 1000.0);

        let mut tracker = VisibilityTracker::new(registry, document.clone(), ObserverOptions::default());
        assert_eq!(tracker.attach().unwrap(), 2);
        assert_eq!(tracker.observed_sections(), vec![SectionId::new("a"), SectionId::new("c")]);
        assert_eq!(document.observed_count(), 2);
    }

    #[test]
    fn test_observer_driven_update() {
        let (mut tracker, document) = tracker(&["a", "b", "c"]);
        tracker.attach().unwrap();

        let batch = vec![
            IntersectionEntry::new(handle(&document, "a"), false, 0.1),
            IntersectionEntry::new(handle(&document, "b"), true, 0.6),
            IntersectionEntry::new(handle(&document, "c"), false, 0.0),
        ];
        assert_eq!(tracker.on_intersection_batch(batch), Some(SectionId::new("b")));
        assert_eq!(tracker.active(), "b");
    }

    #[test]
    fn test_last_intersecting_entry_wins() {
        let (mut tracker, document) = tracker(&["a", "b", "c"]);
        tracker.attach().unwrap();

        tracker.on_intersection_batch(vec![
            IntersectionEntry::new(handle(&document, "a"), true, 0.9),
            IntersectionEntry::new(handle(&document, "c"), true, 0.4),
        ]);
        assert_eq!(tracker.active(), "c");
    }

    #[test]
    fn test_highest_ratio_policy() {
        let registry = registry(&["a", "b", "c"]);
        let document = HeadlessDocument::with_stacked_sections(500.0, registry.ids(), 1000.0);
        let options = ObserverOptions::default().with_tie_break(TieBreak::HighestRatio);
        let mut tracker = VisibilityTracker::new(registry, document.clone(), options);
        tracker.attach().unwrap();

        tracker.on_intersection_batch(vec![
            IntersectionEntry::new(handle(&document, "a"), true, 0.9),
            IntersectionEntry::new(handle(&document, "c"), true, 0.4),
        ]);
        assert_eq!(tracker.active(), "a");
    }

    #[test]
    fn test_batch_without_intersecting_entries_keeps_state() {
        let (mut tracker, document) = tracker(&["a", "b"]);
        tracker.attach().unwrap();
        tracker.navigate_to("b");

        let winner = tracker.on_intersection_batch(vec![IntersectionEntry::new(
            handle(&document, "a"),
            false,
            0.1,
        )]);
        assert_eq!(winner, None);
        assert_eq!(tracker.active(), "b");
    }

    #[test]
    fn test_optimistic_navigation() {
        let (mut tracker, document) = tracker(&["a", "b", "c"]);
        tracker.attach().unwrap();

        tracker.navigate_to("b");
        assert_eq!(tracker.active(), "b");

        let requests = document.scroll_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].section, "b");
        assert_eq!(requests[0].target, handle(&document, "b"));
    }

    #[test]
    fn test_navigate_to_missing_element_only_sets_state() {
        let (mut tracker, document) = tracker(&["a", "b"]);
        tracker.attach().unwrap();

        tracker.navigate_to("nonexistent-id");
        assert_eq!(tracker.active(), "nonexistent-id");
        assert!(document.scroll_requests().is_empty());
    }

    #[test]
    fn test_navigate_before_attach_still_scrolls() {
        let (mut tracker, document) = tracker(&["a", "b"]);
        tracker.navigate_to("b");
        assert_eq!(document.scroll_requests().len(), 1);
    }

    #[test]
    fn test_detach_is_idempotent() {
        let (mut tracker, document) = tracker(&["a", "b", "c"]);
        tracker.attach().unwrap();
        assert_eq!(document.observed_count(), 3);

        tracker.detach();
        assert!(tracker.observed_sections().is_empty());
        assert_eq!(document.observed_count(), 0);
        assert!(!tracker.is_attached());

        tracker.detach();
        assert!(tracker.observed_sections().is_empty());
    }

    #[test]
    fn test_reattach_does_not_duplicate_observations() {
        let registry = registry(&["a", "b"]);
        let document = HeadlessDocument::new(500.0);
        document.append_section("a", 1000.0);

        let mut tracker = VisibilityTracker::new(registry, document.clone(), ObserverOptions::default());
        assert_eq!(tracker.attach().unwrap(), 1);

        // A late-mounted section is only picked up by re-attaching
        document.append_section("b", 1000.0);
        assert_eq!(tracker.observed_sections().len(), 1);
        assert_eq!(tracker.attach().unwrap(), 2);
        assert_eq!(document.observed_count(), 2);
    }

    #[test]
    fn test_drop_detaches() {
        let (mut tracker, document) = tracker(&["a", "b"]);
        tracker.attach().unwrap();
        assert_eq!(document.observed_count(), 2);

        drop(tracker);
        assert_eq!(document.observed_count(), 0);
    }

    #[test]
    fn test_no_leak_across_remounts() {
        let (mut old, document) = tracker(&["a", "b", "c"]);
        old.attach().unwrap();
        let old_b = handle(&document, "b");
        old.detach();

        // The page re-renders: old elements go away, new ones take their place
        document.unmount_section("a");
        document.unmount_section("b");
        document.unmount_section("c");
        document.take_records();
        for id in ["a", "b", "c"] {
            document.append_section(id, 1000.0);
        }

        let mut fresh = VisibilityTracker::new(
            registry(&["a", "b", "c"]),
            document.clone(),
            ObserverOptions::default(),
        );
        fresh.attach().unwrap();
        assert_eq!(document.observed_count(), 3);
        assert!(!document.is_observed(old_b));

        // An entry against the old tracker's element changes nothing
        let winner = old.on_intersection_batch(vec![IntersectionEntry::new(old_b, true, 1.0)]);
        assert_eq!(winner, None);
        assert_eq!(old.active(), "a");

        // Real scrolling only reaches the fresh tracker's observers
        document.take_records();
        let batch = document.scroll_to(900.0);
        assert!(batch.iter().all(|entry| entry.target != old_b));
        assert_eq!(fresh.on_intersection_batch(batch), Some(SectionId::new("b")));
        assert_eq!(old.active(), "a");
    }

    /// Platform wrapper that refuses to observe one section
    struct Refusing {
        inner: HeadlessDocument,
        refuse: SectionId,
    }

    impl Platform for Refusing {
        type Element = ElementHandle;

        fn find_element(&self, id: &SectionId) -> Option<ElementHandle> {
            self.inner.find_element(id)
        }

        fn observe(
            &mut self,
            element: &ElementHandle,
            options: &ObserverOptions,
        ) -> Result<(), PlatformError> {
            if self.inner.find_element(&self.refuse) == Some(*element) {
                return Err(PlatformError::ObserverUnavailable("refused".to_string()));
            }
            self.inner.observe(element, options)
        }

        fn unobserve(&mut self, element: &ElementHandle) {
            self.inner.unobserve(element);
        }

        fn scroll_into_view(&mut self, element: &ElementHandle) {
            self.inner.scroll_into_view(element);
        }
    }

    #[test]
    fn test_failed_attach_releases_partial_bindings() {
        let registry = registry(&["a", "b", "c"]);
        let document = HeadlessDocument::with_stacked_sections(500.0, registry.ids(), 1000.0);
        let platform = Refusing {
            inner: document.clone(),
            refuse: SectionId::new("c"),
        };

        let mut tracker = VisibilityTracker::new(registry, platform, ObserverOptions::default());
        let err = tracker.attach().unwrap_err();

        assert_eq!(err, PlatformError::ObserverUnavailable("refused".to_string()));
        assert!(tracker.observed_sections().is_empty());
        assert!(!tracker.is_attached());
        assert_eq!(document.observed_count(), 0);
    }
}
