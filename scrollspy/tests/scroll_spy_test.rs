use scrollspy::observer::{ObserverOptions, TieBreak};
use scrollspy::platform::headless::HeadlessDocument;
use scrollspy::platform::Platform;
use scrollspy::presenter::{NavigationPresenter, ViewKind};
use scrollspy::section_registry::{SectionDescriptor, SectionId, SectionRegistry};
use scrollspy::{ChangeSource, VisibilityTracker};
use std::cell::RefCell;
use std::rc::Rc;

const VIEWPORT: f64 = 600.0;
const SECTION_HEIGHT: f64 = 1000.0;

fn fasting_registry() -> SectionRegistry {
    SectionRegistry::new(vec![
        SectionDescriptor::new("intro", "Introduction", "book-open"),
        SectionDescriptor::new("science", "The Science", "flask"),
        SectionDescriptor::new("quran", "In the Quran", "scroll"),
        SectionDescriptor::new("reflection", "Reflection", "heart"),
    ])
    .unwrap()
}

fn mounted_page() -> (VisibilityTracker<HeadlessDocument>, HeadlessDocument) {
    let registry = fasting_registry();
    let document = HeadlessDocument::with_stacked_sections(VIEWPORT, registry.ids(), SECTION_HEIGHT);
    let tracker = VisibilityTracker::new(registry, document.clone(), ObserverOptions::default());
    (tracker, document)
}

#[test]
fn test_reading_then_jumping_ahead() {
    let (mut tracker, document) = mounted_page();
    assert_eq!(tracker.active(), "intro");

    assert_eq!(tracker.attach().unwrap(), 4);
    tracker.on_intersection_batch(document.take_records());
    assert_eq!(tracker.active(), "intro");

    // Half of "science" is now in view, "intro" dropped under the threshold
    tracker.on_intersection_batch(document.scroll_to(900.0));
    assert_eq!(tracker.active(), "science");

    let mut presenter = NavigationPresenter::for_tracker(&tracker);
    presenter.select(&mut tracker, ViewKind::Sidebar, "reflection");
    assert_eq!(tracker.active(), "reflection");

    let requests = document.scroll_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].section, "reflection");
    assert_eq!(
        Some(requests[0].target),
        document.find_element(&SectionId::new("reflection"))
    );

    tracker.on_intersection_batch(document.settle_scroll());
    assert_eq!(document.scroll_top(), 3.0 * SECTION_HEIGHT);
    assert_eq!(tracker.active(), "reflection");
    assert!(presenter.render_sidebar().contains("data-section-link=\"reflection\" aria-current=\"true\""));
}

#[test]
fn test_remounting_does_not_accumulate_observers() {
    let registry = fasting_registry();
    let document = HeadlessDocument::with_stacked_sections(VIEWPORT, registry.ids(), SECTION_HEIGHT);

    for _ in 0..3 {
        let mut tracker =
            VisibilityTracker::new(registry.clone(), document.clone(), ObserverOptions::default());
        tracker.attach().unwrap();
        assert_eq!(document.observed_count(), 4);
    }

    assert_eq!(document.observed_count(), 0);
}

#[test]
fn test_unrendered_section_is_still_navigable() {
    let registry = fasting_registry();
    let document = HeadlessDocument::with_stacked_sections(VIEWPORT, registry.ids(), SECTION_HEIGHT);
    assert_eq!(document.unmount_section("quran"), 1);

    let mut tracker = VisibilityTracker::new(registry, document.clone(), ObserverOptions::default());
    assert_eq!(tracker.attach().unwrap(), 3);

    tracker.navigate_to("quran");
    assert_eq!(tracker.active(), "quran");
    assert!(document.scroll_requests().is_empty());
}

#[test]
fn test_subscribers_see_each_change_once() {
    let (mut tracker, document) = mounted_page();
    tracker.attach().unwrap();
    tracker.on_intersection_batch(document.take_records());

    let seen: Rc<RefCell<Vec<(SectionId, ChangeSource)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    tracker
        .active_handle()
        .subscribe(move |id, source| sink.borrow_mut().push((id.clone(), source)));

    tracker.on_intersection_batch(document.scroll_to(900.0));
    tracker.navigate_to("science");
    tracker.navigate_to("quran");
    tracker.on_intersection_batch(document.settle_scroll());

    assert_eq!(
        *seen.borrow(),
        vec![
            (SectionId::new("science"), ChangeSource::Observed),
            (SectionId::new("quran"), ChangeSource::Navigated),
        ]
    );
}

fn two_sections_in_view(options: ObserverOptions) -> VisibilityTracker<HeadlessDocument> {
    let registry = fasting_registry();
    // A tall viewport shows intro (1.0) and science (0.5) above the threshold at once
    let document = HeadlessDocument::with_stacked_sections(1500.0, registry.ids(), SECTION_HEIGHT);
    let mut tracker = VisibilityTracker::new(registry, document.clone(), options);
    tracker.attach().unwrap();
    tracker.on_intersection_batch(document.take_records());
    tracker
}

#[test]
fn test_highest_ratio_prefers_the_dominant_section() {
    let options = ObserverOptions::default().with_tie_break(TieBreak::HighestRatio);
    let tracker = two_sections_in_view(options);
    assert_eq!(tracker.active(), "intro");
}

#[test]
fn test_last_intersecting_prefers_the_later_section() {
    let tracker = two_sections_in_view(ObserverOptions::default());
    assert_eq!(tracker.active(), "science");
}
