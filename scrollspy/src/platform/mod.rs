//! Platform bindings used by the visibility tracker
//!
//! A [`Platform`] supplies the three primitives the scroll-spy needs from its
//! host: looking up the element rendered for a section, observing elements
//! for visibility changes, and smooth-scrolling an element into view.
//!
//! - [`headless::HeadlessDocument`]: in-memory page with element geometry,
//!   used by the simulator and the tests
//! - `web::WebPlatform` (wasm32 only): the browser's `IntersectionObserver`
//!   and `scrollIntoView`

mod error;
pub mod headless;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::PlatformError;

use crate::observer::ObserverOptions;
use crate::section_registry::SectionId;
use std::fmt;

/// Host primitives consumed by [`crate::tracker::VisibilityTracker`]
///
/// Intersection changes are not pulled through this trait: the host delivers
/// them to [`crate::tracker::VisibilityTracker::on_intersection_batch`] from
/// its own callback.
pub trait Platform {
    /// Handle to a rendered section element
    type Element: Clone + PartialEq + fmt::Debug;

    /// Find the element bearing `id`, if it is rendered
    fn find_element(&self, id: &SectionId) -> Option<Self::Element>;

    /// Start observing `element`; observing an already observed element is a no-op
    fn observe(
        &mut self,
        element: &Self::Element,
        options: &ObserverOptions,
    ) -> Result<(), PlatformError>;

    /// Stop observing `element` and drop any of its undelivered entries
    fn unobserve(&mut self, element: &Self::Element);

    /// Release the observer once nothing is observed any more
    fn disconnect(&mut self) {}

    /// Request a smooth scroll bringing `element` into view (fire and forget)
    fn scroll_into_view(&mut self, element: &Self::Element);
}
