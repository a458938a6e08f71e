//! scrollspy - keeps a page's navigation in sync with the section being read
//!
//! A [`tracker::VisibilityTracker`] observes every registered section through
//! a [`platform::Platform`], picks the active section from intersection
//! batches and serves it to any number of navigation views. Clicking a view
//! entry makes that section active immediately and asks the platform for a
//! smooth scroll.

#![cfg_attr(not(target_arch = "wasm32"), deny(unsafe_code))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod active_section;
pub mod html_exporter;
pub mod observer;
pub mod page_config;
pub mod platform;
pub mod presenter;
pub mod section_registry;
pub mod simulation;
pub mod templates;
pub mod tracker;

pub use active_section::{ActiveSection, ActiveSectionHandle, ChangeSource};
pub use observer::{IntersectionEntry, ObserverOptions, TieBreak};
pub use section_registry::{SectionDescriptor, SectionId, SectionRegistry};
pub use tracker::VisibilityTracker;
