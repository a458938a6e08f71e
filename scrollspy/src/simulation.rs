//! Scripted scroll-spy sessions on the headless platform
//!
//! A script is a list of steps (`scroll:1200`, `click:science`,
//! `popover:quran`, `cta`, `settle`) applied to a page whose sections are
//! stacked with a uniform height. Every step records the active section
//! afterwards, which is what `scrollspy simulate` prints.

use crate::page_config::PageConfig;
use crate::platform::headless::HeadlessDocument;
use crate::platform::PlatformError;
use crate::presenter::{NavigationPresenter, ViewKind};
use crate::section_registry::SectionId;
use crate::tracker::VisibilityTracker;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while preparing or running a simulation
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid step '{0}': expected scroll:<y>, click:<id>, popover:<id>, cta or settle")]
    InvalidStep(String),

    #[error("Invalid page configuration: {0}")]
    Config(#[from] crate::page_config::PageConfigError),

    #[error("Failed to attach observers: {0}")]
    Platform(#[from] PlatformError),

    #[error("Page has no call-to-action")]
    NoCallToAction,
}

/// One scripted interaction
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Scroll the viewport to an absolute offset
    Scroll(f64),
    /// Click an entry in the sidebar
    Click(SectionId),
    /// Open the popover and click an entry in it
    Popover(SectionId),
    /// Click the hero call-to-action
    CallToAction,
    /// Let the pending smooth scroll finish
    Settle,
}

impl FromStr for Step {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SimulationError::InvalidStep(s.to_string());
        match s.split_once(':') {
            Some(("scroll", y)) => y.trim().parse().map(Step::Scroll).map_err(|_| invalid()),
            Some(("click", id)) if !id.is_empty() => Ok(Step::Click(SectionId::new(id))),
            Some(("popover", id)) if !id.is_empty() => Ok(Step::Popover(SectionId::new(id))),
            None if s == "cta" => Ok(Step::CallToAction),
            None if s == "settle" => Ok(Step::Settle),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Scroll(y) => write!(f, "scroll:{}", y),
            Step::Click(id) => write!(f, "click:{}", id),
            Step::Popover(id) => write!(f, "popover:{}", id),
            Step::CallToAction => write!(f, "cta"),
            Step::Settle => write!(f, "settle"),
        }
    }
}

/// Page geometry used by the simulator
#[derive(Debug, Clone)]
pub struct Layout {
    pub viewport_height: f64,
    pub section_height: f64,
    /// Sections that are declared but not rendered
    pub missing: Vec<SectionId>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            viewport_height: 800.0,
            section_height: 1200.0,
            missing: Vec::new(),
        }
    }
}

/// Active section after one step
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub step: Step,
    pub scroll_top: f64,
    pub active: SectionId,
    /// Section a smooth scroll was requested for during the step
    pub scroll_requested: Option<SectionId>,
}

/// Result of a simulation run
#[derive(Debug, Clone)]
pub struct Timeline {
    pub initial: SectionId,
    pub observed_sections: usize,
    pub entries: Vec<TimelineEntry>,
}

/// Run `steps` against `page` laid out as described by `layout`
pub fn run(page: &PageConfig, layout: &Layout, steps: &[Step]) -> Result<Timeline, SimulationError> {
    let registry = page.validate()?;

    let document = HeadlessDocument::new(layout.viewport_height);
    for section in &registry {
        if layout.missing.contains(&section.id) {
            log::info!("Section '{}' is not rendered", section.id);
            continue;
        }
        document.append_section(section.id.clone(), layout.section_height);
    }

    let mut tracker = VisibilityTracker::new(registry, document.clone(), page.observer.clone());
    let mut presenter = NavigationPresenter::for_tracker(&tracker)
        .with_call_to_action(page.call_to_action.clone());

    let initial = tracker.active();
    let observed_sections = tracker.attach()?;
    // Observers report their initial state on the first frame
    tracker.on_intersection_batch(document.take_records());

    let mut entries = Vec::with_capacity(steps.len());
    for step in steps {
        let requests_before = document.scroll_requests().len();
        match step {
            Step::Scroll(y) => {
                let batch = document.scroll_to(*y);
                tracker.on_intersection_batch(batch);
            }
            Step::Click(id) => presenter.select(&mut tracker, ViewKind::Sidebar, id.clone()),
            Step::Popover(id) => {
                presenter.toggle_popover();
                presenter.select(&mut tracker, ViewKind::Popover, id.clone());
            }
            Step::CallToAction => {
                if !presenter.activate_call_to_action(&mut tracker) {
                    return Err(SimulationError::NoCallToAction);
                }
            }
            Step::Settle => {
                let batch = document.settle_scroll();
                tracker.on_intersection_batch(batch);
            }
        }

        let requests = document.scroll_requests();
        let scroll_requested = requests
            .get(requests_before..)
            .and_then(|new| new.last())
            .map(|request| request.section.clone());

        entries.push(TimelineEntry {
            step: step.clone(),
            scroll_top: document.scroll_top(),
            active: tracker.active(),
            scroll_requested,
        });
    }

    tracker.detach();

    Ok(Timeline {
        initial,
        observed_sections,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageConfig {
        PageConfig::from_toml(crate::templates::ARTICLE_TEMPLATE).unwrap()
    }

    fn steps(script: &[&str]) -> Vec<Step> {
        script.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_parse_steps() {
        assert_eq!("scroll:250".parse::<Step>().unwrap(), Step::Scroll(250.0));
        assert_eq!(
            "click:science".parse::<Step>().unwrap(),
            Step::Click(SectionId::new("science"))
        );
        assert_eq!("cta".parse::<Step>().unwrap(), Step::CallToAction);
        assert_eq!("settle".parse::<Step>().unwrap(), Step::Settle);
        assert!("scroll:far".parse::<Step>().is_err());
        assert!("click:".parse::<Step>().is_err());
        assert!("jump".parse::<Step>().is_err());
    }

    #[test]
    fn test_step_display_roundtrips() {
        for text in ["scroll:1200", "click:quran", "popover:intro", "cta", "settle"] {
            assert_eq!(text.parse::<Step>().unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_scroll_then_click_timeline() {
        let layout = Layout::default();
        let timeline = run(
            &page(),
            &layout,
            &steps(&["scroll:1000", "click:reflection", "settle"]),
        )
        .unwrap();

        assert_eq!(timeline.initial, "intro");
        assert_eq!(timeline.observed_sections, 4);

        let active: Vec<&str> = timeline.entries.iter().map(|e| e.active.as_str()).collect();
        assert_eq!(active, vec!["science", "reflection", "reflection"]);
        assert_eq!(
            timeline.entries[1].scroll_requested,
            Some(SectionId::new("reflection"))
        );
        assert_eq!(timeline.entries[2].scroll_top, 3600.0);
    }

    #[test]
    fn test_missing_section_is_skipped() {
        let layout = Layout {
            missing: vec![SectionId::new("quran")],
            ..Layout::default()
        };
        let timeline = run(&page(), &layout, &steps(&["click:quran"])).unwrap();

        assert_eq!(timeline.observed_sections, 3);
        assert_eq!(timeline.entries[0].active, "quran");
        assert_eq!(timeline.entries[0].scroll_requested, None);
    }

    #[test]
    fn test_root_margin_is_applied() {
        let mut page = page();
        // Only the top 40% of the viewport counts as visible
        page.observer.root_margin = "0px 0px -60% 0px".to_string();

        let timeline = run(&page, &Layout::default(), &steps(&["scroll:1000"])).unwrap();
        assert_eq!(timeline.entries[0].active, "intro");
    }

    #[test]
    fn test_call_to_action_step() {
        let timeline = run(&page(), &Layout::default(), &steps(&["cta"])).unwrap();
        assert_eq!(timeline.entries[0].active, "reflection");
    }
}
