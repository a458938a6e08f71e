//! Navigation presenter: sidebar and popover views over one active section
//!
//! Both views read the tracker's [`ActiveSectionHandle`]; neither keeps a
//! copy of the active id. User selections go back through
//! [`VisibilityTracker::navigate_to`], which is the only writer.

use crate::active_section::ActiveSectionHandle;
use crate::html_exporter::escape_html;
use crate::page_config::CallToAction;
use crate::platform::Platform;
use crate::section_registry::{SectionId, SectionRegistry};
use crate::tracker::VisibilityTracker;
use std::fmt;

/// Which rendering of the navigation list an interaction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Persistent desktop sidebar
    Sidebar,
    /// On-demand mobile popover
    Popover,
    /// Hero header shortcut
    Header,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sidebar => write!(f, "sidebar"),
            Self::Popover => write!(f, "popover"),
            Self::Header => write!(f, "header"),
        }
    }
}

/// One row of a navigation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub id: SectionId,
    pub label: String,
    pub icon: String,
    pub active: bool,
}

/// A rendering of the navigation list
pub trait NavView {
    fn kind(&self) -> ViewKind;

    /// Render the list as an HTML fragment
    fn render(&self, entries: &[NavEntry]) -> String;

    /// Called after the user picked an entry in this view
    fn on_selected(&mut self, _id: &SectionId) {}
}

/// Persistent sidebar table of contents
#[derive(Debug, Default)]
pub struct SidebarView;

impl NavView for SidebarView {
    fn kind(&self) -> ViewKind {
        ViewKind::Sidebar
    }

    fn render(&self, entries: &[NavEntry]) -> String {
        let mut output = String::new();
        output.push_str("<nav class=\"sidebar-nav\" aria-label=\"Sections\">\n<ul>\n");
        write_entries(&mut output, entries);
        output.push_str("</ul>\n</nav>\n");
        output
    }
}

/// Mobile popover listing the same entries; closes after a selection
#[derive(Debug, Default)]
pub struct PopoverView {
    open: bool,
}

impl PopoverView {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }
}

impl NavView for PopoverView {
    fn kind(&self) -> ViewKind {
        ViewKind::Popover
    }

    fn render(&self, entries: &[NavEntry]) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "<button class=\"popover-toggle\" data-popover-toggle aria-expanded=\"{}\">Sections</button>\n",
            self.open
        ));
        let class = if self.open {
            "popover-nav open"
        } else {
            "popover-nav"
        };
        output.push_str(&format!(
            "<nav class=\"{}\" data-nav-popover aria-label=\"Sections\">\n<ul>\n",
            class
        ));
        write_entries(&mut output, entries);
        output.push_str("</ul>\n</nav>\n");
        output
    }

    fn on_selected(&mut self, _id: &SectionId) {
        self.close();
    }
}

/// Write `<li>` rows shared by both views
fn write_entries(output: &mut String, entries: &[NavEntry]) {
    for entry in entries {
        let (class, current) = if entry.active {
            ("nav-link active", " aria-current=\"true\"")
        } else {
            ("nav-link", "")
        };
        output.push_str(&format!(
            "<li><a href=\"#{id}\" class=\"{class}\" data-section-link=\"{id}\"{current}>\
             <span class=\"nav-icon\" data-icon=\"{icon}\" aria-hidden=\"true\"></span>{label}</a></li>\n",
            id = escape_html(entry.id.as_str()),
            class = class,
            current = current,
            icon = escape_html(&entry.icon),
            label = escape_html(&entry.label),
        ));
    }
}

/// Both navigation views plus the optional header shortcut
pub struct NavigationPresenter {
    registry: SectionRegistry,
    active: ActiveSectionHandle,
    sidebar: SidebarView,
    popover: PopoverView,
    call_to_action: Option<CallToAction>,
}

impl NavigationPresenter {
    pub fn new(registry: SectionRegistry, active: ActiveSectionHandle) -> Self {
        Self {
            registry,
            active,
            sidebar: SidebarView,
            popover: PopoverView::default(),
            call_to_action: None,
        }
    }

    /// Presenter wired to a tracker's registry and state
    pub fn for_tracker<P: Platform>(tracker: &VisibilityTracker<P>) -> Self {
        Self::new(tracker.registry().clone(), tracker.active_handle())
    }

    pub fn with_call_to_action(mut self, call_to_action: Option<CallToAction>) -> Self {
        self.call_to_action = call_to_action;
        self
    }

    /// Entries in registry order, with the active one flagged
    pub fn entries(&self) -> Vec<NavEntry> {
        self.registry
            .iter()
            .map(|section| NavEntry {
                id: section.id.clone(),
                label: section.label.clone(),
                icon: section.icon.name().to_string(),
                active: self.active.is_active(section.id.as_str()),
            })
            .collect()
    }

    /// Id of the highlighted entry, if the active section is registered
    pub fn highlighted(&self) -> Option<SectionId> {
        let active = self.active.get();
        self.registry.contains(active.as_str()).then_some(active)
    }

    pub fn render_sidebar(&self) -> String {
        self.sidebar.render(&self.entries())
    }

    pub fn render_popover(&self) -> String {
        self.popover.render(&self.entries())
    }

    pub fn popover(&self) -> &PopoverView {
        &self.popover
    }

    pub fn toggle_popover(&mut self) {
        self.popover.toggle();
    }

    pub fn call_to_action(&self) -> Option<&CallToAction> {
        self.call_to_action.as_ref()
    }

    /// Handle a click on a navigation entry
    pub fn select<P: Platform>(
        &mut self,
        tracker: &mut VisibilityTracker<P>,
        origin: ViewKind,
        id: impl Into<SectionId>,
    ) {
        let id = id.into();
        log::debug!("Navigation to '{}' from {}", id, origin);
        match origin {
            ViewKind::Sidebar => self.sidebar.on_selected(&id),
            ViewKind::Popover => self.popover.on_selected(&id),
            ViewKind::Header => {}
        }
        tracker.navigate_to(id);
    }

    /// Handle a click on the header shortcut; returns `false` if none is configured
    pub fn activate_call_to_action<P: Platform>(
        &mut self,
        tracker: &mut VisibilityTracker<P>,
    ) -> bool {
        let Some(target) = self.call_to_action.as_ref().map(|cta| cta.target.clone()) else {
            return false;
        };
        self.select(tracker, ViewKind::Header, target);
        true
    }
}
