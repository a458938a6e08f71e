//! Intersection observation options, entries and the batch selection policy

use crate::section_registry::SectionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fraction of a section's area that must be inside the viewport
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.3;

/// Root margin applied to the viewport (none)
pub const DEFAULT_ROOT_MARGIN: &str = "0px";

/// How a batch with several intersecting sections picks the active one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// The last intersecting entry in delivery order wins
    #[default]
    LastIntersecting,
    /// The entry with the greatest intersection ratio wins; equal ratios
    /// fall back to delivery order
    HighestRatio,
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastIntersecting => write!(f, "last-intersecting"),
            Self::HighestRatio => write!(f, "highest-ratio"),
        }
    }
}

/// Options applied uniformly to every observed section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverOptions {
    /// Visibility threshold in `[0, 1]`
    pub threshold: f64,
    /// CSS-style margin around the viewport
    pub root_margin: String,
    /// Batch selection policy
    pub tie_break: TieBreak,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_VISIBILITY_THRESHOLD,
            root_margin: DEFAULT_ROOT_MARGIN.to_string(),
            tie_break: TieBreak::default(),
        }
    }
}

impl ObserverOptions {
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn is_valid_threshold(&self) -> bool {
        (0.0..=1.0).contains(&self.threshold)
    }

    /// Parse [`ObserverOptions::root_margin`]
    pub fn parsed_root_margin(&self) -> Option<RootMargin> {
        RootMargin::parse(&self.root_margin)
    }
}

/// One side of a root margin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginLength {
    Px(f64),
    /// Percentage of the viewport height
    Percent(f64),
}

impl MarginLength {
    fn parse(token: &str) -> Option<Self> {
        let length = if let Some(px) = token.strip_suffix("px") {
            MarginLength::Px(px.parse().ok()?)
        } else if let Some(percent) = token.strip_suffix('%') {
            MarginLength::Percent(percent.parse().ok()?)
        } else if token.parse::<f64>().ok()? == 0.0 {
            // A bare zero is the only unitless length
            MarginLength::Px(0.0)
        } else {
            return None;
        };
        match length {
            MarginLength::Px(v) | MarginLength::Percent(v) if v.is_finite() => Some(length),
            _ => None,
        }
    }

    /// Length in pixels for a viewport of `viewport_height`
    pub fn resolve(self, viewport_height: f64) -> f64 {
        match self {
            MarginLength::Px(px) => px,
            MarginLength::Percent(percent) => viewport_height * percent / 100.0,
        }
    }
}

/// Vertical part of a CSS `rootMargin` (`"10px"`, `"-20% 0px"`, `"0px 0px -40% 0px"`)
///
/// Positive values grow the viewport used for intersection, negative values
/// shrink it. Horizontal sides are accepted but have no effect on a
/// vertically scrolling page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: MarginLength,
    pub bottom: MarginLength,
}

impl RootMargin {
    /// Parse the one to four value CSS shorthand
    pub fn parse(text: &str) -> Option<Self> {
        let sides = text
            .split_whitespace()
            .map(MarginLength::parse)
            .collect::<Option<Vec<_>>>()?;
        let (top, bottom) = match sides.as_slice() {
            [all] => (*all, *all),
            [vertical, _] => (*vertical, *vertical),
            [top, _, bottom] | [top, _, bottom, _] => (*top, *bottom),
            _ => return None,
        };
        Some(Self { top, bottom })
    }

    /// `(top, bottom)` in pixels
    pub fn resolve(&self, viewport_height: f64) -> (f64, f64) {
        (
            self.top.resolve(viewport_height),
            self.bottom.resolve(viewport_height),
        )
    }
}

/// A single visibility change reported by the platform
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry<E> {
    /// The observed element
    pub target: E,
    /// Whether the element satisfies the visibility threshold
    pub is_intersecting: bool,
    /// Visible fraction of the element's area
    pub intersection_ratio: f64,
}

impl<E> IntersectionEntry<E> {
    pub fn new(target: E, is_intersecting: bool, intersection_ratio: f64) -> Self {
        Self {
            target,
            is_intersecting,
            intersection_ratio,
        }
    }
}

/// Pick the winning section among the intersecting candidates of one batch
///
/// `candidates` must be in delivery order; it is never reordered.
pub fn select_active<I>(candidates: I, tie_break: TieBreak) -> Option<SectionId>
where
    I: IntoIterator<Item = (SectionId, f64)>,
{
    let mut candidates = candidates.into_iter();
    match tie_break {
        TieBreak::LastIntersecting => candidates.last().map(|(id, _)| id),
        // max_by keeps the last of several equal maxima
        TieBreak::HighestRatio => candidates
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(id, _)| id),
    }
}
