//! Error types for platform bindings

use thiserror::Error;

/// Errors a platform can report while binding observations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    /// The platform could not create its intersection observer
    #[error("Intersection observer unavailable: {0}")]
    ObserverUnavailable(String),

    /// The element to observe is no longer part of the document
    #[error("Element for section '{0}' is not attached to the document")]
    DetachedElement(String),

    /// The observer rejected the configured threshold
    #[error("Visibility threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),

    /// The root margin is not a CSS margin in px or %
    #[error("Invalid root margin '{0}'")]
    InvalidRootMargin(String),
}
