//! Ordered, immutable list of the sections a page navigates between

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Identifier of a content section (matches the element id in the page)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    /// Create a section id from any string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SectionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for SectionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SectionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Reference to a renderable icon symbol (e.g. "book-open")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Icon(String);

impl Icon {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// One navigable section of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDescriptor {
    /// Unique, stable id shared with the rendered section element
    pub id: SectionId,
    /// Label shown in the navigation lists
    pub label: String,
    /// Icon shown next to the label
    pub icon: Icon,
}

impl SectionDescriptor {
    pub fn new(id: impl Into<SectionId>, label: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: Icon::new(icon),
        }
    }
}

/// Errors that can occur when building a section registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No sections were supplied
    #[error("A page must declare at least one section")]
    Empty,

    /// A section has an empty id
    #[error("Section at position {index} has an empty id")]
    EmptyId {
        /// Position of the offending section
        index: usize,
    },

    /// Two sections share the same id
    #[error("Duplicate section id '{id}' at positions {first} and {second}")]
    DuplicateId {
        /// The repeated id
        id: SectionId,
        /// Position of the first occurrence
        first: usize,
        /// Position of the repeated occurrence
        second: usize,
    },
}

/// The ordered sequence of sections of one page
///
/// Cloning is cheap: clones share the same immutable storage, so the
/// tracker and every navigation view can hold their own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRegistry {
    sections: Arc<[SectionDescriptor]>,
}

impl SectionRegistry {
    /// Build a registry, checking that ids are non-empty and pairwise distinct
    pub fn new(sections: Vec<SectionDescriptor>) -> Result<Self, RegistryError> {
        if sections.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(sections.len());
        for (index, section) in sections.iter().enumerate() {
            if section.id.as_str().is_empty() {
                return Err(RegistryError::EmptyId { index });
            }
            if let Some(&first) = seen.get(section.id.as_str()) {
                return Err(RegistryError::DuplicateId {
                    id: section.id.clone(),
                    first,
                    second: index,
                });
            }
            seen.insert(section.id.as_str(), index);
        }

        Ok(Self {
            sections: sections.into(),
        })
    }

    /// The first section; its id is the initial active section
    pub fn first(&self) -> &SectionDescriptor {
        // Construction rejects empty registries
        &self.sections[0]
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SectionDescriptor> {
        self.sections.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &SectionId> {
        self.sections.iter().map(|s| &s.id)
    }

    pub fn get(&self, id: &str) -> Option<&SectionDescriptor> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Position of a section in navigation order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }
}

impl<'a> IntoIterator for &'a SectionRegistry {
    type Item = &'a SectionDescriptor;
    type IntoIter = std::slice::Iter<'a, SectionDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<SectionDescriptor> {
        vec![
            SectionDescriptor::new("intro", "Introduction", "book-open"),
            SectionDescriptor::new("science", "The Science", "flask"),
            SectionDescriptor::new("quran", "In the Quran", "scroll"),
            SectionDescriptor::new("reflection", "Reflection", "heart"),
        ]
    }

    #[test]
    fn test_registry_preserves_order() {
        let registry = SectionRegistry::new(sample()).unwrap();
        let ids: Vec<&str> = registry.ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "science", "quran", "reflection"]);
        assert_eq!(registry.first().id, "intro");
        assert_eq!(registry.position("quran"), Some(2));
        assert!(registry.contains("reflection"));
        assert!(!registry.contains("appendix"));
    }

    #[test]
    fn test_registry_rejects_duplicate_ids() {
        let mut sections = sample();
        sections.push(SectionDescriptor::new("science", "Again", "flask"));

        let err = SectionRegistry::new(sections).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateId {
                id: SectionId::new("science"),
                first: 1,
                second: 4,
            }
        );
    }

    #[test]
    fn test_registry_rejects_empty_input() {
        assert_eq!(SectionRegistry::new(Vec::new()), Err(RegistryError::Empty));

        let err = SectionRegistry::new(vec![SectionDescriptor::new("", "Blank", "x")]).unwrap_err();
        assert_eq!(err, RegistryError::EmptyId { index: 0 });
    }

    #[test]
    fn test_clones_share_storage() {
        let registry = SectionRegistry::new(sample()).unwrap();
        let clone = registry.clone();
        assert!(Arc::ptr_eq(&registry.sections, &clone.sections));
    }

    #[test]
    fn test_error_messages() {
        let err = RegistryError::DuplicateId {
            id: SectionId::new("intro"),
            first: 0,
            second: 2,
        };
        assert_eq!(
            err.to_string(),
            "Duplicate section id 'intro' at positions 0 and 2"
        );
    }
}
