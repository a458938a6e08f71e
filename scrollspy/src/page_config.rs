//! Page configuration from page.toml

use crate::observer::ObserverOptions;
use crate::section_registry::{RegistryError, SectionDescriptor, SectionId, SectionRegistry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the configuration file inside a page directory
pub const PAGE_CONFIG_FILE: &str = "page.toml";

/// Main page configuration from page.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Unique identifier for the page
    pub page_id: String,

    /// Title shown in the hero header
    pub title: String,

    /// Optional line under the title
    pub subtitle: Option<String>,

    /// Optional footer text
    pub footer: Option<String>,

    /// Observation settings shared by every section
    #[serde(default)]
    pub observer: ObserverOptions,

    /// Optional hero button jumping to a section
    pub call_to_action: Option<CallToAction>,

    /// Sections in navigation order
    pub sections: Vec<SectionConfig>,
}

/// One `[[sections]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Element id of the section card
    pub id: String,

    /// Navigation label
    pub label: String,

    /// Icon name
    pub icon: String,

    /// Optional teaser text for the section card
    pub summary: Option<String>,
}

/// Header shortcut jumping to a named section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToAction {
    /// Button label
    pub label: String,

    /// Section to navigate to
    pub target: SectionId,
}

impl PageConfig {
    /// Load configuration from a page.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the page.toml configuration file
    ///
    /// # Returns
    /// * `Ok(PageConfig)` - Successfully loaded configuration
    /// * `Err(PageConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PageConfigError> {
        let content = fs::read_to_string(&path).map_err(PageConfigError::IoError)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, PageConfigError> {
        toml::from_str(content).map_err(PageConfigError::ParseError)
    }

    /// Save configuration to a page.toml file
    ///
    /// # Parameters
    /// * `path` - Path where the page.toml file will be written
    ///
    /// # Returns
    /// * `Ok(())` - Successfully saved configuration
    /// * `Err(PageConfigError)` - Error serializing or writing the configuration file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PageConfigError> {
        let content = toml::to_string_pretty(self).map_err(PageConfigError::SerializeError)?;

        fs::write(&path, content).map_err(PageConfigError::IoError)?;

        Ok(())
    }

    /// Build the section registry declared by this page
    pub fn registry(&self) -> Result<SectionRegistry, RegistryError> {
        SectionRegistry::new(
            self.sections
                .iter()
                .map(|s| SectionDescriptor::new(s.id.as_str(), s.label.as_str(), s.icon.as_str()))
                .collect(),
        )
    }

    /// Check the whole configuration and return its registry
    pub fn validate(&self) -> Result<SectionRegistry, PageConfigError> {
        let registry = self.registry().map_err(PageConfigError::RegistryError)?;

        if !self.observer.is_valid_threshold() {
            return Err(PageConfigError::InvalidThreshold(self.observer.threshold));
        }

        if self.observer.parsed_root_margin().is_none() {
            return Err(PageConfigError::InvalidRootMargin(
                self.observer.root_margin.clone(),
            ));
        }

        if let Some(ref cta) = self.call_to_action {
            if !registry.contains(cta.target.as_str()) {
                return Err(PageConfigError::UnknownTarget(cta.target.clone()));
            }
        }

        Ok(registry)
    }

    /// Card text for a section, if configured
    pub fn summary(&self, id: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.id == id)
            .and_then(|s| s.summary.as_deref())
    }
}

/// Errors that can occur when loading, saving or validating page configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum PageConfigError {
    /// IO error when reading or writing file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),

    /// Error serializing to TOML
    SerializeError(toml::ser::Error),

    /// Section list violates the registry invariants
    RegistryError(RegistryError),

    /// Observer threshold outside [0, 1]
    InvalidThreshold(f64),

    /// Root margin is not one to four px or % lengths
    InvalidRootMargin(String),

    /// Call-to-action points at a section that is not declared
    UnknownTarget(SectionId),
}

impl std::fmt::Display for PageConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageConfigError::IoError(e) => write!(f, "IO error: {}", e),
            PageConfigError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            PageConfigError::SerializeError(e) => write!(f, "TOML serialize error: {}", e),
            PageConfigError::RegistryError(e) => write!(f, "Invalid sections: {}", e),
            PageConfigError::InvalidThreshold(t) => {
                write!(f, "Observer threshold {} must be between 0 and 1", t)
            }
            PageConfigError::InvalidRootMargin(margin) => {
                write!(f, "Observer root margin '{}' must be px or % lengths", margin)
            }
            PageConfigError::UnknownTarget(id) => {
                write!(f, "Call-to-action target '{}' is not a declared section", id)
            }
        }
    }
}

impl std::error::Error for PageConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::TieBreak;

    const FASTING_PAGE: &str = r#"
page_id = "fasting"
title = "The Science of Fasting"
subtitle = "What happens to the body and the mind"

[observer]
threshold = 0.3
tie_break = "highest-ratio"

[call_to_action]
label = "Start reflecting"
target = "reflection"

[[sections]]
id = "intro"
label = "Introduction"
icon = "book-open"

[[sections]]
id = "science"
label = "The Science"
icon = "flask"
summary = "Autophagy, insulin and the fasting clock."

[[sections]]
id = "quran"
label = "In the Quran"
icon = "scroll"

[[sections]]
id = "reflection"
label = "Reflection"
icon = "heart"
"#;

    #[test]
    fn test_parse_example_toml() {
        let config = PageConfig::from_toml(FASTING_PAGE).unwrap();

        assert_eq!(config.page_id, "fasting");
        assert_eq!(config.sections.len(), 4);
        assert_eq!(config.observer.tie_break, TieBreak::HighestRatio);
        assert_eq!(config.observer.root_margin, "0px");
        assert_eq!(config.summary("science"), Some("Autophagy, insulin and the fasting clock."));
        assert_eq!(config.summary("intro"), None);

        let registry = config.validate().unwrap();
        assert_eq!(registry.first().id, "intro");
        assert_eq!(registry.get("quran").unwrap().icon.name(), "scroll");
    }

    #[test]
    fn test_observer_section_is_optional() {
        let config = PageConfig::from_toml(
            r#"
page_id = "p"
title = "P"

[[sections]]
id = "only"
label = "Only"
icon = "dot"
"#,
        )
        .unwrap();
        assert_eq!(config.observer, ObserverOptions::default());
        assert!(config.call_to_action.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut config = PageConfig::from_toml(FASTING_PAGE).unwrap();
        config.sections[2].id = "science".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            PageConfigError::RegistryError(RegistryError::DuplicateId { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_cta_target() {
        let mut config = PageConfig::from_toml(FASTING_PAGE).unwrap();
        config.call_to_action.as_mut().unwrap().target = SectionId::new("appendix");

        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Call-to-action target 'appendix' is not a declared section"
        );
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = PageConfig::from_toml(FASTING_PAGE).unwrap();
        config.observer.threshold = -0.1;
        assert!(matches!(
            config.validate(),
            Err(PageConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_validate_root_margin() {
        let mut config = PageConfig::from_toml(FASTING_PAGE).unwrap();
        config.observer.root_margin = "-20% 0px".to_string();
        assert!(config.validate().is_ok());

        config.observer.root_margin = "1rem".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Observer root margin '1rem' must be px or % lengths"
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let config = PageConfig::from_toml(FASTING_PAGE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PAGE_CONFIG_FILE);

        config.save(&path).unwrap();
        let loaded = PageConfig::load(&path).unwrap();

        assert_eq!(loaded.title, config.title);
        assert_eq!(loaded.observer, config.observer);
        assert_eq!(loaded.call_to_action.unwrap().target, "reflection");
        let ids: Vec<String> = loaded.sections.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["intro", "science", "quran", "reflection"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PageConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, PageConfigError::IoError(_)));
    }
}
