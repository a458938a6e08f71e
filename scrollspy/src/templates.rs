//! Embedded page templates
//!
//! This module contains all built-in page templates compiled into the binary.

use crate::page_config::PageConfig;
use crate::page_config::PageConfigError;
use std::collections::HashMap;

/// Long-form article with four sections and a call-to-action
pub const ARTICLE_TEMPLATE: &str = include_str!("templates/article.toml");

/// Two sections, no hero button
pub const MINIMAL_TEMPLATE: &str = include_str!("templates/minimal.toml");

/// Template metadata for display and lookup
#[derive(Debug, Clone)]
pub struct TemplateInfo {
    /// Template identifier (e.g., "article-v1")
    pub id: String,
    /// Short name accepted as an alias (e.g., "article")
    pub kind: String,
    /// One-line description for `list-templates`
    pub description: String,
    /// Template TOML content
    pub content: &'static str,
}

/// Get all available templates
pub fn get_all_templates() -> Vec<TemplateInfo> {
    vec![
        TemplateInfo {
            id: "article-v1".to_string(),
            kind: "article".to_string(),
            description: "Long-form article with hero button and four sections".to_string(),
            content: ARTICLE_TEMPLATE,
        },
        TemplateInfo {
            id: "minimal-v1".to_string(),
            kind: "minimal".to_string(),
            description: "Two sections and default observer settings".to_string(),
            content: MINIMAL_TEMPLATE,
        },
    ]
}

/// Get a template by ID or alias
///
/// # Parameters
/// * `id` - Template identifier or its short kind, case-insensitive for the kind
///
/// # Returns
/// * `Some(TemplateInfo)` - Template information if found
/// * `None` - No template found matching the given identifier
pub fn get_template(id: &str) -> Option<TemplateInfo> {
    let mut lookup: HashMap<String, TemplateInfo> = HashMap::new();

    for template in get_all_templates() {
        lookup.insert(template.id.clone(), template.clone());
        lookup.insert(template.kind.clone(), template.clone());
        lookup.insert(template.kind.to_uppercase(), template);
    }

    lookup.get(id).cloned()
}

/// Parse a template into a page configuration
pub fn parse_template(template_info: &TemplateInfo) -> Result<PageConfig, PageConfigError> {
    PageConfig::from_toml(template_info.content)
}
