//! Requirement Extraction
//!
//! Turns the plain text of a product-requirements document into application
//! metadata plus an ordered list of categorized, prioritized requirements.
//! Extraction is deterministic and never fails: every heuristic has a fallback.

pub mod rules;
pub mod sections;
pub mod tech;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::models::{
    AppMetadata, Requirement, RequirementCategory, RequirementPriority, DEFAULT_APP_DESCRIPTION,
    DEFAULT_APP_NAME,
};

use self::rules::{
    first_match, name_from_heading, CATEGORY_RULES, DESCRIPTION_RULES, NAME_RULES,
    PRIORITY_RULES, REQUIREMENT_SIGNAL,
};
use self::sections::split_sections;
use self::tech::infer_technologies;

/// Sections shorter than this are never requirements
pub const MIN_SECTION_LEN: usize = 10;

/// Output of one extraction pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub name: String,
    pub description: String,
    pub technology_set: Vec<String>,
    pub requirements: Vec<Requirement>,
}

impl AnalysisResult {
    pub fn metadata(&self) -> AppMetadata {
        AppMetadata {
            name: self.name.clone(),
            description: self.description.clone(),
            technology_set: self.technology_set.clone(),
        }
    }
}

/// Requirement extractor carrying the configured placeholder values
#[derive(Debug, Clone)]
pub struct Extractor {
    default_name: String,
    default_description: String,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_APP_NAME.to_string(),
            default_description: DEFAULT_APP_DESCRIPTION.to_string(),
        }
    }
}

impl Extractor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            default_name: config.default_app_name.clone(),
            default_description: config.default_app_description.clone(),
        }
    }

    /// Runs the full extraction over `text`
    pub fn extract(&self, text: &str) -> AnalysisResult {
        let name = self.infer_name(text);
        let description = self.infer_description(text);
        let technology_set = infer_technologies(text);
        let requirements = extract_requirements(text);

        info!(
            name = %name,
            requirements = requirements.len(),
            technologies = technology_set.len(),
            "extracted requirements from document"
        );

        AnalysisResult {
            name,
            description,
            technology_set,
            requirements,
        }
    }

    /// Labeled field first, then the heading heuristic, then the placeholder
    pub fn infer_name(&self, text: &str) -> String {
        first_match(&NAME_RULES, text)
            .or_else(|| name_from_heading(text))
            .unwrap_or_else(|| self.default_name.clone())
    }

    pub fn infer_description(&self, text: &str) -> String {
        first_match(&DESCRIPTION_RULES, text).unwrap_or_else(|| self.default_description.clone())
    }
}

/// Extracts with the built-in placeholder values
pub fn extract(text: &str) -> AnalysisResult {
    Extractor::default().extract(text)
}

/// Retained sections become `req-1`, `req-2`, ... in document order
///
/// When nothing qualifies the fixed default triple is returned, so the result
/// is never empty.
pub fn extract_requirements(text: &str) -> Vec<Requirement> {
    let mut requirements = Vec::new();

    for section in split_sections(text) {
        if section.char_len() < MIN_SECTION_LEN {
            continue;
        }
        let body = section.text();
        if !REQUIREMENT_SIGNAL.is_match(&body) {
            continue;
        }

        let category = CATEGORY_RULES.classify(&body);
        let priority = PRIORITY_RULES.classify(&body);
        let id = format!("req-{}", requirements.len() + 1);
        debug!(id = %id, %category, %priority, "retained section");

        requirements.push(Requirement::new(id, category, section.first_line(), priority));
    }

    if requirements.is_empty() {
        debug!("no requirement sections found, using defaults");
        return default_requirements();
    }
    requirements
}

/// One functional/high, one ui/medium and one data/low requirement
pub fn default_requirements() -> Vec<Requirement> {
    vec![
        Requirement::new(
            "req-1",
            RequirementCategory::Functional,
            "The application should allow users to view content",
            RequirementPriority::High,
        ),
        Requirement::new(
            "req-2",
            RequirementCategory::Ui,
            "The application should have a responsive design",
            RequirementPriority::Medium,
        ),
        Requirement::new(
            "req-3",
            RequirementCategory::Data,
            "The application should store user preferences",
            RequirementPriority::Low,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASKMASTER: &str = "Title: TaskMaster\nUsers must be able to create tasks. This is critical.\nThe UI should be responsive.";

    #[test]
    fn test_taskmaster_document() {
        let result = extract(TASKMASTER);
        assert_eq!(result.name, "TaskMaster");
        assert_eq!(result.requirements.len(), 2);

        let first = &result.requirements[0];
        assert_eq!(first.id, "req-1");
        assert_eq!(first.category, RequirementCategory::Functional);
        assert_eq!(first.priority, RequirementPriority::High);
        assert_eq!(
            first.description,
            "Users must be able to create tasks. This is critical."
        );

        let second = &result.requirements[1];
        assert_eq!(second.id, "req-2");
        assert_eq!(second.category, RequirementCategory::Ui);
        assert_eq!(second.priority, RequirementPriority::Medium);
    }

    #[test]
    fn test_empty_document_uses_fallbacks() {
        let result = extract("");
        assert_eq!(result.name, DEFAULT_APP_NAME);
        assert_eq!(result.description, DEFAULT_APP_DESCRIPTION);
        assert_eq!(result.technology_set, tech::BASE_STACK.to_vec());
        assert_eq!(result.requirements, default_requirements());
    }

    #[test]
    fn test_short_sections_are_discarded() {
        // "must do" signals a requirement but is under ten characters
        let requirements = extract_requirements("- must do\n- The system shall export reports");
        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements[0].description, "The system shall export reports");
    }

    #[test]
    fn test_requirement_under_empty_bullet_kept() {
        let requirements = extract_requirements("- \n  Users must export data");
        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements[0].id, "req-1");
        assert_eq!(requirements[0].description, "Users must export data");
    }

    #[test]
    fn test_description_is_first_line_only() {
        let text = "1. Users should be able to tag notes\n   using free-form labels that must be unique";
        let requirements = extract_requirements(text);
        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements[0].description, "Users should be able to tag notes");
        // classification sees the whole section, including the continuation
        assert_eq!(requirements[0].priority, RequirementPriority::High);
    }

    #[test]
    fn test_long_first_line_truncated() {
        let line = format!("The system shall {}", "process ".repeat(20));
        let requirements = extract_requirements(&line);
        assert_eq!(requirements[0].description.chars().count(), 100);
        assert!(requirements[0].description.ends_with("..."));
    }

    #[test]
    fn test_ids_are_sequential_over_retained_sections() {
        let text = "# Goals\n- Users can sign up\n- Nothing to see\n- Reports must be exportable";
        let ids: Vec<String> = extract_requirements(text)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["req-1", "req-2"]);
    }

    #[test]
    fn test_configured_placeholders() {
        let config = PipelineConfig {
            default_app_name: "Untitled".into(),
            default_app_description: "No overview yet".into(),
            ..Default::default()
        };
        let result = Extractor::new(&config).extract("random words, no structure at all!");
        assert_eq!(result.name, "Untitled");
        assert_eq!(result.description, "No overview yet");
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "Overview: Recipe sharing\n\n## Features\n* Users can upload photos\n* Search must be fast";
        assert_eq!(extract(text), extract(text));
    }
}
