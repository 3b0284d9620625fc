use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name used when neither extraction nor the user supplies one
pub const DEFAULT_APP_NAME: &str = "My App";

/// Description used when extraction finds no labeled overview
pub const DEFAULT_APP_DESCRIPTION: &str = "A React application generated from PRD requirements";

/// Longest description kept on a requirement (including the ellipsis)
pub const MAX_DESCRIPTION_LEN: usize = 100;

/// Represents the category of a requirement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RequirementCategory {
    Functional,
    Ui,
    Data,
    Performance,
    Security,
    Custom,
}

impl RequirementCategory {
    /// Get all categories for selection lists
    pub fn all() -> &'static [RequirementCategory] {
        &[
            RequirementCategory::Functional,
            RequirementCategory::Ui,
            RequirementCategory::Data,
            RequirementCategory::Performance,
            RequirementCategory::Security,
            RequirementCategory::Custom,
        ]
    }
}

impl fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementCategory::Functional => write!(f, "functional"),
            RequirementCategory::Ui => write!(f, "ui"),
            RequirementCategory::Data => write!(f, "data"),
            RequirementCategory::Performance => write!(f, "performance"),
            RequirementCategory::Security => write!(f, "security"),
            RequirementCategory::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for RequirementCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "functional" => Ok(RequirementCategory::Functional),
            "ui" | "ux" => Ok(RequirementCategory::Ui),
            "data" => Ok(RequirementCategory::Data),
            "performance" | "perf" => Ok(RequirementCategory::Performance),
            "security" => Ok(RequirementCategory::Security),
            "custom" => Ok(RequirementCategory::Custom),
            other => Err(format!("Invalid category: {}", other)),
        }
    }
}

/// Represents the priority of a requirement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RequirementPriority {
    High,
    Medium,
    Low,
}

impl RequirementPriority {
    /// Get all priorities for selection lists
    pub fn all() -> &'static [RequirementPriority] {
        &[
            RequirementPriority::High,
            RequirementPriority::Medium,
            RequirementPriority::Low,
        ]
    }
}

impl fmt::Display for RequirementPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementPriority::High => write!(f, "high"),
            RequirementPriority::Medium => write!(f, "medium"),
            RequirementPriority::Low => write!(f, "low"),
        }
    }
}

impl FromStr for RequirementPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(RequirementPriority::High),
            "medium" => Ok(RequirementPriority::Medium),
            "low" => Ok(RequirementPriority::Low),
            other => Err(format!("Invalid priority: {}", other)),
        }
    }
}

/// Represents the lifecycle status of a requirement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RequirementStatus {
    Pending,
    Analyzed,
    Implemented,
    Tested,
}

impl RequirementStatus {
    /// Get all statuses for selection lists
    pub fn all() -> &'static [RequirementStatus] {
        &[
            RequirementStatus::Pending,
            RequirementStatus::Analyzed,
            RequirementStatus::Implemented,
            RequirementStatus::Tested,
        ]
    }
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementStatus::Pending => write!(f, "pending"),
            RequirementStatus::Analyzed => write!(f, "analyzed"),
            RequirementStatus::Implemented => write!(f, "implemented"),
            RequirementStatus::Tested => write!(f, "tested"),
        }
    }
}

impl FromStr for RequirementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(RequirementStatus::Pending),
            "analyzed" => Ok(RequirementStatus::Analyzed),
            "implemented" => Ok(RequirementStatus::Implemented),
            "tested" => Ok(RequirementStatus::Tested),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

/// Represents a single structured requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    /// Unique identifier (`req-<n>` from extraction, `req-<millis>` when added by hand)
    pub id: String,

    /// Category the requirement was classified into
    pub category: RequirementCategory,

    /// Short description, never empty and at most 100 characters
    pub description: String,

    /// Priority level of the requirement
    pub priority: RequirementPriority,

    /// Current status of the requirement
    pub status: RequirementStatus,
}

impl Requirement {
    /// Creates a new pending requirement, truncating the description if needed
    pub fn new(
        id: impl Into<String>,
        category: RequirementCategory,
        description: &str,
        priority: RequirementPriority,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            description: truncate_description(description),
            priority,
            status: RequirementStatus::Pending,
        }
    }
}

/// Truncates to 97 characters plus an ellipsis when longer than 100 characters
pub fn truncate_description(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() > MAX_DESCRIPTION_LEN {
        let kept: String = text.chars().take(MAX_DESCRIPTION_LEN - 3).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

/// Inferred (or user-supplied) application metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppMetadata {
    pub name: String,
    pub description: String,
    /// Technologies in insertion order, without duplicates
    #[serde(default)]
    pub technology_set: Vec<String>,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: DEFAULT_APP_NAME.to_string(),
            description: DEFAULT_APP_DESCRIPTION.to_string(),
            technology_set: Vec::new(),
        }
    }
}

/// A generated source file plus its companion test
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedArtifact {
    /// Stable identifier; the same kind of artifact keeps its id across iterations
    pub id: String,
    /// Logical slash-delimited location relative to the project source root
    pub path: String,
    pub source_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_code: Option<String>,
    /// Requirement ids this artifact claims to satisfy (may contain stale ids)
    #[serde(default)]
    pub satisfied_requirement_ids: BTreeSet<String>,
}

impl GeneratedArtifact {
    /// Location of the companion test next to the artifact
    ///
    /// Script files get `<stem>.test.<ext>`; anything else gets `<path>.test.ts`.
    pub fn test_path(&self) -> String {
        match self.path.rsplit_once('.') {
            Some((stem, ext)) if matches!(ext, "tsx" | "ts" | "jsx" | "js") => {
                format!("{}.test.{}", stem, ext)
            }
            _ => format!("{}.test.ts", self.path),
        }
    }

    pub fn satisfies(&self, requirement_id: &str) -> bool {
        self.satisfied_requirement_ids.contains(requirement_id)
    }
}

/// Field-level partial update for a requirement; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementUpdate {
    pub category: Option<RequirementCategory>,
    pub description: Option<String>,
    pub priority: Option<RequirementPriority>,
    pub status: Option<RequirementStatus>,
}

impl RequirementUpdate {
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }
}

/// Errors raised by store mutations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Requirement not found: {0}")]
    RequirementNotFound(String),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Requirement description cannot be empty")]
    EmptyDescription,
}

/// The single source of truth shared by extraction, synthesis and the host UI
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequirementsStore {
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub metadata: AppMetadata,
    #[serde(default)]
    pub artifacts: Vec<GeneratedArtifact>,
    /// Number of synthesis passes run so far
    #[serde(default)]
    pub current_iteration: u32,
}

impl RequirementsStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces requirements and metadata with a fresh extraction result
    ///
    /// Artifacts from an older document no longer apply, so they are dropped
    /// and the iteration counter starts over.
    pub fn set_analysis(&mut self, metadata: AppMetadata, requirements: Vec<Requirement>) {
        self.metadata = metadata;
        self.requirements = requirements;
        self.artifacts.clear();
        self.current_iteration = 0;
    }

    /// Gets a requirement by id
    pub fn get_requirement(&self, id: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.id == id)
    }

    /// Gets a mutable reference to a requirement by id
    pub fn get_requirement_mut(&mut self, id: &str) -> Option<&mut Requirement> {
        self.requirements.iter_mut().find(|r| r.id == id)
    }

    /// Adds a manually entered requirement with a timestamp id
    pub fn add_requirement(
        &mut self,
        category: RequirementCategory,
        description: &str,
        priority: RequirementPriority,
    ) -> Result<&Requirement, StoreError> {
        self.add_requirement_at(Utc::now().timestamp_millis(), category, description, priority)
    }

    /// Adds a requirement whose id is derived from `millis`
    ///
    /// The suffix is bumped until it no longer collides with an existing id.
    pub fn add_requirement_at(
        &mut self,
        millis: i64,
        category: RequirementCategory,
        description: &str,
        priority: RequirementPriority,
    ) -> Result<&Requirement, StoreError> {
        if description.trim().is_empty() {
            return Err(StoreError::EmptyDescription);
        }

        let mut stamp = millis;
        let mut id = format!("req-{}", stamp);
        while self.get_requirement(&id).is_some() {
            stamp += 1;
            id = format!("req-{}", stamp);
        }

        self.requirements
            .push(Requirement::new(id, category, description, priority));
        let index = self.requirements.len() - 1;
        Ok(&self.requirements[index])
    }

    /// Applies a field-level update in place
    pub fn update_requirement(
        &mut self,
        id: &str,
        update: RequirementUpdate,
    ) -> Result<&Requirement, StoreError> {
        if let Some(description) = &update.description {
            if description.trim().is_empty() {
                return Err(StoreError::EmptyDescription);
            }
        }

        let req = self
            .get_requirement_mut(id)
            .ok_or_else(|| StoreError::RequirementNotFound(id.to_string()))?;

        if let Some(category) = update.category {
            req.category = category;
        }
        if let Some(description) = update.description {
            req.description = truncate_description(&description);
        }
        if let Some(priority) = update.priority {
            req.priority = priority;
        }
        if let Some(status) = update.status {
            req.status = status;
        }

        Ok(&*req)
    }

    /// Removes a requirement; artifacts keep their now-stale references
    pub fn remove_requirement(&mut self, id: &str) -> Result<Requirement, StoreError> {
        let index = self
            .requirements
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::RequirementNotFound(id.to_string()))?;
        Ok(self.requirements.remove(index))
    }

    /// Overrides metadata fields; an empty name falls back to the placeholder
    pub fn set_metadata(
        &mut self,
        name: Option<String>,
        description: Option<String>,
        technology_set: Option<Vec<String>>,
    ) {
        if let Some(name) = name {
            let name = name.trim();
            self.metadata.name = if name.is_empty() {
                DEFAULT_APP_NAME.to_string()
            } else {
                name.to_string()
            };
        }
        if let Some(description) = description {
            self.metadata.description = description.trim().to_string();
        }
        if let Some(technologies) = technology_set {
            let mut unique: Vec<String> = Vec::new();
            for tech in technologies {
                let tech = tech.trim().to_string();
                if !tech.is_empty() && !unique.contains(&tech) {
                    unique.push(tech);
                }
            }
            self.metadata.technology_set = unique;
        }
    }

    /// Gets an artifact by id
    pub fn get_artifact(&self, id: &str) -> Option<&GeneratedArtifact> {
        self.artifacts.iter().find(|a| a.id == id)
    }

    /// Replaces the whole artifact set
    pub fn set_artifacts(&mut self, artifacts: Vec<GeneratedArtifact>) {
        self.artifacts = artifacts;
    }

    /// Edits an artifact's source and/or test code in place
    pub fn update_artifact(
        &mut self,
        id: &str,
        source_code: Option<String>,
        test_code: Option<String>,
    ) -> Result<&GeneratedArtifact, StoreError> {
        let artifact = self
            .artifacts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::ArtifactNotFound(id.to_string()))?;

        if let Some(source) = source_code {
            artifact.source_code = source;
        }
        if let Some(test) = test_code {
            artifact.test_code = Some(test);
        }

        Ok(&*artifact)
    }

    /// Moves pending/analyzed requirements referenced by an artifact to implemented
    ///
    /// Returns the number of requirements whose status changed.
    pub fn mark_implemented(&mut self) -> usize {
        let claimed: BTreeSet<&str> = self
            .artifacts
            .iter()
            .flat_map(|a| a.satisfied_requirement_ids.iter().map(String::as_str))
            .collect();

        let mut changed = 0;
        for req in &mut self.requirements {
            let promotable = matches!(
                req.status,
                RequirementStatus::Pending | RequirementStatus::Analyzed
            );
            if promotable && claimed.contains(req.id.as_str()) {
                req.status = RequirementStatus::Implemented;
                changed += 1;
            }
        }
        changed
    }

    /// Clears every requirement, artifact and the iteration counter
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
