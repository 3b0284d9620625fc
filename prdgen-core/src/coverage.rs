//! Coverage auditing over the current requirement and artifact sets

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{GeneratedArtifact, Requirement};

/// Derived coverage figures; recomputed on demand, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub total_requirements: usize,
    pub covered_requirements: usize,
    /// In `[0, 100]`; 0 when there are no requirements
    pub coverage_percent: f64,
    /// Descriptions of requirements no artifact claims, in requirement order
    pub uncovered_descriptions: Vec<String>,
}

impl CoverageReport {
    pub fn is_complete(&self) -> bool {
        self.total_requirements > 0 && self.covered_requirements == self.total_requirements
    }

    /// One-line summary such as `2/3 requirements covered (66.7%)`
    pub fn summary(&self) -> String {
        format!(
            "{}/{} requirements covered ({:.1}%)",
            self.covered_requirements, self.total_requirements, self.coverage_percent
        )
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Audits coverage; claims on ids that no longer exist are ignored
pub fn audit(requirements: &[Requirement], artifacts: &[GeneratedArtifact]) -> CoverageReport {
    let claimed: BTreeSet<&str> = artifacts
        .iter()
        .flat_map(|a| a.satisfied_requirement_ids.iter().map(String::as_str))
        .collect();

    let (covered, uncovered): (Vec<&Requirement>, Vec<&Requirement>) = requirements
        .iter()
        .partition(|r| claimed.contains(r.id.as_str()));

    let total = requirements.len();
    let coverage_percent = if total == 0 {
        0.0
    } else {
        covered.len() as f64 / total as f64 * 100.0
    };

    debug!(
        total,
        covered = covered.len(),
        coverage_percent,
        "audited coverage"
    );

    CoverageReport {
        total_requirements: total,
        covered_requirements: covered.len(),
        coverage_percent,
        uncovered_descriptions: uncovered.iter().map(|r| r.description.clone()).collect(),
    }
}
