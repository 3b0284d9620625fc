//! Iteration Controller
//!
//! Drives the bounded sequence of synthesis passes over a store:
//! `0 -> 1 -> 2 -> ... -> max`. Reaching the maximum is a terminal state that
//! refuses further generation without modifying the store.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::models::{GeneratedArtifact, RequirementsStore};
use crate::synthesis::Synthesizer;

/// Iteration ceiling used when nothing else is configured
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// Result of one generate request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerateOutcome {
    /// The counter advanced to `iteration` and the artifact set was replaced
    Generated {
        iteration: u32,
        artifacts: Vec<GeneratedArtifact>,
    },
    /// The counter was already at `max`; nothing changed
    Refused { iteration: u32, max: u32 },
}

impl GenerateOutcome {
    pub fn is_refused(&self) -> bool {
        matches!(self, GenerateOutcome::Refused { .. })
    }

    pub fn iteration(&self) -> u32 {
        match self {
            GenerateOutcome::Generated { iteration, .. } => *iteration,
            GenerateOutcome::Refused { iteration, .. } => *iteration,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IterationController {
    max_iterations: u32,
    synthesizer: Synthesizer,
}

impl Default for IterationController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl IterationController {
    pub fn new(max_iterations: u32) -> Self {
        Self::with_synthesizer(max_iterations, Synthesizer::new())
    }

    pub fn with_synthesizer(max_iterations: u32, synthesizer: Synthesizer) -> Self {
        Self {
            max_iterations,
            synthesizer,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_iterations)
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Whether another pass is allowed; hosts use this to disable the trigger
    pub fn can_generate(&self, store: &RequirementsStore) -> bool {
        store.current_iteration < self.max_iterations
    }

    /// Runs one synthesis pass, passing the current artifacts as prior input
    pub fn generate(&self, store: &mut RequirementsStore) -> GenerateOutcome {
        if !self.can_generate(store) {
            warn!(
                iteration = store.current_iteration,
                max = self.max_iterations,
                "iteration limit reached, refusing to generate"
            );
            return GenerateOutcome::Refused {
                iteration: store.current_iteration,
                max: self.max_iterations,
            };
        }

        let iteration = store.current_iteration + 1;
        let artifacts = self.synthesizer.synthesize(
            &store.requirements,
            &store.metadata,
            iteration,
            &store.artifacts,
        );

        store.current_iteration = iteration;
        store.set_artifacts(artifacts.clone());
        info!(iteration, max = self.max_iterations, "generation pass complete");

        GenerateOutcome::Generated {
            iteration,
            artifacts,
        }
    }
}
