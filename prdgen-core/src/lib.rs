pub mod config;
pub mod coverage;
pub mod export;
pub mod extract;
pub mod iteration;
pub mod models;
pub mod storage;
pub mod synthesis;
pub mod templates;

// Re-export commonly used types
pub use config::{default_config_path, session_file_path, ConfigError, PipelineConfig};
pub use coverage::{audit, CoverageReport};
pub use export::{export_json, ExportError, ExportPreview, ProjectExporter, ProjectFile};
pub use extract::{extract, AnalysisResult, Extractor};
pub use iteration::{GenerateOutcome, IterationController, DEFAULT_MAX_ITERATIONS};
pub use models::{
    AppMetadata, GeneratedArtifact, Requirement, RequirementCategory, RequirementPriority,
    RequirementStatus, RequirementUpdate, RequirementsStore, StoreError, DEFAULT_APP_DESCRIPTION,
    DEFAULT_APP_NAME,
};
pub use storage::{Storage, StorageError};
pub use synthesis::{synthesize, Synthesizer};
pub use templates::{TemplateError, TemplateRegistry};
