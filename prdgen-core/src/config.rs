use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::iteration::DEFAULT_MAX_ITERATIONS;
use crate::models::{DEFAULT_APP_DESCRIPTION, DEFAULT_APP_NAME};

/// Overrides `max_iterations` when set
pub const MAX_ITERATIONS_ENV: &str = "PRDGEN_MAX_ITERATIONS";

/// Overrides the session file location when set
pub const SESSION_FILE_ENV: &str = "PRDGEN_FILE";

/// Session file used when neither `--file` nor the environment name one
pub const DEFAULT_SESSION_FILE: &str = "prdgen.yaml";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidEnvValue { var: String, value: String },
}

/// Pipeline settings loaded from YAML; every field has a default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Synthesis passes allowed before generation is refused
    pub max_iterations: u32,
    /// Name used when extraction finds none
    pub default_app_name: String,
    /// Description used when extraction finds none
    pub default_app_description: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            default_app_name: DEFAULT_APP_NAME.to_string(),
            default_app_description: DEFAULT_APP_DESCRIPTION.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Loads from `path`, or from the default location when `path` is `None`
    ///
    /// A missing default file yields the defaults; an explicitly named file
    /// must exist. The environment override is applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_override(env::var(MAX_ITERATIONS_ENV).ok().as_deref())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Applies a `PRDGEN_MAX_ITERATIONS` value
    pub fn apply_env_override(&mut self, value: Option<&str>) -> Result<(), ConfigError> {
        if let Some(raw) = value {
            self.max_iterations =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnvValue {
                        var: MAX_ITERATIONS_ENV.to_string(),
                        value: raw.to_string(),
                    })?;
        }
        Ok(())
    }
}

/// `<config_dir>/prdgen/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("prdgen").join("config.yaml"))
}

/// Resolves the session file: explicit option, then `PRDGEN_FILE`, then `prdgen.yaml`
pub fn session_file_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env::var(SESSION_FILE_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_SESSION_FILE),
    }
}
