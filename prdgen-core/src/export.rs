//! Project Export
//!
//! Materializes the artifact set into a standalone Vite + React project:
//! manifest, entry point, tooling config and every artifact with its
//! companion test under `src/`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::coverage::audit;
use crate::models::RequirementsStore;
use crate::templates::{self, html_text, params, TemplateError, TemplateRegistry};

/// Errors that can occur while exporting a project
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Failed to serialize {file}: {source}")]
    Json {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Artifact path escapes the project source directory
    #[error("Artifact path is not a relative project path: {0}")]
    UnsafePath(String),

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One file of the exported project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    /// Relative path from the project root
    pub path: PathBuf,
    pub contents: String,
}

/// What an export into a given directory would do
#[derive(Debug, Clone)]
pub struct ExportPreview {
    pub output_dir: PathBuf,
    pub files: Vec<ProjectFile>,
    /// Files that already exist and would be overwritten
    pub overwrites: Vec<PathBuf>,
    pub new_files: Vec<PathBuf>,
}

/// Builds project file trees from a store
#[derive(Debug, Clone)]
pub struct ProjectExporter {
    templates: TemplateRegistry,
}

impl Default for ProjectExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectExporter {
    pub fn new() -> Self {
        Self::with_templates(TemplateRegistry::builtin())
    }

    pub fn with_templates(templates: TemplateRegistry) -> Self {
        Self { templates }
    }

    /// Every project file in output order
    pub fn files(&self, store: &RequirementsStore) -> Result<Vec<ProjectFile>, ExportError> {
        let metadata = &store.metadata;
        let mut files = vec![
            file("package.json", self.package_json(store)?),
            file("README.md", self.readme(store)?),
            file(
                "index.html",
                self.templates.render(
                    templates::PROJECT_INDEX_HTML,
                    &params([("app_name", html_text(&metadata.name))]),
                )?,
            ),
            file(
                "vite.config.js",
                self.templates
                    .render(templates::PROJECT_VITE_CONFIG, &templates::Params::new())?,
            ),
            file("tsconfig.json", tsconfig()?),
            file(
                "src/main.tsx",
                self.templates
                    .render(templates::PROJECT_MAIN, &templates::Params::new())?,
            ),
            file(
                "src/vite-env.d.ts",
                self.templates
                    .render(templates::PROJECT_VITE_ENV, &templates::Params::new())?,
            ),
        ];

        for artifact in &store.artifacts {
            files.push(ProjectFile {
                path: source_path(&artifact.path)?,
                contents: artifact.source_code.clone(),
            });
            if let Some(test) = &artifact.test_code {
                files.push(ProjectFile {
                    path: source_path(&artifact.test_path())?,
                    contents: test.clone(),
                });
            }
        }

        Ok(files)
    }

    /// Generate a preview of what would be written into `output_dir`
    pub fn preview(
        &self,
        store: &RequirementsStore,
        output_dir: &Path,
    ) -> Result<ExportPreview, ExportError> {
        let files = self.files(store)?;
        let (overwrites, new_files): (Vec<PathBuf>, Vec<PathBuf>) = files
            .iter()
            .map(|f| f.path.clone())
            .partition(|path| output_dir.join(path).exists());

        Ok(ExportPreview {
            output_dir: output_dir.to_path_buf(),
            files,
            overwrites,
            new_files,
        })
    }

    /// Writes a previewed export, creating parent directories as needed
    pub fn apply(&self, preview: &ExportPreview) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = Vec::new();

        for project_file in &preview.files {
            let full_path = preview.output_dir.join(&project_file.path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).map_err(|source| ExportError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&full_path, &project_file.contents).map_err(|source| ExportError::Io {
                path: full_path.clone(),
                source,
            })?;
            written.push(project_file.path.clone());
        }

        info!(
            dir = %preview.output_dir.display(),
            files = written.len(),
            overwritten = preview.overwrites.len(),
            "exported project"
        );
        Ok(written)
    }

    /// Preview and apply in one step
    pub fn write_to(
        &self,
        store: &RequirementsStore,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let preview = self.preview(store, output_dir)?;
        self.apply(&preview)
    }

    fn package_json(&self, store: &RequirementsStore) -> Result<String, ExportError> {
        let manifest = json!({
            "name": package_name(&store.metadata.name),
            "private": true,
            "version": "0.1.0",
            "type": "module",
            "description": store.metadata.description,
            "scripts": {
                "dev": "vite",
                "build": "tsc && vite build",
                "preview": "vite preview",
                "test": "vitest run"
            },
            "dependencies": {
                "react": "^18.2.0",
                "react-dom": "^18.2.0",
                "react-router-dom": "^6.20.0"
            },
            "devDependencies": {
                "@testing-library/react": "^14.1.2",
                "@types/react": "^18.2.39",
                "@types/react-dom": "^18.2.17",
                "@vitejs/plugin-react": "^4.2.0",
                "jsdom": "^23.0.1",
                "typescript": "^5.3.2",
                "vite": "^5.0.2",
                "vitest": "^0.34.6"
            }
        });
        pretty("package.json", &manifest)
    }

    fn readme(&self, store: &RequirementsStore) -> Result<String, ExportError> {
        let metadata = &store.metadata;
        let technologies = if metadata.technology_set.is_empty() {
            "- (none)".to_string()
        } else {
            metadata
                .technology_set
                .iter()
                .map(|tech| format!("- {}", tech))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let report = audit(&store.requirements, &store.artifacts);
        let uncovered = if report.uncovered_descriptions.is_empty() {
            "All requirements are addressed by at least one component.".to_string()
        } else {
            let lines: Vec<String> = report
                .uncovered_descriptions
                .iter()
                .map(|d| format!("- {}", d))
                .collect();
            format!("Not yet addressed:\n\n{}", lines.join("\n"))
        };

        Ok(self.templates.render(
            templates::PROJECT_README,
            &params([
                ("app_name", metadata.name.clone()),
                ("app_description", metadata.description.clone()),
                ("technologies", technologies),
                ("coverage", report.summary()),
                ("uncovered", uncovered),
            ]),
        )?)
    }
}

fn file(path: &str, contents: String) -> ProjectFile {
    ProjectFile {
        path: PathBuf::from(path),
        contents,
    }
}

fn pretty(name: &'static str, value: &serde_json::Value) -> Result<String, ExportError> {
    serde_json::to_string_pretty(value)
        .map(|mut text| {
            text.push('\n');
            text
        })
        .map_err(|source| ExportError::Json { file: name, source })
}

fn tsconfig() -> Result<String, ExportError> {
    let config = json!({
        "compilerOptions": {
            "target": "ES2020",
            "useDefineForClassFields": true,
            "lib": ["ES2020", "DOM", "DOM.Iterable"],
            "module": "ESNext",
            "skipLibCheck": true,
            "moduleResolution": "bundler",
            "allowImportingTsExtensions": true,
            "resolveJsonModule": true,
            "isolatedModules": true,
            "noEmit": true,
            "jsx": "react-jsx",
            "strict": true,
            "noFallthroughCasesInSwitch": true,
            "types": ["vitest/globals"]
        },
        "include": ["src"]
    });
    pretty("tsconfig.json", &config)
}

/// Lower-cased app name with whitespace runs replaced by `-`
pub fn package_name(app_name: &str) -> String {
    let name = app_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    if name.is_empty() {
        "app".to_string()
    } else {
        name
    }
}

/// `src/<path>`, rejecting absolute paths and parent-directory components
fn source_path(logical: &str) -> Result<PathBuf, ExportError> {
    let relative = Path::new(logical);
    let safe = !logical.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(ExportError::UnsafePath(logical.to_string()));
    }
    Ok(Path::new("src").join(relative))
}

/// Export the whole store to JSON
pub fn export_json(store: &RequirementsStore, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(store).context("Failed to serialize store")?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON export: {:?}", output_path))?;

    info!(
        path = %output_path.display(),
        requirements = store.requirements.len(),
        artifacts = store.artifacts.len(),
        "exported store to JSON"
    );
    Ok(())
}
