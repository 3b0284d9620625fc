//! Component Synthesis
//!
//! Maps a requirement set to generated source artifacts. Every artifact kind
//! is a row in [`ARTIFACT_KINDS`]: the template it renders, the category group
//! that switches it on, and the rule that decides which requirements it claims.
//! Adding a kind means registering a template and adding a row.
//!
//! Synthesis is a pure function of (requirements, metadata, iteration, prior
//! artifacts); identical inputs give byte-identical output.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::models::{AppMetadata, GeneratedArtifact, Requirement, RequirementCategory};
use crate::templates::{
    self, comment_text, js_string, params, Params, TemplateError, TemplateRegistry,
};

/// Parameters available to source templates
pub const SOURCE_PARAMS: &[&str] = &[
    "app_name",
    "app_name_js",
    "app_description",
    "root_imports",
    "root_header",
    "root_routes",
    "root_footer",
    "feature_import",
    "feature_item",
];

/// Parameters available to companion test templates
pub const TEST_PARAMS: &[&str] = &["name", "import_path", "props", "cases"];

/// Parameters available to per-requirement test case templates
pub const CASE_PARAMS: &[&str] = &["name", "req_id", "req_description"];

const ROOT_PATH: &str = "App.tsx";
const HOME_PAGE_PATH: &str = "pages/HomePage.tsx";
const FEATURE_CARD_ID: &str = "feature-card";

const FALLBACK_HEADER: &str = r#"<header className="app-header"><h1>{appName}</h1></header>"#;
const FALLBACK_ROUTE: &str =
    r#"<Route path="/" element={<p className="app-intro">Welcome to {appName}</p>} />"#;
const FALLBACK_FOOTER: &str = r#"<footer className="app-footer" />"#;

const FEATURE_ITEM_CARD: &str = r#"            <FeatureCard
              key={feature.title}
              title={feature.title}
              description={feature.description}
              icon={feature.icon}
            />"#;
const FEATURE_ITEM_PLAIN: &str = r#"            <div key={feature.title} className="feature-card">
              <span className="feature-icon">{feature.icon}</span>
              <h3>{feature.title}</h3>
              <p>{feature.description}</p>
            </div>"#;

const IMPROVEMENTS: [&str; 3] = [
    "Improved code structure",
    "Enhanced performance",
    "Fixed bugs from previous iteration",
];

/// Which requirements an artifact claims to satisfy
#[derive(Debug, Clone, Copy)]
pub enum Claim {
    /// Every requirement in any of these categories
    Categories(&'static [RequirementCategory]),
    /// Group members whose description mentions a keyword
    Keywords {
        words: &'static [&'static str],
        fallback_to_first: bool,
    },
    /// Every member of the group
    WholeGroup,
    Nothing,
}

/// How the companion test exercises the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStyle {
    /// Rendered inside a router
    Routed,
    /// Rendered standalone (the artifact provides its own router)
    Plain,
    /// Imported as a module
    Module,
}

impl TestStyle {
    fn wrapper_template(self) -> &'static str {
        match self {
            TestStyle::Routed => templates::TEST_ROUTED,
            TestStyle::Plain => templates::TEST_PLAIN,
            TestStyle::Module => templates::TEST_MODULE,
        }
    }

    fn case_template(self) -> &'static str {
        match self {
            TestStyle::Routed | TestStyle::Plain => templates::CASE_RENDER,
            TestStyle::Module => templates::CASE_MODULE,
        }
    }
}

/// Comment syntax of the artifact's language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `// ...`
    Line,
    /// `/* ... */`
    Block,
}

impl CommentStyle {
    fn trace_header(self, ids: &BTreeSet<String>) -> Option<String> {
        if ids.is_empty() {
            return None;
        }
        let list = comment_text(&ids.iter().cloned().collect::<Vec<_>>().join(", "));
        Some(match self {
            CommentStyle::Line => format!("// Satisfies: {}", list),
            CommentStyle::Block => format!("/* Satisfies: {} */", list),
        })
    }

    fn marker(self) -> &'static str {
        match self {
            CommentStyle::Line => "\n\n// Iteration ",
            CommentStyle::Block => "\n\n/* Iteration ",
        }
    }

    /// Iteration annotation appended to a carried-forward artifact
    pub fn annotation(self, iteration: u32) -> String {
        let mut text = format!("{}{} improvements:\n", self.marker(), iteration);
        for line in IMPROVEMENTS {
            match self {
                CommentStyle::Line => text.push_str(&format!("// - {}\n", line)),
                CommentStyle::Block => text.push_str(&format!(" - {}\n", line)),
            }
        }
        if self == CommentStyle::Block {
            text.push_str("*/\n");
        }
        text
    }

    /// Annotations accumulated by earlier iterations, empty when there are none
    fn trail(self, source: &str) -> &str {
        source
            .find(self.marker())
            .map(|pos| source[pos..].trim_end())
            .unwrap_or_default()
    }
}

/// How the root component uses an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mount {
    /// Not referenced by the root component
    Unmounted,
    /// Imported for its side effects only (stylesheets)
    SideEffect,
    /// Rendered above the routes
    Header,
    /// Rendered below the routes
    Footer,
    /// Rendered for one route path
    Route(&'static str),
}

/// One row of the artifact-kind table
#[derive(Debug, Clone, Copy)]
pub struct ArtifactKind {
    pub id: &'static str,
    pub path: &'static str,
    /// Category whose non-empty group switches this kind on; `None` is unconditional
    pub group: Option<RequirementCategory>,
    pub template: &'static str,
    pub claim: Claim,
    pub test: TestStyle,
    /// JSX attributes passed when the test renders the component
    pub test_props: &'static str,
    pub comment: CommentStyle,
    pub mount: Mount,
}

impl ArtifactKind {
    fn is_enabled(&self, requirements: &[Requirement]) -> bool {
        match self.group {
            None => true,
            Some(category) => requirements.iter().any(|r| r.category == category),
        }
    }

    fn claimed<'a>(&self, requirements: &'a [Requirement]) -> Vec<&'a Requirement> {
        let group: Vec<&Requirement> = match self.group {
            Some(category) => requirements.iter().filter(|r| r.category == category).collect(),
            None => requirements.iter().collect(),
        };

        match self.claim {
            Claim::Categories(categories) => group
                .into_iter()
                .filter(|r| categories.contains(&r.category))
                .collect(),
            Claim::Keywords {
                words,
                fallback_to_first,
            } => {
                let matching: Vec<&Requirement> = group
                    .iter()
                    .copied()
                    .filter(|r| {
                        let description = r.description.to_lowercase();
                        words.iter().any(|word| description.contains(word))
                    })
                    .collect();
                if matching.is_empty() && fallback_to_first {
                    group.into_iter().take(1).collect()
                } else {
                    matching
                }
            }
            Claim::WholeGroup => group,
            Claim::Nothing => Vec::new(),
        }
    }

    fn file_name(&self) -> &'static str {
        self.path.rsplit('/').next().unwrap_or(self.path)
    }

    fn logical_name(&self) -> &'static str {
        let file = self.file_name();
        file.split('.').next().unwrap_or(file)
    }

    /// Relative import specifier of this artifact from the file at `importer`
    fn specifier_from(&self, importer: &str) -> String {
        let depth = importer.matches('/').count();
        let prefix = if depth == 0 {
            "./".to_string()
        } else {
            "../".repeat(depth)
        };
        let target = match self.path.rsplit_once('.') {
            Some((stem, "tsx" | "ts" | "jsx" | "js")) => stem,
            _ => self.path,
        };
        format!("{}{}", prefix, target)
    }
}

/// Import lines and JSX slots wiring the root component and the home page to
/// the kinds enabled in this pass
///
/// A kind that is not enabled is never imported; its slot gets inline markup.
fn layout_params(enabled: &[&ArtifactKind]) -> [(&'static str, String); 6] {
    let mut imports = Vec::new();
    let mut header = FALLBACK_HEADER.to_string();
    let mut routes = Vec::new();
    let mut footer = FALLBACK_FOOTER.to_string();

    for kind in enabled {
        let name = kind.logical_name();
        let specifier = kind.specifier_from(ROOT_PATH);
        match kind.mount {
            Mount::Unmounted => continue,
            Mount::SideEffect => {
                imports.push(format!("import '{}';", specifier));
                continue;
            }
            Mount::Header => header = format!("<{} appName={{appName}} />", name),
            Mount::Footer => footer = format!("<{} />", name),
            Mount::Route(path) => {
                routes.push(format!("<Route path=\"{}\" element={{<{} />}} />", path, name))
            }
        }
        imports.push(format!("import {} from '{}';", name, specifier));
    }
    if routes.is_empty() {
        routes.push(FALLBACK_ROUTE.to_string());
    }

    let (feature_import, feature_item) = match enabled.iter().find(|k| k.id == FEATURE_CARD_ID) {
        Some(card) => (
            format!(
                "import {} from '{}';",
                card.logical_name(),
                card.specifier_from(HOME_PAGE_PATH)
            ),
            FEATURE_ITEM_CARD.to_string(),
        ),
        None => (String::new(), FEATURE_ITEM_PLAIN.to_string()),
    };

    [
        ("root_imports", imports.join("\n")),
        ("root_header", header),
        ("root_routes", routes.join("\n            ")),
        ("root_footer", footer),
        ("feature_import", feature_import),
        ("feature_item", feature_item),
    ]
}

/// Artifact kinds in output order: root, functional, ui, data
pub const ARTIFACT_KINDS: [ArtifactKind; 9] = [
    ArtifactKind {
        id: "app-component",
        path: ROOT_PATH,
        group: None,
        template: templates::APP,
        claim: Claim::Categories(&[RequirementCategory::Functional, RequirementCategory::Ui]),
        test: TestStyle::Plain,
        test_props: "",
        comment: CommentStyle::Line,
        mount: Mount::Unmounted,
    },
    ArtifactKind {
        id: "home-page",
        path: HOME_PAGE_PATH,
        group: Some(RequirementCategory::Functional),
        template: templates::HOME_PAGE,
        claim: Claim::Keywords {
            words: &["home", "landing", "main"],
            fallback_to_first: true,
        },
        test: TestStyle::Routed,
        test_props: "",
        comment: CommentStyle::Line,
        mount: Mount::Route("/"),
    },
    ArtifactKind {
        id: "about-page",
        path: "pages/AboutPage.tsx",
        group: Some(RequirementCategory::Functional),
        template: templates::ABOUT_PAGE,
        claim: Claim::Nothing,
        test: TestStyle::Routed,
        test_props: "",
        comment: CommentStyle::Line,
        mount: Mount::Route("/about"),
    },
    ArtifactKind {
        id: "header-component",
        path: "components/Header.tsx",
        group: Some(RequirementCategory::Functional),
        template: templates::HEADER,
        claim: Claim::Nothing,
        test: TestStyle::Routed,
        test_props: " appName=\"Test App\"",
        comment: CommentStyle::Line,
        mount: Mount::Header,
    },
    ArtifactKind {
        id: "footer-component",
        path: "components/Footer.tsx",
        group: Some(RequirementCategory::Functional),
        template: templates::FOOTER,
        claim: Claim::Nothing,
        test: TestStyle::Routed,
        test_props: "",
        comment: CommentStyle::Line,
        mount: Mount::Footer,
    },
    ArtifactKind {
        id: FEATURE_CARD_ID,
        path: "components/FeatureCard.tsx",
        group: Some(RequirementCategory::Ui),
        template: templates::FEATURE_CARD,
        claim: Claim::Keywords {
            words: &["card", "display"],
            fallback_to_first: false,
        },
        test: TestStyle::Routed,
        test_props: " title=\"Title\" description=\"Description\" icon=\"*\"",
        comment: CommentStyle::Line,
        mount: Mount::Unmounted,
    },
    ArtifactKind {
        id: "button-component",
        path: "components/Button.tsx",
        group: Some(RequirementCategory::Ui),
        template: templates::BUTTON,
        claim: Claim::Keywords {
            words: &["button", "click"],
            fallback_to_first: false,
        },
        test: TestStyle::Routed,
        test_props: " children=\"Click me\"",
        comment: CommentStyle::Line,
        mount: Mount::Unmounted,
    },
    ArtifactKind {
        id: "app-css",
        path: "App.css",
        group: Some(RequirementCategory::Ui),
        template: templates::APP_CSS,
        claim: Claim::Keywords {
            words: &["style", "css", "design"],
            fallback_to_first: false,
        },
        test: TestStyle::Module,
        test_props: "",
        comment: CommentStyle::Block,
        mount: Mount::SideEffect,
    },
    ArtifactKind {
        id: "data-service",
        path: "hooks/useDataService.ts",
        group: Some(RequirementCategory::Data),
        template: templates::DATA_SERVICE,
        claim: Claim::WholeGroup,
        test: TestStyle::Module,
        test_props: "",
        comment: CommentStyle::Line,
        mount: Mount::Unmounted,
    },
];

/// Template-driven component synthesizer
#[derive(Debug, Clone)]
pub struct Synthesizer {
    templates: TemplateRegistry,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synthesizer {
    /// Synthesizer over the built-in templates
    pub fn new() -> Self {
        Self {
            templates: TemplateRegistry::builtin(),
        }
    }

    /// Synthesizer over a custom registry
    ///
    /// Every template an artifact kind needs must exist and reference only the
    /// parameters synthesis supplies, so rendering can never fail later.
    pub fn with_templates(templates: TemplateRegistry) -> Result<Self, TemplateError> {
        for kind in &ARTIFACT_KINDS {
            templates.validate(kind.template, SOURCE_PARAMS)?;
            templates.validate(kind.test.wrapper_template(), TEST_PARAMS)?;
            templates.validate(kind.test.case_template(), CASE_PARAMS)?;
        }
        Ok(Self { templates })
    }

    /// Produces the artifact set for one iteration
    pub fn synthesize(
        &self,
        requirements: &[Requirement],
        metadata: &AppMetadata,
        iteration: u32,
        prior: &[GeneratedArtifact],
    ) -> Vec<GeneratedArtifact> {
        let enrich = iteration > 1 && !prior.is_empty();
        let mut carried = 0;

        let enabled: Vec<&ArtifactKind> = ARTIFACT_KINDS
            .iter()
            .filter(|kind| kind.is_enabled(requirements))
            .collect();

        let mut values = params([
            ("app_name", comment_text(&metadata.name)),
            ("app_name_js", js_string(&metadata.name)),
            ("app_description", comment_text(&metadata.description)),
        ]);
        values.extend(
            layout_params(&enabled)
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        );

        let artifacts: Vec<GeneratedArtifact> = enabled
            .into_iter()
            .map(|kind| {
                let claimed = kind.claimed(requirements);
                let ids: BTreeSet<String> = claimed.iter().map(|r| r.id.clone()).collect();

                let mut source = self.render_source(kind, &values, &ids);
                if enrich {
                    if let Some(previous) = prior.iter().find(|a| a.id == kind.id) {
                        source = carry_forward(&source, previous, kind.comment, iteration);
                        carried += 1;
                    }
                }
                debug!(artifact = kind.id, claimed = ids.len(), "rendered artifact");

                GeneratedArtifact {
                    id: kind.id.to_string(),
                    path: kind.path.to_string(),
                    source_code: source,
                    test_code: Some(self.render_test(kind, &claimed)),
                    satisfied_requirement_ids: ids,
                }
            })
            .collect();

        info!(
            iteration,
            artifacts = artifacts.len(),
            carried,
            "synthesized artifacts"
        );
        artifacts
    }

    fn render_source(&self, kind: &ArtifactKind, values: &Params, ids: &BTreeSet<String>) -> String {
        let body = templates::substitute(self.template(kind.template), values);

        let mut source = String::new();
        if let Some(header) = kind.comment.trace_header(ids) {
            source.push_str(&header);
            source.push('\n');
        }
        source.push_str(body.trim_end());
        source.push('\n');
        source
    }

    /// Smoke test plus one named case per claimed requirement
    fn render_test(&self, kind: &ArtifactKind, claimed: &[&Requirement]) -> String {
        let name = match kind.test {
            TestStyle::Module => kind.file_name(),
            TestStyle::Routed | TestStyle::Plain => kind.logical_name(),
        };
        let import_path = match kind.path.rsplit_once('.') {
            Some((_, "tsx" | "ts" | "jsx" | "js")) => kind.logical_name(),
            _ => kind.file_name(),
        };

        let case_template = self.template(kind.test.case_template());
        let cases: String = claimed
            .iter()
            .map(|req| {
                let values = params([
                    ("name", name.to_string()),
                    ("req_id", js_string(&req.id)),
                    ("req_description", js_string(&req.description)),
                ]);
                templates::substitute(case_template, &values)
            })
            .collect();

        let values = params([
            ("name", name.to_string()),
            ("import_path", import_path.to_string()),
            ("props", kind.test_props.to_string()),
            ("cases", cases),
        ]);
        templates::substitute(self.template(kind.test.wrapper_template()), &values)
    }

    fn template(&self, id: &str) -> &str {
        // presence is checked when the synthesizer is built
        self.templates.get(id).unwrap_or_default()
    }
}

/// Fresh source, then the prior artifact's annotation trail, then this iteration's annotation
fn carry_forward(
    fresh: &str,
    prior: &GeneratedArtifact,
    style: CommentStyle,
    iteration: u32,
) -> String {
    let mut source = fresh.trim_end().to_string();
    source.push_str(style.trail(&prior.source_code));
    source.push_str(&style.annotation(iteration));
    source
}

/// Synthesizes with the built-in templates
pub fn synthesize(
    requirements: &[Requirement],
    metadata: &AppMetadata,
    iteration: u32,
    prior: &[GeneratedArtifact],
) -> Vec<GeneratedArtifact> {
    Synthesizer::new().synthesize(requirements, metadata, iteration, prior)
}
