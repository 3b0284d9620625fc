//! Named Template Registry
//!
//! Generated files are produced from named templates with `{{param}}`
//! placeholders. Substitution is a single left-to-right pass: inserted values
//! are never re-scanned, so parameter values may safely contain braces.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

pub const APP: &str = "source.app";
pub const HOME_PAGE: &str = "source.home-page";
pub const ABOUT_PAGE: &str = "source.about-page";
pub const HEADER: &str = "source.header";
pub const FOOTER: &str = "source.footer";
pub const FEATURE_CARD: &str = "source.feature-card";
pub const BUTTON: &str = "source.button";
pub const APP_CSS: &str = "source.app-css";
pub const DATA_SERVICE: &str = "source.data-service";

pub const TEST_ROUTED: &str = "test.routed";
pub const TEST_PLAIN: &str = "test.plain";
pub const TEST_MODULE: &str = "test.module";
pub const CASE_RENDER: &str = "case.render";
pub const CASE_MODULE: &str = "case.module";

pub const PROJECT_README: &str = "project.readme";
pub const PROJECT_INDEX_HTML: &str = "project.index-html";
pub const PROJECT_VITE_CONFIG: &str = "project.vite-config";
pub const PROJECT_MAIN: &str = "project.main";
pub const PROJECT_VITE_ENV: &str = "project.vite-env";

/// Parameter map handed to [`substitute`]
pub type Params = BTreeMap<String, String>;

/// Errors raised when a template cannot be resolved or rendered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Template '{template}' references unknown parameter '{param}'")]
    MissingParam { template: String, param: String },
}

/// Template bodies keyed by id
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, String>,
}

impl TemplateRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every template shipped with the crate
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let builtin: [(&str, &str); 19] = [
            (APP, include_str!("../templates/source/app.tsx.tmpl")),
            (HOME_PAGE, include_str!("../templates/source/home_page.tsx.tmpl")),
            (ABOUT_PAGE, include_str!("../templates/source/about_page.tsx.tmpl")),
            (HEADER, include_str!("../templates/source/header.tsx.tmpl")),
            (FOOTER, include_str!("../templates/source/footer.tsx.tmpl")),
            (FEATURE_CARD, include_str!("../templates/source/feature_card.tsx.tmpl")),
            (BUTTON, include_str!("../templates/source/button.tsx.tmpl")),
            (APP_CSS, include_str!("../templates/source/app.css.tmpl")),
            (DATA_SERVICE, include_str!("../templates/source/data_service.ts.tmpl")),
            (TEST_ROUTED, include_str!("../templates/test/routed.tsx.tmpl")),
            (TEST_PLAIN, include_str!("../templates/test/plain.tsx.tmpl")),
            (TEST_MODULE, include_str!("../templates/test/module.ts.tmpl")),
            (CASE_RENDER, include_str!("../templates/test/case_render.tmpl")),
            (CASE_MODULE, include_str!("../templates/test/case_module.tmpl")),
            (PROJECT_README, include_str!("../templates/project/readme.md.tmpl")),
            (PROJECT_INDEX_HTML, include_str!("../templates/project/index.html.tmpl")),
            (PROJECT_VITE_CONFIG, include_str!("../templates/project/vite.config.js.tmpl")),
            (PROJECT_MAIN, include_str!("../templates/project/main.tsx.tmpl")),
            (PROJECT_VITE_ENV, include_str!("../templates/project/vite-env.d.ts.tmpl")),
        ];
        for (id, body) in builtin {
            registry.register(id, body);
        }
        registry
    }

    /// Registers (or replaces) a template
    pub fn register(&mut self, id: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(id.into(), body.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.templates.get(id).map(String::as_str)
    }

    /// Checks that `id` exists and only references parameters in `allowed`
    pub fn validate(&self, id: &str, allowed: &[&str]) -> Result<(), TemplateError> {
        let body = self
            .get(id)
            .ok_or_else(|| TemplateError::UnknownTemplate(id.to_string()))?;
        match placeholders(body).into_iter().find(|p| !allowed.contains(&p.as_str())) {
            Some(param) => Err(TemplateError::MissingParam {
                template: id.to_string(),
                param,
            }),
            None => Ok(()),
        }
    }

    /// Strict rendering: every placeholder must have a parameter
    pub fn render(&self, id: &str, params: &Params) -> Result<String, TemplateError> {
        let body = self
            .get(id)
            .ok_or_else(|| TemplateError::UnknownTemplate(id.to_string()))?;
        if let Some(param) = placeholders(body)
            .into_iter()
            .find(|p| !params.contains_key(p))
        {
            return Err(TemplateError::MissingParam {
                template: id.to_string(),
                param,
            });
        }
        Ok(substitute(body, params))
    }
}

/// Replaces each `{{name}}` with its parameter; unknown placeholders stay verbatim
pub fn substitute(body: &str, params: &Params) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                match params.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Distinct placeholder names in `body`, sorted
pub fn placeholders(body: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut rest = body;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let name = after[..end].trim();
        if !name.is_empty() {
            names.insert(name.to_string());
        }
        rest = &after[end + 2..];
    }
    names
}

/// Builds a [`Params`] map from string pairs
pub fn params<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> Params {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Escapes text for a single-quoted JavaScript string literal
pub fn js_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' | '\r' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

/// Makes text safe inside a `/* ... */` or `/** ... */` comment
pub fn comment_text(text: &str) -> String {
    text.replace("*/", "* /").replace(|c: char| c == '\n' || c == '\r', " ")
}

/// Escapes text for HTML element content
pub fn html_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_replaces_known_params() {
        let p = params([("name", "Header".to_string())]);
        assert_eq!(substitute("import {{name}} from './{{ name }}';", &p), "import Header from './Header';");
    }

    #[test]
    fn test_substitute_leaves_unknown_placeholders() {
        let p = params([("a", "1".to_string())]);
        assert_eq!(substitute("{{a}} {{b}} {{", &p), "1 {{b}} {{");
    }

    #[test]
    fn test_substitute_is_single_pass() {
        let p = params([
            ("outer", "{{inner}}".to_string()),
            ("inner", "boom".to_string()),
        ]);
        assert_eq!(substitute("<{{outer}}>", &p), "<{{inner}}>");
    }

    #[test]
    fn test_placeholders_collected() {
        let names = placeholders("{{b}} {{a}} {{b}} {{ }}");
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_builtin_templates_registered() {
        let registry = TemplateRegistry::builtin();
        for id in [APP, DATA_SERVICE, TEST_ROUTED, CASE_MODULE, PROJECT_README, PROJECT_VITE_ENV] {
            assert!(registry.get(id).is_some(), "missing {}", id);
        }
        assert_eq!(registry.templates.len(), 19);
    }

    #[test]
    fn test_render_requires_every_param() {
        let registry = TemplateRegistry::builtin();
        let err = registry.render(PROJECT_INDEX_HTML, &Params::new()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingParam {
                template: PROJECT_INDEX_HTML.into(),
                param: "app_name".into()
            }
        );

        let html = registry
            .render(PROJECT_INDEX_HTML, &params([("app_name", "Notes".to_string())]))
            .unwrap();
        assert!(html.contains("<title>Notes</title>"));
    }

    #[test]
    fn test_validate_unknown_template() {
        let registry = TemplateRegistry::new();
        assert_eq!(
            registry.validate("source.app", &[]),
            Err(TemplateError::UnknownTemplate("source.app".into()))
        );
    }

    #[test]
    fn test_source_templates_have_no_stray_placeholders() {
        // JSX double braces would be mistaken for placeholders
        let registry = TemplateRegistry::builtin();
        for id in [HOME_PAGE, ABOUT_PAGE, HEADER, FOOTER, FEATURE_CARD, BUTTON, APP_CSS, DATA_SERVICE] {
            assert!(placeholders(registry.get(id).unwrap()).is_empty(), "{}", id);
        }
    }

    #[test]
    fn test_escaping_helpers() {
        assert_eq!(js_string(r"It's a \ test"), r"It\'s a \\ test");
        assert_eq!(comment_text("end */ here"), "end * / here");
        assert_eq!(html_text("<b>&"), "&lt;b&gt;&amp;");
    }
}
