//! Ordered rule cascades
//!
//! Every heuristic in the extractor is a list of rules tried in priority
//! order; the first rule that produces a value wins. Keeping each rule a
//! separate value lets callers (and tests) probe the cascade one rule at a time.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{RequirementCategory, RequirementPriority};

/// Captures the value of a labeled field such as `Title: TaskMaster`
///
/// The value is the rest of the labeled line (or the next line when the label
/// stands alone), followed by up to `continuation_lines` further non-blank
/// lines. Lines are joined with single spaces.
#[derive(Debug)]
pub struct FieldRule {
    pub label: &'static str,
    pattern: Regex,
    continuation_lines: usize,
}

impl FieldRule {
    /// `label_pattern` is a regex fragment matched case-insensitively at line start
    pub(crate) fn new(label: &'static str, label_pattern: &str, continuation_lines: usize) -> Self {
        let pattern = Regex::new(&format!(
            r"(?im)^[ \t#>*_-]*(?:{})[*_ \t]*:[*_ \t]*([^\r\n]*)",
            label_pattern
        ))
        .expect("field rule pattern must compile");
        Self {
            label,
            pattern,
            continuation_lines,
        }
    }

    pub fn apply(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let whole = caps.get(0)?;
        let head = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();

        let rest = &text[whole.end()..];
        let rest = rest
            .strip_prefix("\r\n")
            .or_else(|| rest.strip_prefix('\n'))
            .unwrap_or("");

        let mut parts: Vec<&str> = Vec::new();
        if !head.is_empty() {
            parts.push(head);
        }
        let budget = if head.is_empty() {
            self.continuation_lines + 1
        } else {
            self.continuation_lines
        };
        parts.extend(
            rest.lines()
                .map(str::trim)
                .take_while(|line| !line.is_empty())
                .take(budget),
        );

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Tries each field rule in order and returns the first value found
pub fn first_match(rules: &[FieldRule], text: &str) -> Option<String> {
    rules.iter().find_map(|rule| rule.apply(text))
}

/// A keyword group that maps matching text to a classification value
#[derive(Debug)]
pub struct KeywordRule<T> {
    pub value: T,
    pattern: Regex,
}

impl<T: Copy> KeywordRule<T> {
    pub(crate) fn new(value: T, pattern: &str) -> Self {
        Self {
            value,
            pattern: Regex::new(&format!("(?i){}", pattern))
                .expect("keyword rule pattern must compile"),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Ordered keyword rules with a fallback value
#[derive(Debug)]
pub struct Cascade<T> {
    pub rules: Vec<KeywordRule<T>>,
    pub fallback: T,
}

impl<T: Copy> Cascade<T> {
    /// Returns the first rule whose keywords appear in `text`
    pub fn matching_rule(&self, text: &str) -> Option<&KeywordRule<T>> {
        self.rules.iter().find(|rule| rule.matches(text))
    }

    pub fn classify(&self, text: &str) -> T {
        self.matching_rule(text)
            .map(|rule| rule.value)
            .unwrap_or(self.fallback)
    }
}

pub static NAME_RULES: Lazy<Vec<FieldRule>> = Lazy::new(|| {
    vec![
        FieldRule::new("App Name", r"app(?:lication)?[ \t]+name", 0),
        FieldRule::new("Project Name", r"project[ \t]+name", 0),
        FieldRule::new("Title", r"title", 0),
        FieldRule::new("Product", r"product(?:[ \t]+name)?", 0),
    ]
});

pub static DESCRIPTION_RULES: Lazy<Vec<FieldRule>> = Lazy::new(|| {
    vec![
        FieldRule::new("Description", r"description", 3),
        FieldRule::new("Overview", r"overview", 3),
        FieldRule::new("Summary", r"summary", 3),
        FieldRule::new("Introduction", r"introduction", 3),
    ]
});

/// Short title line, optionally prefixed by "The" and suffixed by a generic noun
static TITLE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:the[ \t]+)?([\w \t]{3,30}?)(?:[ \t]+(?:app|application|system|platform))?$")
        .expect("title line pattern must compile")
});

/// Name heuristic over the first non-blank line within the first five lines
pub fn name_from_heading(text: &str) -> Option<String> {
    let line = text
        .lines()
        .take(5)
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| matches!(c, '#' | '*' | '>'))
                .trim()
        })
        .find(|line| !line.is_empty())?;

    let caps = TITLE_LINE.captures(line)?;
    let name = caps.get(1)?.as_str().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Vocabulary that marks a section as a requirement statement
pub static REQUIREMENT_SIGNAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:shall|should|must|need|require|feature|function|capabilit)",
        r"|\busers?[ \t]+(?:can|should)\b",
        r"|\b(?:system|application|app)[ \t]+will\b",
    ))
    .expect("requirement signal pattern must compile")
});

/// Category groups in priority order: UI, data, performance, security
pub static CATEGORY_RULES: Lazy<Cascade<RequirementCategory>> = Lazy::new(|| Cascade {
    rules: vec![
        KeywordRule::new(
            RequirementCategory::Ui,
            r"\b(?:ui|ux)\b|\b(?:interface|design|layout|colou?r|styl|theme|responsive)",
        ),
        KeywordRule::new(
            RequirementCategory::Data,
            r"\b(?:data|storage|persist|save|load|retriev)",
        ),
        KeywordRule::new(
            RequirementCategory::Performance,
            r"\b(?:performan|speed|fast|optimi[sz]|efficien|response[ \t]+time)",
        ),
        KeywordRule::new(
            RequirementCategory::Security,
            r"\b(?:secur|auth|log[ -]?in\b|permission|role|protect|encrypt)",
        ),
    ],
    fallback: RequirementCategory::Functional,
});

/// Priority groups: urgency first, then optionality
pub static PRIORITY_RULES: Lazy<Cascade<RequirementPriority>> = Lazy::new(|| Cascade {
    rules: vec![
        KeywordRule::new(
            RequirementPriority::High,
            r"\b(?:critical|crucial|essential|highest|must|urgent|important)",
        ),
        KeywordRule::new(
            RequirementPriority::Low,
            r"\b(?:optional|nice[ \t]+to[ \t]+have|if[ \t]+possible|could|may|low)\b",
        ),
    ],
    fallback: RequirementPriority::Medium,
});
