//! Technology inference from document keywords

use once_cell::sync::Lazy;
use regex::Regex;

/// Technologies every generated project starts with
pub const BASE_STACK: [&str; 3] = ["React", "TypeScript", "Tailwind CSS"];

/// What a keyword group contributes once it matches
#[derive(Debug)]
enum Contribution {
    Fixed(&'static [&'static str]),
    /// Picks `then` when `when` also matches, otherwise `otherwise`
    Branch {
        when: Regex,
        then: &'static [&'static str],
        otherwise: &'static [&'static str],
    },
}

/// An independent keyword group; any subset of groups may match one document
#[derive(Debug)]
pub struct TechGroup {
    pub name: &'static str,
    trigger: Regex,
    contribution: Contribution,
}

impl TechGroup {
    fn fixed(name: &'static str, trigger: &str, techs: &'static [&'static str]) -> Self {
        Self {
            name,
            trigger: keyword_regex(trigger),
            contribution: Contribution::Fixed(techs),
        }
    }

    /// Technologies this group contributes for `text`, empty when it does not match
    pub fn contribute(&self, text: &str) -> &'static [&'static str] {
        if !self.trigger.is_match(text) {
            return &[];
        }
        match &self.contribution {
            Contribution::Fixed(techs) => *techs,
            Contribution::Branch {
                when,
                then,
                otherwise,
            } => {
                if when.is_match(text) {
                    *then
                } else {
                    *otherwise
                }
            }
        }
    }
}

fn keyword_regex(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern)).expect("technology keyword pattern must compile")
}

pub static TECH_GROUPS: Lazy<Vec<TechGroup>> = Lazy::new(|| {
    vec![
        TechGroup::fixed(
            "mobile",
            r"\b(?:mobile|ios|android|responsive)\b",
            &["React Native"],
        ),
        TechGroup::fixed(
            "backend",
            r"\b(?:apis?|rest(?:ful)?|graphql|back-?end|servers?)\b",
            &["Node.js", "Express"],
        ),
        TechGroup {
            name: "persistence",
            trigger: keyword_regex(r"\b(?:database|data[ \t]*store|storage|persist)"),
            contribution: Contribution::Branch {
                when: keyword_regex(r"\b(?:sql|postgres\w*|mysql|relational)\b"),
                then: &["PostgreSQL"],
                otherwise: &["MongoDB"],
            },
        },
        TechGroup::fixed(
            "auth",
            r"\b(?:auth|log[ -]?in\b|user[ \t]*accounts?\b|permission|role)",
            &["Auth0"],
        ),
        TechGroup::fixed(
            "testing",
            r"\b(?:test|jest|cypress|selenium)",
            &["Jest", "React Testing Library"],
        ),
    ]
});

/// Base stack followed by every matching group's technologies, in group order
pub fn infer_technologies(text: &str) -> Vec<String> {
    let mut stack: Vec<String> = BASE_STACK.iter().map(|t| t.to_string()).collect();
    for group in TECH_GROUPS.iter() {
        for tech in group.contribute(text) {
            if !stack.iter().any(|existing| existing.as_str() == *tech) {
                stack.push(tech.to_string());
            }
        }
    }
    stack
}
