//! Splitting raw document text into candidate requirement sections

use once_cell::sync::Lazy;
use regex::Regex;

/// Heading (`#`..`######`), numbering (`1.` / `1)`) or bullet (`*`, `-`, `+`, `•`) prefix
static MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*(?:#{1,6}|\d+[.)]|[*+•-])[ \t]+").expect("section marker pattern must compile")
});

/// A contiguous block of text that may hold one requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    lines: Vec<String>,
}

impl Section {
    /// The first line with any heading/numbering/bullet marker removed
    pub fn first_line(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or_default()
    }

    /// All lines joined with newlines
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn char_len(&self) -> usize {
        // newline separators count towards the length
        self.lines.iter().map(|l| l.chars().count()).sum::<usize>() + self.lines.len().saturating_sub(1)
    }
}

/// Splits text into sections
///
/// A section starts at every non-indented line and at every marker line. Blank
/// lines close the current section; indented lines without a marker continue it.
/// A marker line with no text is headed by its first continuation line.
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for raw in text.lines() {
        if raw.trim().is_empty() {
            sections.extend(current.take());
            continue;
        }

        let is_marker = MARKER.is_match(raw);
        let is_indented = raw.starts_with(|c: char| c == ' ' || c == '\t');

        let continues = is_indented && !is_marker;
        match current.as_mut() {
            Some(section) if continues => {
                // a bare marker line leaves an empty head for the continuation to take
                if section.first_line().is_empty() {
                    section.lines.clear();
                }
                section.lines.push(raw.trim().to_string());
            }
            _ => {
                sections.extend(current.take());
                let stripped = MARKER.replace(raw, "");
                current = Some(Section {
                    lines: vec![stripped.trim().to_string()],
                });
            }
        }
    }

    sections.extend(current);
    sections.retain(|s| !s.first_line().is_empty());
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_lines(text: &str) -> Vec<String> {
        split_sections(text)
            .iter()
            .map(|s| s.first_line().to_string())
            .collect()
    }

    #[test]
    fn test_each_plain_line_is_a_section() {
        let text = "Title: TaskMaster\nUsers must create tasks.\nThe UI should be responsive.";
        assert_eq!(
            first_lines(text),
            vec![
                "Title: TaskMaster",
                "Users must create tasks.",
                "The UI should be responsive."
            ]
        );
    }

    #[test]
    fn test_markers_are_stripped() {
        let text = "## Features\n1. Login with email\n2) Reset password\n* Export CSV\n- Import CSV\n• Share";
        assert_eq!(
            first_lines(text),
            vec![
                "Features",
                "Login with email",
                "Reset password",
                "Export CSV",
                "Import CSV",
                "Share"
            ]
        );
    }

    #[test]
    fn test_indented_lines_continue_section() {
        let text = "- Users must be able to share boards\n  with read-only links\n  - nested bullet";
        let sections = split_sections(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(
            sections[0].text(),
            "Users must be able to share boards\nwith read-only links"
        );
        assert_eq!(sections[1].first_line(), "nested bullet");
    }

    #[test]
    fn test_blank_lines_close_sections() {
        let sections = split_sections("First\n\n  indented after blank");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].first_line(), "indented after blank");
    }

    #[test]
    fn test_empty_text_has_no_sections() {
        assert!(split_sections("").is_empty());
        assert!(split_sections("\n\n   \n").is_empty());
    }

    #[test]
    fn test_char_len_counts_newlines() {
        let sections = split_sections("abc\n  de");
        assert_eq!(sections[0].char_len(), 6);
    }

    #[test]
    fn test_bare_marker_is_not_stripped() {
        // "-" alone has no trailing whitespace, so it stays as literal text
        assert_eq!(first_lines("-"), vec!["-"]);
    }

    #[test]
    fn test_empty_marker_line_headed_by_continuation() {
        let sections = split_sections("- \n  Users must export data\n  as CSV files");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].first_line(), "Users must export data");
        assert_eq!(sections[0].text(), "Users must export data\nas CSV files");
    }
}
