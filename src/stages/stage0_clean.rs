use std::sync::LazyLock;

use regex::Regex;

use crate::error::PipelineError;

/// `Name:` / `Name Surname (Company):` / `Name -- Title:` at line start
static SPEAKER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Z][\w.'’-]*(?:[ \t]+[A-Z][\w.'’&-]*){0,4}(?:[ \t]*\([^)]*\))?(?:[ \t]+(?:--|-|–|—)[ \t]+[^:]{1,60})?[ \t]*:(?:[ \t]+|$)",
    )
    .expect("speaker label pattern is valid")
});

/// `[inaudible]`, `(laughter)`, `[Operator Instructions]`
static ASIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]|\([^)]*\)").expect("aside pattern is valid")
});

/// Whole-line header/footer boilerplate
static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:page\s+\d+(?:\s+of\s+\d+)?|(?:copyright|©|\(c\)\s*\d{4}).*|.*all rights reserved.*|.*transcripts?\s+(?:provided|produced|prepared)\s+by.*|[-=_*~#]{3,})$",
    )
    .expect("boilerplate pattern is valid")
});

/// Configuration for transcript cleaning
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Remove `Speaker:` prefixes at line start
    pub strip_speaker_labels: bool,
    /// Remove bracketed and parenthetical asides
    pub strip_asides: bool,
    /// Extra whole-line patterns to drop, checked against the trimmed line
    pub extra_boilerplate: Vec<Regex>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            strip_speaker_labels: true,
            strip_asides: true,
            extra_boilerplate: Vec::new(),
        }
    }
}

impl CleanConfig {
    /// Add extra boilerplate line patterns (regex syntax)
    pub fn with_extra_boilerplate<I, S>(mut self, patterns: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let regex = Regex::new(pattern).map_err(|e| {
                PipelineError::Config(format!("invalid boilerplate pattern {pattern:?}: {e}"))
            })?;
            self.extra_boilerplate.push(regex);
        }
        Ok(self)
    }

    fn is_boilerplate(&self, line: &str) -> bool {
        BOILERPLATE.is_match(line) || self.extra_boilerplate.iter().any(|r| r.is_match(line))
    }
}

/// Clean raw transcript text
///
/// Produces paragraphs of single-space separated words, joined by exactly one
/// blank line. A blank source line ends a paragraph, and so does a line that
/// opens with a speaker label. Lines emptied by cleaning are skipped
/// without breaking the paragraph.
pub fn clean_text(raw: &str, config: &CleanConfig) -> String {
    let raw = raw.trim_start_matches('\u{feff}');

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in raw.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush_paragraph(&mut current, &mut paragraphs);
            continue;
        }

        if config.is_boilerplate(trimmed) {
            continue;
        }

        let mut text = trimmed;
        if config.strip_speaker_labels {
            if let Some(label) = SPEAKER_LABEL.find(text) {
                flush_paragraph(&mut current, &mut paragraphs);
                text = &text[label.end()..];
            }
        }

        let text = if config.strip_asides {
            ASIDE.replace_all(text, " ")
        } else {
            text.into()
        };

        for word in text.split_whitespace() {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
    }

    flush_paragraph(&mut current, &mut paragraphs);
    paragraphs.join("\n\n")
}

fn flush_paragraph(current: &mut String, paragraphs: &mut Vec<String>) {
    if !current.is_empty() {
        paragraphs.push(std::mem::take(current));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(raw: &str) -> String {
        clean_text(raw, &CleanConfig::default())
    }

    #[test]
    fn test_strips_speaker_labels() {
        let cleaned = clean("Operator: Good morning.\nJane Doe -- Chief Financial Officer: Thanks, operator.");
        assert_eq!(cleaned, "Good morning.\n\nThanks, operator.");
    }

    #[test]
    fn test_speaker_label_with_affiliation() {
        let cleaned = clean("John Smith (Acme Capital): What about margins?");
        assert_eq!(cleaned, "What about margins?");
    }

    #[test]
    fn test_does_not_strip_times_or_lowercase_prefixes() {
        let cleaned = clean("we met at 10:30 as planned\nratio: three to one");
        assert_eq!(cleaned, "we met at 10:30 as planned ratio: three to one");
    }

    #[test]
    fn test_removes_asides() {
        let cleaned = clean("Revenue grew [inaudible] nine percent (laughter) this quarter.");
        assert_eq!(cleaned, "Revenue grew nine percent this quarter.");
    }

    #[test]
    fn test_drops_boilerplate_lines() {
        let raw = "Copyright 2025 Example Corp\nPage 3 of 12\nRevenue was strong.\n-----\nAll Rights Reserved.";
        assert_eq!(clean(raw), "Revenue was strong.");
    }

    #[test]
    fn test_collapses_whitespace_and_blank_lines() {
        let raw = "First   line\n  continues here\n\n\n\nSecond\tparagraph  ";
        assert_eq!(clean(raw), "First line continues here\n\nSecond paragraph");
    }

    #[test]
    fn test_aside_only_line_does_not_split_paragraph() {
        let raw = "We expect growth\n[Operator Instructions]\nnext year.";
        assert_eq!(clean(raw), "We expect growth next year.");
    }

    #[test]
    fn test_extra_boilerplate() {
        let config = CleanConfig::default()
            .with_extra_boilerplate(["(?i)^forward-looking statements.*"])
            .unwrap();
        let cleaned = clean_text("Forward-looking statements apply.\nMargins improved.", &config);
        assert_eq!(cleaned, "Margins improved.");
    }

    #[test]
    fn test_invalid_extra_boilerplate_is_config_error() {
        let result = CleanConfig::default().with_extra_boilerplate(["("]);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_empty_input_cleans_to_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("[music]\n\n(silence)"), "");
    }
}
