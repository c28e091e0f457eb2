use std::path::PathBuf;
use std::sync::Arc;

/// A loaded transcript: the raw source text plus its cleaned form
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Where the text came from (None for in-memory transcripts)
    pub source: Option<PathBuf>,
    /// Text exactly as read
    pub raw: String,
    /// Speaker labels, asides and boilerplate removed; paragraphs separated by one blank line
    pub cleaned: Arc<str>,
}

impl Transcript {
    pub fn new(source: Option<PathBuf>, raw: String, cleaned: String) -> Self {
        Self {
            source,
            raw,
            cleaned: Arc::from(cleaned),
        }
    }

    /// Number of whitespace-delimited words in the cleaned text
    pub fn word_count(&self) -> usize {
        count_words(&self.cleaned)
    }

    /// Number of blank-line delimited paragraphs in the cleaned text
    pub fn paragraph_count(&self) -> usize {
        self.cleaned
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count()
    }
}

/// Count whitespace-delimited words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
