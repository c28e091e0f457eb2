use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Maximum number of words kept in a topic label
pub const MAX_LABEL_WORDS: usize = 2;

/// Classification of a single chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicObservation {
    /// Index of the chunk this observation describes
    pub chunk_index: usize,
    /// Short topic phrase (at most two words)
    pub topic_label: String,
    /// Tone of the chunk in [-1, 1]
    pub sentiment_score: f64,
    /// Short explanation returned by the classifier
    pub rationale: String,
    /// Word count of the source chunk
    pub word_count: usize,
}

/// Aggregated view of every observation sharing a topic label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    /// Display form of the label (first form seen in chunk order)
    pub topic_label: String,
    pub total_word_count: usize,
    pub estimated_minutes: f64,
    /// Word-count weighted sentiment in [-1, 1]
    pub aggregate_sentiment: f64,
    /// Rationale of the largest constituent chunk
    pub representative_rationale: String,
    /// Chunks that contributed to this topic, ascending
    pub chunk_indices: Vec<usize>,
}

impl TopicSummary {
    pub fn band(&self) -> SentimentBand {
        SentimentBand::from_score(self.aggregate_sentiment)
    }
}

/// Coarse sentiment bucket used by reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentBand {
    Positive,
    Neutral,
    Negative,
}

impl SentimentBand {
    /// Scores within ±0.1 of zero are neutral
    pub fn from_score(score: f64) -> Self {
        if score > 0.1 {
            SentimentBand::Positive
        } else if score < -0.1 {
            SentimentBand::Negative
        } else {
            SentimentBand::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentBand::Positive => "positive",
            SentimentBand::Neutral => "neutral",
            SentimentBand::Negative => "negative",
        }
    }
}

/// Per-topic results keyed by normalized label
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopicTable {
    topics: BTreeMap<String, TopicSummary>,
}

impl TopicTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a summary, replacing any existing entry with the same normalized label
    pub fn insert(&mut self, summary: TopicSummary) {
        self.topics
            .insert(normalize_label(&summary.topic_label), summary);
    }

    /// Look up a topic by any casing/spacing of its label
    pub fn get(&self, label: &str) -> Option<&TopicSummary> {
        self.topics.get(&normalize_label(label))
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Iterate in normalized-label order
    pub fn iter(&self) -> impl Iterator<Item = &TopicSummary> {
        self.topics.values()
    }

    /// Topics ordered by estimated time (largest first), then by label
    pub fn ranked(&self) -> Vec<&TopicSummary> {
        let mut ranked: Vec<&TopicSummary> = self.topics.values().collect();
        ranked.sort_by(|a, b| {
            b.estimated_minutes
                .total_cmp(&a.estimated_minutes)
                .then_with(|| a.topic_label.cmp(&b.topic_label))
        });
        ranked
    }

    pub fn total_word_count(&self) -> usize {
        self.topics.values().map(|t| t.total_word_count).sum()
    }

    pub fn total_minutes(&self) -> f64 {
        self.topics.values().map(|t| t.estimated_minutes).sum()
    }

    /// Word-weighted sentiment across the whole transcript
    pub fn overall_sentiment(&self) -> f64 {
        let total = self.total_word_count();
        if total == 0 {
            return 0.0;
        }
        let weighted: f64 = self
            .topics
            .values()
            .map(|t| t.aggregate_sentiment * t.total_word_count as f64)
            .sum();
        (weighted / total as f64).clamp(-1.0, 1.0)
    }

    pub fn most_positive(&self) -> Option<&TopicSummary> {
        self.ranked()
            .into_iter()
            .max_by(|a, b| a.aggregate_sentiment.total_cmp(&b.aggregate_sentiment))
    }

    pub fn largest(&self) -> Option<&TopicSummary> {
        self.ranked().into_iter().next()
    }
}

/// Grouping key for a label: trimmed, whitespace collapsed, lowercased
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Display form of a classifier label
///
/// Strips surrounding quotes and punctuation, collapses whitespace and keeps
/// at most [`MAX_LABEL_WORDS`] words. Returns `None` when nothing is left.
pub fn clean_label(label: &str) -> Option<String> {
    let words: Vec<&str> = label
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '&' && c != '-'))
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .take(MAX_LABEL_WORDS)
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}
