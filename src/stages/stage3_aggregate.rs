use std::collections::BTreeMap;

use tracing::info;

use crate::error::PipelineError;
use crate::models::{TopicObservation, TopicSummary, TopicTable, normalize_label};

/// Configuration for Stage 3
#[derive(Debug, Clone)]
pub struct AggregateConfig {
    /// Speaking rate used for the time estimate
    pub words_per_minute: u32,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 155,
        }
    }
}

/// Running totals for one topic
struct TopicAccumulator<'a> {
    label: &'a str,
    total_words: usize,
    weighted_sum: f64,
    score_sum: f64,
    count: usize,
    /// (word_count, rationale) of the largest constituent so far
    representative: (usize, &'a str),
    chunk_indices: Vec<usize>,
}

impl<'a> TopicAccumulator<'a> {
    fn new(observation: &'a TopicObservation) -> Self {
        Self {
            label: observation.topic_label.trim(),
            total_words: 0,
            weighted_sum: 0.0,
            score_sum: 0.0,
            count: 0,
            representative: (observation.word_count, observation.rationale.as_str()),
            chunk_indices: Vec::new(),
        }
    }

    /// Observations must arrive in ascending chunk order so ties keep the earliest
    fn add(&mut self, observation: &'a TopicObservation) {
        self.total_words += observation.word_count;
        self.weighted_sum += observation.sentiment_score * observation.word_count as f64;
        self.score_sum += observation.sentiment_score;
        self.count += 1;
        if observation.word_count > self.representative.0 {
            self.representative = (observation.word_count, observation.rationale.as_str());
        }
        self.chunk_indices.push(observation.chunk_index);
    }

    fn finish(self, words_per_minute: u32) -> TopicSummary {
        let sentiment = if self.total_words > 0 {
            self.weighted_sum / self.total_words as f64
        } else {
            self.score_sum / self.count.max(1) as f64
        };

        TopicSummary {
            topic_label: self.label.split_whitespace().collect::<Vec<_>>().join(" "),
            total_word_count: self.total_words,
            estimated_minutes: estimate_minutes(self.total_words, words_per_minute),
            aggregate_sentiment: sentiment.clamp(-1.0, 1.0),
            representative_rationale: self.representative.1.to_string(),
            chunk_indices: self.chunk_indices,
        }
    }
}

/// Convert a word count into minutes of speech
pub fn estimate_minutes(word_count: usize, words_per_minute: u32) -> f64 {
    word_count as f64 / words_per_minute.max(1) as f64
}

/// Execute Stage 3: group observations into per-topic summaries
///
/// Labels are grouped after trimming, whitespace folding and casefolding; the
/// first form seen in chunk order is kept for display. Sentiment is the
/// word-count weighted mean, clamped to [-1, 1]. The representative rationale
/// comes from the largest chunk, earliest chunk on ties. Output is a pure
/// function of the observation set, independent of input order.
pub fn aggregate(
    observations: &[TopicObservation],
    config: &AggregateConfig,
) -> Result<TopicTable, PipelineError> {
    if observations.is_empty() {
        return Err(PipelineError::EmptyResult);
    }

    let mut ordered: Vec<&TopicObservation> = observations.iter().collect();
    ordered.sort_by_key(|o| o.chunk_index);

    let mut groups: BTreeMap<String, TopicAccumulator<'_>> = BTreeMap::new();
    for observation in ordered {
        groups
            .entry(normalize_label(&observation.topic_label))
            .or_insert_with(|| TopicAccumulator::new(observation))
            .add(observation);
    }

    let mut table = TopicTable::new();
    for accumulator in groups.into_values() {
        table.insert(accumulator.finish(config.words_per_minute));
    }

    info!(
        "Stage 3: {} observations aggregated into {} topics ({:.1} min)",
        observations.len(),
        table.len(),
        table.total_minutes()
    );

    Ok(table)
}
