use std::path::Path;

use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::error::PipelineError;
use crate::io::{ObservationCache, ReportMetadata, fingerprint, load_transcript};
use crate::llm::{LabelRegistry, TopicClassifier};
use crate::models::{Chunk, Transcript, TopicTable, clean_label};
use crate::stages::{
    AggregateConfig, ChunkSet, ClassificationOutcome, CleanConfig, SentimentClient, aggregate,
};

/// Everything the analysis produced, ready for rendering
#[derive(Debug)]
pub struct PipelineOutput {
    pub transcript: Transcript,
    pub chunk_count: usize,
    pub outcome: ClassificationOutcome,
    pub table: TopicTable,
    /// Observations came from the cache instead of the classifier
    pub from_cache: bool,
}

impl PipelineOutput {
    pub fn transcript_words(&self) -> usize {
        self.transcript.word_count()
    }

    pub fn metadata(&self, config: &AnalysisConfig) -> ReportMetadata {
        ReportMetadata {
            total_words: self.transcript_words(),
            chunk_count: self.chunk_count,
            chunks_classified: self.outcome.observations.len(),
            chunks_dropped: self.outcome.dropped_count(),
            words_per_minute: config.words_per_minute,
            max_topics: config.max_topics,
            total_minutes: self.table.total_minutes(),
            overall_sentiment: self.table.overall_sentiment(),
            served_from_cache: self.from_cache,
        }
    }
}

/// Load, chunk, classify and aggregate one transcript
///
/// When `cache` is given, observations matching the transcript and settings
/// are reused. Chunks the cached run dropped are classified again. The cache
/// is written only once aggregation succeeds. Cache I/O problems are logged
/// and never fail the run.
pub async fn run_pipeline<C: TopicClassifier>(
    path: &Path,
    client: &SentimentClient<C>,
    config: &AnalysisConfig,
    cache: Option<&Path>,
) -> Result<PipelineOutput, PipelineError> {
    config.validate()?;

    info!("Loading transcript from {:?}", path);
    let transcript = load_transcript(path, &CleanConfig::default())?;
    info!(
        "Loaded {} words in {} paragraphs",
        transcript.word_count(),
        transcript.paragraph_count()
    );

    let chunk_set = ChunkSet::from_transcript(&transcript, config.chunk.clone())?;
    let chunks: Vec<Chunk> = chunk_set.iter().collect();
    info!("Stage 1: {} chunks", chunks.len());

    let key = fingerprint(&transcript.cleaned, config);

    let cached = match cache {
        Some(cache_path) if !config.force_refresh => {
            match ObservationCache::load_if_fresh(cache_path, &key) {
                Ok(found) => found,
                Err(e) => {
                    warn!("Ignoring unreadable cache: {:#}", e);
                    None
                }
            }
        }
        Some(_) => {
            info!("Cache bypassed (force refresh)");
            None
        }
        None => None,
    };

    let (outcome, from_cache, changed) = match cached {
        Some(entry) if entry.dropped_chunks.is_empty() => {
            info!(
                "Stage 2: reusing {} cached observations from {}",
                entry.observations.len(),
                entry.created_at
            );
            (entry.into_outcome(), true, false)
        }
        Some(entry) => {
            info!(
                "Stage 2: reusing {} cached observations, retrying {} dropped chunks",
                entry.observations.len(),
                entry.dropped_chunks.len()
            );
            let (outcome, changed) =
                retry_dropped(client, &chunks, entry.into_outcome(), config.max_topics).await;
            (outcome, true, changed)
        }
        None => {
            let registry = LabelRegistry::with_labels(
                config.max_topics,
                config.custom_topics.iter().filter_map(|t| clean_label(t)),
            );
            if !registry.is_empty() {
                info!("Seeded {} custom topics", registry.len());
            }
            (client.classify_with_registry(&chunks, &registry).await?, false, true)
        }
    };

    let table = aggregate(
        &outcome.observations,
        &AggregateConfig {
            words_per_minute: config.words_per_minute,
        },
    )?;

    if let Some(cache_path) = cache.filter(|_| changed) {
        let entry = ObservationCache::new(key, &config.model_name, config.max_topics, &outcome);
        if let Err(e) = entry.write(cache_path) {
            warn!("Failed to write cache: {:#}", e);
        }
    }

    Ok(PipelineOutput {
        transcript,
        chunk_count: chunks.len(),
        outcome,
        table,
        from_cache,
    })
}

/// Classify the chunks a cached run dropped, seeded with its labels
///
/// Returns the merged outcome and whether anything was recovered. Any error
/// leaves the cached outcome untouched.
async fn retry_dropped<C: TopicClassifier>(
    client: &SentimentClient<C>,
    chunks: &[Chunk],
    cached: ClassificationOutcome,
    max_topics: usize,
) -> (ClassificationOutcome, bool) {
    let pending: Vec<Chunk> = chunks
        .iter()
        .filter(|c| cached.dropped_chunks.contains(&c.index))
        .cloned()
        .collect();
    let registry = LabelRegistry::with_labels(max_topics, &cached.labels);

    let retried = match client.classify_with_registry(&pending, &registry).await {
        Ok(retried) => retried,
        Err(e) => {
            warn!("Retry of dropped chunks failed, keeping cached result: {}", e);
            return (cached, false);
        }
    };
    if retried.observations.is_empty() {
        return (cached, false);
    }

    let mut observations = cached.observations;
    observations.extend(retried.observations);
    observations.sort_by_key(|o| o.chunk_index);

    let outcome = ClassificationOutcome {
        observations,
        dropped_chunks: retried.dropped_chunks,
        labels: retried.labels,
    };
    (outcome, true)
}
