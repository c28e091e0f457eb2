use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::models::TopicObservation;
use crate::stages::ClassificationOutcome;

/// Default cache file name inside the output directory
pub const DEFAULT_CACHE_FILE: &str = "llm_analysis_cache.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationCache {
    /// Digest of everything the observations depend on
    pub fingerprint: String,
    pub model: String,
    pub max_topics: usize,
    pub created_at: DateTime<Utc>,
    pub observations: Vec<TopicObservation>,
    pub dropped_chunks: Vec<usize>,
    pub labels: Vec<String>,
}

/// SHA-256 over the cleaned text and every setting that shapes the observations
pub fn fingerprint(cleaned: &str, config: &AnalysisConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cleaned.as_bytes());
    hasher.update([0u8]);
    hasher.update(config.chunk.min_words.to_le_bytes());
    match config.chunk.max_words {
        Some(max) => hasher.update(max.to_le_bytes()),
        None => hasher.update(b"unbounded"),
    }
    hasher.update([0u8]);
    hasher.update(config.model_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(config.max_topics.to_le_bytes());
    hasher.update(config.score_tolerance.to_bits().to_le_bytes());
    for topic in &config.custom_topics {
        hasher.update([0u8]);
        hasher.update(topic.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

impl ObservationCache {
    pub fn new(
        fingerprint: String,
        model: &str,
        max_topics: usize,
        outcome: &ClassificationOutcome,
    ) -> Self {
        Self {
            fingerprint,
            model: model.to_string(),
            max_topics,
            created_at: Utc::now(),
            observations: outcome.observations.clone(),
            dropped_chunks: outcome.dropped_chunks.clone(),
            labels: outcome.labels.clone(),
        }
    }

    /// Load the cache at `path` if it exists and matches `fingerprint`
    pub fn load_if_fresh(path: &Path, fingerprint: &str) -> Result<Option<Self>> {
        if !path.exists() {
            debug!("No cache at {:?}", path);
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache: {:?}", path))?;
        let cache: ObservationCache = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cache: {:?}", path))?;

        if cache.fingerprint != fingerprint {
            info!("Cache at {:?} is stale, ignoring", path);
            return Ok(None);
        }

        Ok(Some(cache))
    }

    /// Write to a JSON file, creating parent directories as needed
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write cache JSON")?;
        Ok(())
    }

    /// Delete the cache file; returns whether one existed
    pub fn clear(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path).with_context(|| format!("Failed to remove cache: {:?}", path))?;
        Ok(true)
    }

    pub fn into_outcome(self) -> ClassificationOutcome {
        ClassificationOutcome {
            observations: self.observations,
            dropped_chunks: self.dropped_chunks,
            labels: self.labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkConfig;

    fn outcome() -> ClassificationOutcome {
        ClassificationOutcome {
            observations: vec![TopicObservation {
                chunk_index: 1,
                topic_label: "Revenue".to_string(),
                sentiment_score: 0.5,
                rationale: "growth".to_string(),
                word_count: 300,
            }],
            dropped_chunks: vec![2],
            labels: vec!["Revenue".to_string()],
        }
    }

    #[test]
    fn test_fingerprint_tracks_inputs() {
        let config = AnalysisConfig::default();
        let base = fingerprint("text", &config);

        assert_eq!(base, fingerprint("text", &config.clone()));
        assert_eq!(base.len(), 64);
        assert_ne!(base, fingerprint("text!", &config));

        let variants = [
            AnalysisConfig {
                model_name: "model-b".to_string(),
                ..config.clone()
            },
            AnalysisConfig {
                max_topics: 8,
                ..config.clone()
            },
            AnalysisConfig {
                chunk: ChunkConfig {
                    max_words: None,
                    ..ChunkConfig::default()
                },
                ..config.clone()
            },
            AnalysisConfig {
                score_tolerance: 0.1,
                ..config.clone()
            },
            AnalysisConfig {
                custom_topics: vec!["Revenue".to_string()],
                ..config.clone()
            },
        ];
        for variant in &variants {
            assert_ne!(base, fingerprint("text", variant));
        }
    }

    #[test]
    fn test_fingerprint_ignores_output_only_settings() {
        let config = AnalysisConfig::default();
        let other = AnalysisConfig {
            words_per_minute: 120,
            max_chunk_workers: 1,
            force_refresh: true,
            ..config.clone()
        };

        assert_eq!(fingerprint("text", &config), fingerprint("text", &other));
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let cache = ObservationCache::new("abc".to_string(), "model-a", 10, &outcome());
        cache.write(&path).unwrap();

        let loaded = ObservationCache::load_if_fresh(&path, "abc").unwrap().unwrap();
        let restored = loaded.into_outcome();
        assert_eq!(restored.observations, outcome().observations);
        assert_eq!(restored.dropped_chunks, vec![2]);
        assert_eq!(restored.labels, vec!["Revenue".to_string()]);
    }

    #[test]
    fn test_stale_or_missing_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        assert!(ObservationCache::load_if_fresh(&path, "abc").unwrap().is_none());

        ObservationCache::new("abc".to_string(), "model-a", 10, &outcome())
            .write(&path)
            .unwrap();
        assert!(ObservationCache::load_if_fresh(&path, "other").unwrap().is_none());
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        assert!(!ObservationCache::clear(&path).unwrap());
        std::fs::write(&path, "{}").unwrap();
        assert!(ObservationCache::clear(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(ObservationCache::load_if_fresh(&path, "abc").is_err());
    }
}
