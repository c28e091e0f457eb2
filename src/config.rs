use std::time::Duration;

use crate::error::PipelineError;
use crate::llm::DEFAULT_MODEL;
use crate::models::{ChunkConfig, clean_label};

/// Run-wide configuration for the analysis pipeline
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Speaking rate used to turn word counts into minutes
    pub words_per_minute: u32,
    /// Cap on distinct topic labels across the transcript
    pub max_topics: usize,
    /// Classifier model variant
    pub model_name: String,
    /// Maximum classification requests in flight
    pub max_chunk_workers: usize,
    /// Chunking thresholds
    pub chunk: ChunkConfig,
    /// Per-attempt classifier timeout
    pub request_timeout: Duration,
    /// Total attempts per chunk for transient failures
    pub max_attempts: u32,
    /// Base delay for exponential back-off
    pub backoff_base_ms: u64,
    /// How far outside [-1, 1] a score may be and still be clamped
    pub score_tolerance: f64,
    /// Ignore cached observations even if they match
    pub force_refresh: bool,
    /// Labels registered before the first chunk is classified
    pub custom_topics: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 155,
            max_topics: 10,
            model_name: DEFAULT_MODEL.to_string(),
            max_chunk_workers: 4,
            chunk: ChunkConfig::default(),
            request_timeout: Duration::from_secs(45),
            max_attempts: 3,
            backoff_base_ms: 500,
            score_tolerance: 0.05,
            force_refresh: false,
            custom_topics: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut errors = Vec::new();

        if self.words_per_minute == 0 {
            errors.push("words_per_minute must be at least 1".to_string());
        }
        if !(1..=50).contains(&self.max_topics) {
            errors.push(format!("max_topics must be in 1..=50, got {}", self.max_topics));
        }
        if !(1..=16).contains(&self.max_chunk_workers) {
            errors.push(format!(
                "max_chunk_workers must be in 1..=16, got {}",
                self.max_chunk_workers
            ));
        }
        if self.model_name.trim().is_empty() {
            errors.push("model_name must not be empty".to_string());
        }
        if self.chunk.max_words == Some(0) {
            errors.push("max chunk words must be at least 1".to_string());
        }
        if self.max_attempts == 0 {
            errors.push("max_attempts must be at least 1".to_string());
        }
        if self.request_timeout.is_zero() {
            errors.push("request_timeout must be positive".to_string());
        }
        if !self.score_tolerance.is_finite() || self.score_tolerance < 0.0 {
            errors.push(format!(
                "score_tolerance must be a non-negative number, got {}",
                self.score_tolerance
            ));
        }

        if self.custom_topics.len() > self.max_topics {
            errors.push(format!(
                "{} custom topics exceed max_topics {}",
                self.custom_topics.len(),
                self.max_topics
            ));
        }
        if let Some(bad) = self.custom_topics.iter().find(|t| clean_label(t).is_none()) {
            errors.push(format!("custom topic {:?} has no usable words", bad));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Config(errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.words_per_minute, 155);
        assert_eq!(config.max_topics, 10);
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_rejects_zero_wpm_and_topics() {
        let config = AnalysisConfig {
            words_per_minute: 0,
            max_topics: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err().to_string();

        assert!(err.contains("words_per_minute"));
        assert!(err.contains("max_topics"));
    }

    #[test]
    fn test_rejects_excessive_workers() {
        let config = AnalysisConfig {
            max_chunk_workers: 64,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_custom_topics_must_fit_the_cap() {
        let config = AnalysisConfig {
            max_topics: 2,
            custom_topics: vec!["Revenue".into(), "Costs".into(), "Guidance".into()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("custom topics"));

        let config = AnalysisConfig {
            custom_topics: vec!["--".into()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }
}
