use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::error::PipelineError;
use crate::llm::{
    Admission, ClassificationRequest, LabelRegistry, TopicClassifier, ValidationConfig,
    retry_with_backoff, validate_response,
};
use crate::models::{Chunk, TopicObservation};

/// Configuration for Stage 2
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    /// Maximum requests in flight
    pub max_chunk_workers: usize,
    /// Per-attempt timeout; expiry counts as a transient failure
    pub request_timeout: Duration,
    /// Total attempts per chunk for transient failures
    pub max_attempts: u32,
    /// Base delay for exponential back-off
    pub backoff_base_ms: u64,
    /// Response validation configuration
    pub validation: ValidationConfig,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for ClassifyConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            max_chunk_workers: config.max_chunk_workers,
            request_timeout: config.request_timeout,
            max_attempts: config.max_attempts,
            backoff_base_ms: config.backoff_base_ms,
            validation: ValidationConfig {
                score_tolerance: config.score_tolerance,
            },
        }
    }
}

/// Result of Stage 2 processing
#[derive(Debug, Clone, Default)]
pub struct ClassificationOutcome {
    /// One observation per successfully classified chunk, in chunk order
    pub observations: Vec<TopicObservation>,
    /// Chunks dropped because of malformed responses
    pub dropped_chunks: Vec<usize>,
    /// Final label set in registration order
    pub labels: Vec<String>,
}

impl ClassificationOutcome {
    pub fn dropped_count(&self) -> usize {
        self.dropped_chunks.len()
    }
}

/// Sentiment client: classifies chunks through a [`TopicClassifier`]
///
/// Adds the policy around the raw capability: per-attempt timeouts, bounded
/// retries for transient failures, response validation and the topic cap.
pub struct SentimentClient<C> {
    classifier: C,
    config: ClassifyConfig,
}

impl<C: TopicClassifier> SentimentClient<C> {
    pub fn new(classifier: C, config: ClassifyConfig) -> Self {
        Self { classifier, config }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn config(&self) -> &ClassifyConfig {
        &self.config
    }

    /// Classify one chunk, admitting its label through `labels`
    pub async fn classify(
        &self,
        chunk: &Chunk,
        labels: &LabelRegistry,
    ) -> Result<TopicObservation, PipelineError> {
        let timeout = self.config.request_timeout;

        let response = retry_with_backoff(
            self.config.max_attempts,
            self.config.backoff_base_ms,
            |attempt| {
                let request = ClassificationRequest {
                    chunk_index: chunk.index,
                    chunk_text: chunk.text.clone(),
                    known_labels: labels.snapshot(),
                    max_topics: labels.max_topics(),
                };
                async move {
                    if attempt > 1 {
                        info!("Chunk {}: attempt {}", request.chunk_index, attempt);
                    }
                    match tokio::time::timeout(timeout, self.classifier.classify(&request)).await {
                        Ok(result) => result,
                        Err(_) => Err(PipelineError::TransientService(format!(
                            "chunk {} timed out after {:?}",
                            request.chunk_index, timeout
                        ))),
                    }
                }
            },
        )
        .await?;

        let validated = validate_response(&response, &self.config.validation).map_err(|e| {
            PipelineError::MalformedResponse(format!("chunk {}: {}", chunk.index, e))
        })?;

        let admission = labels.admit(&validated.topic_label);
        if let Admission::Redirected { proposed, label } = &admission {
            warn!(
                "Chunk {}: topic cap reached, mapped {:?} onto {:?}",
                chunk.index, proposed, label
            );
        }

        debug!(
            chunk = chunk.index,
            label = admission.label(),
            score = validated.sentiment_score,
            "chunk classified"
        );

        Ok(TopicObservation {
            chunk_index: chunk.index,
            topic_label: admission.label().to_string(),
            sentiment_score: validated.sentiment_score,
            rationale: validated.rationale,
            word_count: chunk.word_count,
        })
    }

    /// Classify every chunk under a fresh label registry capped at `max_topics`
    pub async fn classify_all(
        &self,
        chunks: &[Chunk],
        max_topics: usize,
    ) -> Result<ClassificationOutcome, PipelineError> {
        let registry = LabelRegistry::new(max_topics);
        self.classify_with_registry(chunks, &registry).await
    }

    /// Classify every chunk against an existing registry
    ///
    /// Malformed responses drop their chunk and the run continues; any other
    /// error aborts the run and cancels requests still in flight.
    pub async fn classify_with_registry(
        &self,
        chunks: &[Chunk],
        registry: &LabelRegistry,
    ) -> Result<ClassificationOutcome, PipelineError> {
        let workers = self.config.max_chunk_workers.max(1);

        info!(
            "Stage 2: Classifying {} chunks ({} workers, max {} topics)",
            chunks.len(),
            workers,
            registry.max_topics()
        );

        let mut results = std::pin::pin!(
            stream::iter(chunks)
                .map(|chunk| async move { (chunk.index, self.classify(chunk, registry).await) })
                .buffered(workers)
        );

        let mut outcome = ClassificationOutcome::default();

        while let Some((index, result)) = results.next().await {
            match result {
                Ok(observation) => {
                    info!(
                        "Chunk {}: {} ({:+.2}, {} words)",
                        index,
                        observation.topic_label,
                        observation.sentiment_score,
                        observation.word_count
                    );
                    outcome.observations.push(observation);
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Chunk {} dropped: {}", index, e);
                    outcome.dropped_chunks.push(index);
                }
                Err(e) => {
                    warn!("Chunk {} failed, aborting run: {}", index, e);
                    return Err(e);
                }
            }
        }

        outcome.labels = registry.snapshot();

        info!(
            "Stage 2: {} observations, {} dropped, {} topics",
            outcome.observations.len(),
            outcome.dropped_count(),
            outcome.labels.len()
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ClassificationResponse, ScriptedClassifier, ScriptedReply};

    fn chunks(counts: &[usize]) -> Vec<Chunk> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &n)| Chunk::new(i + 1, vec!["word"; n].join(" ")))
            .collect()
    }

    fn fast_config() -> ClassifyConfig {
        ClassifyConfig {
            backoff_base_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_config_default() {
        let config = ClassifyConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.max_chunk_workers, 4);
        assert_eq!(config.request_timeout, Duration::from_secs(45));
    }

    #[tokio::test]
    async fn test_classify_builds_observation() {
        let classifier = ScriptedClassifier::from_topics(&[("Revenue", 0.5)]);
        let client = SentimentClient::new(classifier, fast_config());
        let registry = LabelRegistry::new(10);

        let observation = client.classify(&chunks(&[12])[0], &registry).await.unwrap();

        assert_eq!(observation.chunk_index, 1);
        assert_eq!(observation.topic_label, "Revenue");
        assert_eq!(observation.sentiment_score, 0.5);
        assert_eq!(observation.word_count, 12);
        assert_eq!(registry.snapshot(), vec!["Revenue"]);
    }

    #[tokio::test]
    async fn test_known_labels_are_sent_with_requests() {
        let classifier = ScriptedClassifier::from_topics(&[("Revenue", 0.5), ("Costs", -0.2)]);
        let client = SentimentClient::new(
            classifier,
            ClassifyConfig {
                max_chunk_workers: 1,
                ..fast_config()
            },
        );

        client.classify_all(&chunks(&[10, 10]), 5).await.unwrap();

        let requests = client.classifier().requests();
        assert!(requests[0].known_labels.is_empty());
        assert_eq!(requests[1].known_labels, vec!["Revenue"]);
        assert_eq!(requests[1].max_topics, 5);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let classifier = ScriptedClassifier::new();
        classifier.script(
            1,
            vec![
                ScriptedReply::Transient("429".to_string()),
                ScriptedReply::Transient("503".to_string()),
                ScriptedReply::Respond(ClassificationResponse::new("Guidance", 0.3, "ok")),
            ],
        );
        let client = SentimentClient::new(classifier, fast_config());

        let outcome = client.classify_all(&chunks(&[20]), 10).await.unwrap();

        assert_eq!(outcome.observations.len(), 1);
        assert_eq!(client.classifier().call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_abort_the_run() {
        let classifier = ScriptedClassifier::new()
            .with_fallback(ScriptedReply::Transient("connection reset".to_string()));
        let client = SentimentClient::new(classifier, fast_config());

        let result = client.classify_all(&chunks(&[20]), 10).await;

        assert!(matches!(result, Err(PipelineError::TransientService(_))));
        assert_eq!(client.classifier().call_count(), 3);
    }

    #[tokio::test]
    async fn test_rejection_aborts_without_retry() {
        let classifier =
            ScriptedClassifier::new().with_fallback(ScriptedReply::Rejected("401".to_string()));
        let client = SentimentClient::new(classifier, fast_config());

        let result = client.classify_all(&chunks(&[20]), 10).await;

        assert!(matches!(result, Err(PipelineError::ServiceRejected(_))));
        assert_eq!(client.classifier().call_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_dropped() {
        let classifier = ScriptedClassifier::from_topics(&[("Revenue", 0.5), ("Revenue", -0.2), ("Costs", -0.8)]);
        classifier.script(
            2,
            vec![ScriptedReply::Respond(ClassificationResponse {
                topic_label: Some("Revenue".to_string()),
                sentiment_score: None,
                rationale: Some("no score".to_string()),
            })],
        );
        let client = SentimentClient::new(classifier, fast_config());

        let outcome = client.classify_all(&chunks(&[30, 30, 30]), 10).await.unwrap();

        assert_eq!(outcome.observations.len(), 2);
        assert_eq!(outcome.dropped_chunks, vec![2]);
        assert_eq!(client.classifier().call_count(), 3);
    }

    #[tokio::test]
    async fn test_timeout_is_transient() {
        struct Stalled;

        #[async_trait::async_trait]
        impl TopicClassifier for Stalled {
            async fn classify(
                &self,
                _request: &ClassificationRequest,
            ) -> Result<ClassificationResponse, PipelineError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(ClassificationResponse::new("Late", 0.0, ""))
            }
        }

        let client = SentimentClient::new(
            Stalled,
            ClassifyConfig {
                request_timeout: Duration::from_millis(10),
                max_attempts: 2,
                ..fast_config()
            },
        );

        let result = client.classify(&chunks(&[5])[0], &LabelRegistry::new(3)).await;
        assert!(matches!(result, Err(PipelineError::TransientService(_))));
    }

    #[tokio::test]
    async fn test_topic_cap_is_enforced() {
        let topics: Vec<(String, f64)> = (0..12).map(|i| (format!("Topic{i}"), 0.1)).collect();
        let topic_refs: Vec<(&str, f64)> = topics.iter().map(|(l, s)| (l.as_str(), *s)).collect();
        let client = SentimentClient::new(ScriptedClassifier::from_topics(&topic_refs), fast_config());

        let outcome = client.classify_all(&chunks(&[10; 12]), 4).await.unwrap();

        let mut distinct: Vec<&str> = outcome
            .observations
            .iter()
            .map(|o| o.topic_label.as_str())
            .collect();
        distinct.sort();
        distinct.dedup();
        assert!(distinct.len() <= 4);
        assert_eq!(outcome.labels.len(), 4);
        assert_eq!(outcome.observations.len(), 12);
    }
}
