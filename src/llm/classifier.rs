use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// What the classifier is asked about a single chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRequest {
    /// Chunk being classified
    pub chunk_index: usize,
    /// Chunk text
    pub chunk_text: String,
    /// Labels already in use, which the classifier should prefer
    pub known_labels: Vec<String>,
    /// Cap on distinct labels across the whole transcript
    pub max_topics: usize,
}

impl ClassificationRequest {
    /// Whether the label set is full, so only known labels may be used
    pub fn at_capacity(&self) -> bool {
        self.known_labels.len() >= self.max_topics
    }
}

/// Raw classifier answer; every field may be missing and is validated later
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    #[serde(default)]
    pub topic_label: Option<String>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub rationale: Option<String>,
}

impl ClassificationResponse {
    /// A fully populated response
    pub fn new(topic_label: &str, sentiment_score: f64, rationale: &str) -> Self {
        Self {
            topic_label: Some(topic_label.to_string()),
            sentiment_score: Some(sentiment_score),
            rationale: Some(rationale.to_string()),
        }
    }
}

/// External text-understanding capability
///
/// Implementations issue one outbound request per call and keep no state
/// between calls. Network failures, rate limits and timeouts surface as
/// [`PipelineError::TransientService`]; unusable payloads as
/// [`PipelineError::MalformedResponse`].
#[async_trait::async_trait]
pub trait TopicClassifier: Send + Sync {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResponse, PipelineError>;
}

#[async_trait::async_trait]
impl<T: TopicClassifier + ?Sized> TopicClassifier for std::sync::Arc<T> {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResponse, PipelineError> {
        (**self).classify(request).await
    }
}
