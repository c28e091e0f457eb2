use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::PipelineError;
use crate::llm::{ClassificationRequest, ClassificationResponse, TopicClassifier};

/// One scripted outcome for a classification attempt
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Respond(ClassificationResponse),
    Transient(String),
    Malformed(String),
    Rejected(String),
}

/// Deterministic test classifier: replays scripted replies per chunk index
///
/// Each chunk has a queue of replies consumed one per attempt; the last reply
/// repeats once the queue is down to one entry. Chunks without a script get
/// the fallback reply.
pub struct ScriptedClassifier {
    scripts: Mutex<HashMap<usize, Vec<ScriptedReply>>>,
    fallback: ScriptedReply,
    requests: Mutex<Vec<ClassificationRequest>>,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback: ScriptedReply::Respond(ClassificationResponse::new(
                "General",
                0.0,
                "scripted fallback",
            )),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer chunks 1..=n with the given (label, score) pairs
    pub fn from_topics(topics: &[(&str, f64)]) -> Self {
        let classifier = Self::new();
        for (i, (label, score)) in topics.iter().enumerate() {
            classifier.script(
                i + 1,
                vec![ScriptedReply::Respond(ClassificationResponse::new(
                    label,
                    *score,
                    &format!("scripted rationale for chunk {}", i + 1),
                ))],
            );
        }
        classifier
    }

    pub fn with_fallback(mut self, reply: ScriptedReply) -> Self {
        self.fallback = reply;
        self
    }

    /// Replace the reply queue for a chunk
    pub fn script(&self, chunk_index: usize, replies: Vec<ScriptedReply>) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chunk_index, replies);
    }

    /// Every request received, in arrival order
    pub fn requests(&self) -> Vec<ClassificationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn next_reply(&self, chunk_index: usize) -> ScriptedReply {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        match scripts.get_mut(&chunk_index) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) if queue.len() == 1 => queue[0].clone(),
            _ => self.fallback.clone(),
        }
    }
}

impl Default for ScriptedClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TopicClassifier for ScriptedClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResponse, PipelineError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        match self.next_reply(request.chunk_index) {
            ScriptedReply::Respond(response) => Ok(response),
            ScriptedReply::Transient(msg) => Err(PipelineError::TransientService(msg)),
            ScriptedReply::Malformed(msg) => Err(PipelineError::MalformedResponse(msg)),
            ScriptedReply::Rejected(msg) => Err(PipelineError::ServiceRejected(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(chunk_index: usize) -> ClassificationRequest {
        ClassificationRequest {
            chunk_index,
            chunk_text: "text".to_string(),
            known_labels: vec![],
            max_topics: 10,
        }
    }

    #[tokio::test]
    async fn test_replays_queue_then_repeats_last() {
        let classifier = ScriptedClassifier::new();
        classifier.script(
            1,
            vec![
                ScriptedReply::Transient("busy".to_string()),
                ScriptedReply::Respond(ClassificationResponse::new("Revenue", 0.4, "ok")),
            ],
        );

        assert!(classifier.classify(&request(1)).await.is_err());
        let second = classifier.classify(&request(1)).await.unwrap();
        let third = classifier.classify(&request(1)).await.unwrap();

        assert_eq!(second, third);
        assert_eq!(second.topic_label.as_deref(), Some("Revenue"));
        assert_eq!(classifier.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unscripted_chunk_uses_fallback() {
        let classifier = ScriptedClassifier::from_topics(&[("Revenue", 0.5)]);

        let response = classifier.classify(&request(9)).await.unwrap();
        assert_eq!(response.topic_label.as_deref(), Some("General"));
    }
}
