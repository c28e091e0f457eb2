use crate::error::PipelineError;
use crate::llm::ClassificationResponse;
use crate::models::clean_label;

/// Configuration for response validation
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Scores up to this far outside [-1, 1] are clamped instead of rejected
    pub score_tolerance: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            score_tolerance: 0.05,
        }
    }
}

/// A response that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedClassification {
    /// Cleaned label (at most two words), not yet admitted to the registry
    pub topic_label: String,
    /// Score clamped to [-1, 1]
    pub sentiment_score: f64,
    pub rationale: String,
}

/// Validate a classifier response against the rules
///
/// Every rule is checked so the log line lists all problems at once.
pub fn validate_response(
    response: &ClassificationResponse,
    config: &ValidationConfig,
) -> Result<ValidatedClassification, PipelineError> {
    let mut errors = Vec::new();

    // 1. Label must survive cleaning
    let label = response.topic_label.as_deref().and_then(clean_label);
    if label.is_none() {
        errors.push(format!(
            "missing or empty topic label: {:?}",
            response.topic_label
        ));
    }

    // 2. Score must be present, finite and (nearly) in range
    let limit = 1.0 + config.score_tolerance.max(0.0);
    let score = match response.sentiment_score {
        None => {
            errors.push("missing sentiment score".to_string());
            None
        }
        Some(s) if !s.is_finite() => {
            errors.push(format!("non-finite sentiment score: {s}"));
            None
        }
        Some(s) if s.abs() > limit => {
            errors.push(format!("sentiment score {s} outside [-1, 1]"));
            None
        }
        Some(s) => Some(s.clamp(-1.0, 1.0)),
    };

    match (label, score) {
        (Some(topic_label), Some(sentiment_score)) if errors.is_empty() => {
            Ok(ValidatedClassification {
                topic_label,
                sentiment_score,
                rationale: response
                    .rationale
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string(),
            })
        }
        _ => Err(PipelineError::MalformedResponse(errors.join("; "))),
    }
}
