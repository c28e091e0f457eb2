use thiserror::Error;

/// Failure taxonomy for the analysis pipeline.
///
/// Only [`PipelineError::MalformedResponse`] is recoverable: the offending chunk
/// is dropped and counted. Everything else aborts the run before any report is
/// written.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unreadable, empty or otherwise unusable transcript
    #[error("input error: {0}")]
    Input(String),

    /// Network failure, rate limit or timeout talking to the classifier
    #[error("transient service error: {0}")]
    TransientService(String),

    /// Classifier answered, but the payload is unusable for this chunk
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Classifier refused the request (auth, bad request); retrying won't help
    #[error("service rejected request: {0}")]
    ServiceRejected(String),

    #[error("no usable topic observations survived classification")]
    EmptyResult,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Whether a retry after back-off could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::TransientService(_))
    }

    /// Whether the chunk should be dropped while the run continues
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::MalformedResponse(_))
    }
}
