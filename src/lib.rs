pub mod config;
pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod stages;

pub use config::AnalysisConfig;
pub use error::PipelineError;
pub use io::{
    HumanReport, ObservationCache, ReportMetadata, TopicReport, load_transcript, parse_transcript,
};
pub use llm::{
    AnthropicClient, AnthropicConfig, ScriptedClassifier, ScriptedReply, TopicClassifier,
};
pub use models::{Chunk, ChunkConfig, TopicObservation, TopicSummary, TopicTable, Transcript};
pub use pipeline::{PipelineOutput, run_pipeline};
pub use stages::{
    AggregateConfig, ChunkSet, ClassificationOutcome, ClassifyConfig, CleanConfig, RenderConfig,
    SentimentClient, aggregate, clean_text, execute_render,
};
