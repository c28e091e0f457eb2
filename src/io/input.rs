use std::path::Path;

use tracing::debug;

use crate::error::PipelineError;
use crate::models::Transcript;
use crate::stages::{CleanConfig, clean_text};

/// Read and clean a transcript file
///
/// Fails with [`PipelineError::Input`] when the file cannot be read as UTF-8
/// or when nothing but markup and boilerplate remains after cleaning.
pub fn load_transcript(path: &Path, config: &CleanConfig) -> Result<Transcript, PipelineError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::Input(format!("failed to read transcript {}: {e}", path.display()))
    })?;

    let transcript = parse_transcript(raw, config).map_err(|e| match e {
        PipelineError::Input(msg) => PipelineError::Input(format!("{}: {msg}", path.display())),
        other => other,
    })?;

    Ok(Transcript {
        source: Some(path.to_path_buf()),
        ..transcript
    })
}

/// Clean an in-memory transcript
pub fn parse_transcript(raw: String, config: &CleanConfig) -> Result<Transcript, PipelineError> {
    let cleaned = clean_text(&raw, config);
    let transcript = Transcript::new(None, raw, cleaned);

    let words = transcript.word_count();
    if words == 0 {
        return Err(PipelineError::Input(
            "transcript contains no words after cleaning".to_string(),
        ));
    }

    debug!(
        raw_bytes = transcript.raw.len(),
        words,
        paragraphs = transcript.paragraph_count(),
        "transcript cleaned"
    );

    Ok(transcript)
}
