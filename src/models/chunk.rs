use serde::{Deserialize, Serialize};

/// Configuration for paragraph chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Chunks below this many words are merged into their neighbour
    pub min_words: usize,
    /// Paragraphs longer than this are cut into segments of at most this many words
    pub max_words: Option<usize>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            min_words: 40,
            max_words: Some(180),
        }
    }
}

/// A contiguous, word-counted slice of the cleaned transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 1-based position in the transcript
    pub index: usize,
    /// Chunk text; merged paragraphs keep a blank line between them
    pub text: String,
    /// Whitespace-delimited word count of `text`
    pub word_count: usize,
}

impl Chunk {
    pub fn new(index: usize, text: String) -> Self {
        let word_count = text.split_whitespace().count();
        Self {
            index,
            text,
            word_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_counts_words() {
        let chunk = Chunk::new(1, "Revenue grew  nine percent\n\nyear over year".to_string());
        assert_eq!(chunk.word_count, 7);
        assert_eq!(chunk.index, 1);
    }

    #[test]
    fn test_chunk_config_default() {
        let config = ChunkConfig::default();
        assert_eq!(config.min_words, 40);
        assert_eq!(config.max_words, Some(180));
    }
}
