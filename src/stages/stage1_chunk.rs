use std::collections::VecDeque;
use std::str::{Split, SplitWhitespace};
use std::sync::Arc;

use crate::error::PipelineError;
use crate::models::{Chunk, ChunkConfig, Transcript};

/// Lazily chunked view over a cleaned transcript
///
/// Holds a shared reference to the cleaned text, so [`ChunkSet::iter`] can be
/// called any number of times without touching the source again.
#[derive(Debug, Clone)]
pub struct ChunkSet {
    text: Arc<str>,
    config: ChunkConfig,
}

impl ChunkSet {
    /// Build a chunk set, failing if the text yields no chunks at all
    pub fn new(text: Arc<str>, config: ChunkConfig) -> Result<Self, PipelineError> {
        if config.max_words == Some(0) {
            return Err(PipelineError::Config(
                "max_words must be at least 1".to_string(),
            ));
        }

        let set = Self { text, config };
        if set.iter().next().is_none() {
            return Err(PipelineError::Input(
                "transcript yields zero chunks".to_string(),
            ));
        }
        Ok(set)
    }

    pub fn from_transcript(
        transcript: &Transcript,
        config: ChunkConfig,
    ) -> Result<Self, PipelineError> {
        Self::new(Arc::clone(&transcript.cleaned), config)
    }

    pub fn iter(&self) -> Chunks<'_> {
        Chunks {
            segments: Segments::new(&self.text, self.config.max_words),
            lookahead: VecDeque::new(),
            min_words: self.config.min_words,
            next_index: 1,
        }
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Word count of the underlying text (equals the sum over all chunks)
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

impl<'a> IntoIterator for &'a ChunkSet {
    type Item = Chunk;
    type IntoIter = Chunks<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A paragraph, or a `max_words` slice of one
#[derive(Debug)]
struct Segment<'a> {
    words: Vec<&'a str>,
    starts_paragraph: bool,
}

/// Splits text into paragraph segments of at most `max_words` words
struct Segments<'a> {
    paragraphs: Split<'a, &'static str>,
    words: Option<SplitWhitespace<'a>>,
    max_words: Option<usize>,
    fresh_paragraph: bool,
}

impl<'a> Segments<'a> {
    fn new(text: &'a str, max_words: Option<usize>) -> Self {
        Self {
            paragraphs: text.split("\n\n"),
            words: None,
            max_words,
            fresh_paragraph: true,
        }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(words) = self.words.as_mut() {
                let taken: Vec<&str> = match self.max_words {
                    Some(max) => words.by_ref().take(max).collect(),
                    None => words.by_ref().collect(),
                };
                if !taken.is_empty() {
                    let starts_paragraph = std::mem::replace(&mut self.fresh_paragraph, false);
                    return Some(Segment {
                        words: taken,
                        starts_paragraph,
                    });
                }
            }
            self.words = Some(self.paragraphs.next()?.split_whitespace());
            self.fresh_paragraph = true;
        }
    }
}

/// Chunk under construction
struct PendingChunk {
    text: String,
    word_count: usize,
}

impl PendingChunk {
    fn from_segment(segment: Segment<'_>) -> Self {
        Self {
            word_count: segment.words.len(),
            text: segment.words.join(" "),
        }
    }

    fn absorb(&mut self, segment: Segment<'_>) {
        self.text
            .push_str(if segment.starts_paragraph { "\n\n" } else { " " });
        self.text.push_str(&segment.words.join(" "));
        self.word_count += segment.words.len();
    }
}

/// Iterator over the chunks of a [`ChunkSet`]
///
/// Undersized segments merge forward into the following segment. An
/// undersized remainder at the end of the transcript merges backward into the
/// last chunk instead of standing alone.
pub struct Chunks<'a> {
    segments: Segments<'a>,
    lookahead: VecDeque<Segment<'a>>,
    min_words: usize,
    next_index: usize,
}

impl<'a> Chunks<'a> {
    fn next_segment(&mut self) -> Option<Segment<'a>> {
        self.lookahead
            .pop_front()
            .or_else(|| self.segments.next())
    }

    /// Absorb the remaining segments if, together, they fall short of `min_words`
    fn absorb_undersized_tail(&mut self, pending: &mut PendingChunk) {
        let mut tail_words: usize = self.lookahead.iter().map(|s| s.words.len()).sum();

        while tail_words < self.min_words {
            match self.segments.next() {
                Some(segment) => {
                    tail_words += segment.words.len();
                    self.lookahead.push_back(segment);
                }
                None => {
                    while let Some(segment) = self.lookahead.pop_front() {
                        pending.absorb(segment);
                    }
                    return;
                }
            }
        }
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let mut pending = PendingChunk::from_segment(self.next_segment()?);

        while pending.word_count < self.min_words {
            match self.next_segment() {
                Some(segment) => pending.absorb(segment),
                None => break,
            }
        }

        if pending.word_count >= self.min_words {
            self.absorb_undersized_tail(&mut pending);
        }

        let index = self.next_index;
        self.next_index += 1;

        Some(Chunk {
            index,
            text: pending.text,
            word_count: pending.word_count,
        })
    }
}
