//! Sliding-window text chunking with boundary preference

use unicode_segmentation::UnicodeSegmentation;

use crate::config::{ChunkingConfig, MIN_CHUNK_SIZE};
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

/// Text chunker with configurable size and overlap
///
/// Windows are measured in characters. A window ends at the last paragraph
/// break inside it, else the last sentence break, else the last word break,
/// else it is cut hard at `chunk_size`. The next window starts exactly
/// `chunk_overlap` characters before the previous one ended.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size < MIN_CHUNK_SIZE {
            return Err(Error::InvalidArgument(format!(
                "chunk_size must be at least {}, got {}",
                MIN_CHUNK_SIZE, chunk_size
            )));
        }
        if overlap >= chunk_size {
            return Err(Error::InvalidArgument(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk many documents, preserving document order
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| self.chunk_document(doc))
            .collect();
        tracing::debug!(
            "Split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );
        chunks
    }

    /// Chunk a single document
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        self.chunk_text(&doc.source_name, &doc.raw_text)
    }

    /// Chunk raw text attributed to `source`
    pub fn chunk_text(&self, source: &str, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let breaks = BreakPoints::scan(text, &chars);
        let total = chars.len();

        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut sequence = 0u32;

        loop {
            let window_end = start + self.chunk_size;
            let end = if window_end >= total {
                total
            } else {
                // Keep every split far enough along that the next window advances
                let lower = start + (self.overlap + 1).max(self.chunk_size / 2);
                breaks.best_split(lower, window_end).unwrap_or(window_end)
            };

            let content: String = chars[start..end].iter().collect();
            chunks.push(Chunk::new(source, content, sequence, start, end));
            sequence += 1;

            if end >= total {
                break;
            }
            start = end - self.overlap;
        }

        chunks
    }
}

/// Candidate split positions, as character offsets a chunk may end at
struct BreakPoints {
    paragraphs: Vec<usize>,
    sentences: Vec<usize>,
    words: Vec<usize>,
}

impl BreakPoints {
    fn scan(text: &str, chars: &[char]) -> Self {
        let mut paragraphs = Vec::new();
        let mut words = Vec::new();
        for (i, c) in chars.iter().enumerate() {
            if c.is_whitespace() {
                words.push(i + 1);
                if *c == '\n' && i > 0 && chars[i - 1] == '\n' {
                    paragraphs.push(i + 1);
                }
            }
        }

        let mut sentences = Vec::new();
        let mut pos = 0usize;
        for sentence in text.split_sentence_bounds() {
            pos += sentence.chars().count();
            sentences.push(pos);
        }

        Self {
            paragraphs,
            sentences,
            words,
        }
    }

    /// Latest break in `[lower, upper]`, by boundary strength
    fn best_split(&self, lower: usize, upper: usize) -> Option<usize> {
        [&self.paragraphs, &self.sentences, &self.words]
            .into_iter()
            .find_map(|points| last_in_range(points, lower, upper))
    }
}

fn last_in_range(points: &[usize], lower: usize, upper: usize) -> Option<usize> {
    let idx = points.partition_point(|&p| p <= upper);
    if idx == 0 {
        return None;
    }
    let candidate = points[idx - 1];
    (candidate >= lower).then_some(candidate)
}
