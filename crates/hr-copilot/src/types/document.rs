//! Document and chunk types with source tracking for citations

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Plain text file
    Txt,
    /// PDF document
    Pdf,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Self::Txt,
            "pdf" => Self::Pdf,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a file name
    pub fn from_filename(filename: &str) -> Self {
        std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }
}

/// A loaded source document, discarded once chunked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// File name used for attribution
    pub source_name: String,
    /// Full extracted text
    pub raw_text: String,
    /// File type
    pub file_type: FileType,
    /// SHA-256 of the raw text
    pub content_hash: String,
    /// Load timestamp
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    pub fn new(source_name: impl Into<String>, raw_text: impl Into<String>, file_type: FileType) -> Self {
        let raw_text = raw_text.into();
        let content_hash = format!("{:x}", Sha256::digest(raw_text.as_bytes()));
        Self {
            id: Uuid::new_v4(),
            source_name: source_name.into(),
            raw_text,
            file_type,
            content_hash,
            loaded_at: chrono::Utc::now(),
        }
    }

    /// Number of characters (not bytes) in the text
    pub fn char_len(&self) -> usize {
        self.raw_text.chars().count()
    }
}

/// A bounded segment of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable chunk ID, `{source}#{sequence}`
    pub id: String,
    /// Source file name of the parent document
    pub parent_source: String,
    /// Text content
    pub text: String,
    /// Position of this chunk within its document
    pub sequence_index: u32,
    /// Character range in the parent document
    pub char_start: usize,
    pub char_end: usize,
}

impl Chunk {
    pub fn new(
        parent_source: impl Into<String>,
        text: String,
        sequence_index: u32,
        char_start: usize,
        char_end: usize,
    ) -> Self {
        let parent_source = parent_source.into();
        Self {
            id: format!("{}#{}", parent_source, sequence_index),
            parent_source,
            text,
            sequence_index,
            char_start,
            char_end,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

/// A chunk together with its embedding, owned by the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

impl EmbeddedChunk {
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }
}
