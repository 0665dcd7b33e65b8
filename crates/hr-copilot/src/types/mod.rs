//! Core types for the engine

pub mod document;
pub mod response;

pub use document::{Chunk, Document, EmbeddedChunk, FileType};
pub use response::{ChatMessage, ChatResponse, RetrievalResult, Role};
