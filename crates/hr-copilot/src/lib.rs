//! hr-copilot: HR question answering over employee records and policy documents
//!
//! Policy documents are chunked, embedded and kept in a flat vector index.
//! Each question is routed by keyword to the employee records, the policy
//! index or both; the gathered context is assembled into a prompt for the
//! configured LLM and the answer is returned with its policy sources.

pub mod config;
pub mod employee;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod orchestrator;
pub mod providers;
pub mod retrieval;
pub mod routing;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use index::{DistanceMetric, IndexStore, VectorIndex};
pub use orchestrator::Orchestrator;
pub use retrieval::Retriever;
pub use routing::{ClassificationResult, QueryClassifier};
pub use types::{
    document::{Chunk, Document, EmbeddedChunk, FileType},
    response::{ChatMessage, ChatResponse, RetrievalResult},
};
