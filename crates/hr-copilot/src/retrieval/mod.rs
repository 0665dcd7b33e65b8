//! Similarity retrieval over the policy index

mod retriever;

pub use retriever::{apply_threshold, passes_threshold, Retriever, NO_CONTEXT_MESSAGE};
