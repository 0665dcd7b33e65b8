//! Prompt assembly and citation handling

pub mod citation;
pub mod prompt;

pub use citation::append_citation_block;
pub use prompt::{PromptBuilder, HISTORY_TURNS};
