//! Query-time result types

use serde::{Deserialize, Serialize};

use crate::routing::ClassificationResult;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of prior conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A retrieved chunk with its attribution and distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Chunk text
    pub content: String,
    /// Source file name
    pub source: String,
    /// Distance to the query, lower is closer
    pub score: f32,
}

/// Answer returned to the caller of the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Answer text, including the citation block when sources exist
    pub answer: String,
    /// Unique policy sources used, in first-seen order
    pub sources: Vec<String>,
    /// Routing decision for the query
    pub classification: ClassificationResult,
    /// False when the pipeline failed and `answer` is an apology
    pub success: bool,
}

impl ChatResponse {
    /// Failed response carrying a user-safe message
    pub fn failure(message: String, classification: ClassificationResult) -> Self {
        Self {
            answer: message,
            sources: Vec::new(),
            classification,
            success: false,
        }
    }
}
