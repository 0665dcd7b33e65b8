//! Error types for the HR copilot engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors
#[derive(Debug, Error)]
pub enum Error {
    /// Nothing to index
    #[error("No chunks to index")]
    EmptyInput,

    /// Search or retrieval before an index was built or loaded
    #[error("Vector index has not been built or loaded")]
    IndexNotReady,

    /// Embedding dimensionality does not match the index
    #[error("Embedding dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Embedding or generation provider failure (network, quota, bad response)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider call exceeded its time budget
    #[error("{operation} timed out after {seconds}s")]
    ProviderTimeout { operation: String, seconds: u64 },

    /// Unsupported file type
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Persisted index written by an incompatible version or model
    #[error("Incompatible persisted index: {0}")]
    IncompatibleIndex(String),

    /// Invalid argument passed to a component
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for failures of the external embedding/generation services
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::Provider(_) | Self::ProviderTimeout { .. } | Self::Http(_)
        )
    }

    /// Sentence that is safe to show to an end user.
    ///
    /// Internal details (paths, HTTP bodies, keys in URLs) stay in the logs.
    pub fn user_message(&self) -> String {
        let reason = match self {
            Self::IndexNotReady | Self::EmptyInput => {
                "the policy documents have not been loaded yet"
            }
            Self::Provider(_) | Self::Http(_) => "the language service is unavailable right now",
            Self::ProviderTimeout { .. } => "the language service took too long to respond",
            Self::DimensionMismatch { .. } | Self::IncompatibleIndex(_) => {
                "the policy index is incompatible with the current embedding model"
            }
            Self::UnsupportedFormat(_) | Self::FileParse { .. } => "a document could not be read",
            Self::InvalidArgument(_) | Self::Config(_) => "the assistant is misconfigured",
            Self::Io(_) | Self::Json(_) | Self::Csv(_) => {
                "an internal error occurred"
            }
        };
        format!(
            "I apologize, but I encountered an error processing your request: {}. Please try again later.",
            reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_details() {
        let err = Error::provider("HTTP 429 - quota exceeded for key=abc123");
        let message = err.user_message();

        assert!(message.starts_with("I apologize"));
        assert!(!message.contains("abc123"));
    }

    #[test]
    fn test_provider_failure_classification() {
        assert!(Error::provider("boom").is_provider_failure());
        assert!(Error::ProviderTimeout {
            operation: "generation".to_string(),
            seconds: 30
        }
        .is_provider_failure());
        assert!(!Error::IndexNotReady.is_provider_failure());
    }
}
