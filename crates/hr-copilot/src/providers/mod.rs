//! Provider abstractions for embeddings and generation
//!
//! Trait objects let the engine switch between Gemini, a local Ollama server
//! and the offline hashing embedder without touching the pipeline.

pub mod embedding;
pub mod gemini;
pub mod hashing;
pub mod llm;
pub mod ollama;
mod retry;

pub use embedding::EmbeddingProvider;
pub use gemini::{GeminiClient, GeminiEmbedder, GeminiLlm};
pub use hashing::HashEmbedder;
pub use llm::LlmProvider;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ProviderKind, RagConfig};
use crate::error::{Error, Result};

/// Await a provider call, converting an elapsed budget into `ProviderTimeout`
pub async fn bounded<T, F>(operation: &str, budget: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("{} timed out after {:?}", operation, budget);
            Err(Error::ProviderTimeout {
                operation: operation.to_string(),
                seconds: budget.as_secs(),
            })
        }
    }
}

/// Build the configured embedding provider
pub fn build_embedder(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embeddings = &config.embeddings;
    let embedder: Arc<dyn EmbeddingProvider> = match embeddings.provider {
        ProviderKind::Gemini => {
            let client = Arc::new(GeminiClient::new(&config.llm)?);
            Arc::new(GeminiEmbedder::from_client(
                client,
                embeddings.dimensions,
                embeddings.model.clone(),
            ))
        }
        ProviderKind::Ollama => {
            let client = Arc::new(OllamaClient::new(&config.llm)?);
            Arc::new(OllamaEmbedder::from_client(
                client,
                embeddings.dimensions,
                embeddings.model.clone(),
            ))
        }
        ProviderKind::Hashing => Arc::new(HashEmbedder::new(embeddings.dimensions)?),
    };
    tracing::info!(
        "Embedding provider: {} ({}, {} dims)",
        embedder.name(),
        embedder.model(),
        embedder.dimensions()
    );
    Ok(embedder)
}

/// Build the configured generation provider
pub fn build_llm(config: &RagConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm: Arc<dyn LlmProvider> = match config.llm.provider {
        ProviderKind::Gemini => {
            let client = Arc::new(GeminiClient::new(&config.llm)?);
            Arc::new(GeminiLlm::from_client(client, config.llm.model.clone()))
        }
        ProviderKind::Ollama => {
            let client = Arc::new(OllamaClient::new(&config.llm)?);
            Arc::new(OllamaLlm::from_client(client, config.llm.model.clone()))
        }
        ProviderKind::Hashing => {
            return Err(Error::config("the hashing provider cannot generate answers"))
        }
    };
    tracing::info!("LLM provider: {} ({})", llm.name(), llm.model());
    Ok(llm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_through() {
        let result = bounded("embedding", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<()> = bounded("generation", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        match result {
            Err(Error::ProviderTimeout { operation, .. }) => assert_eq!(operation, "generation"),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_hashing_embedder_from_config() {
        let mut config = RagConfig::default();
        config.embeddings.provider = ProviderKind::Hashing;
        config.embeddings.dimensions = 16;

        let embedder = build_embedder(&config).unwrap();
        assert_eq!(embedder.name(), "hashing");
        assert_eq!(embedder.dimensions(), 16);
    }
}
