//! Policy retrieval with a distance threshold

use std::time::Duration;

use crate::error::{Error, Result};
use crate::index::IndexStore;
use crate::providers::bounded;
use crate::types::RetrievalResult;

/// Shown in place of policy context when nothing was retrieved
pub const NO_CONTEXT_MESSAGE: &str = "No relevant information found in the policy documents.";

/// True if a result at `score` distance is close enough to keep
pub fn passes_threshold(score: f32, threshold: f32) -> bool {
    score <= threshold
}

/// Keep exactly the results whose score passes `threshold`, preserving rank order
pub fn apply_threshold(results: Vec<RetrievalResult>, threshold: f32) -> Vec<RetrievalResult> {
    results
        .into_iter()
        .filter(|r| passes_threshold(r.score, threshold))
        .collect()
}

/// Retrieves ranked policy chunks for a query
#[derive(Clone)]
pub struct Retriever {
    store: IndexStore,
    timeout: Duration,
}

impl Retriever {
    pub fn new(store: IndexStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Embed the query, search the `k` nearest chunks and drop those beyond `threshold`
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        // Fail fast before paying for an embedding call
        if !self.store.is_ready() {
            return Err(Error::IndexNotReady);
        }

        let embedder = self.store.embedder();
        let vector = bounded("query embedding", self.timeout, embedder.embed(query)).await?;

        let ranked = self.store.with_index(|index| {
            Ok(index
                .search(&vector, k)?
                .into_iter()
                .map(|n| RetrievalResult {
                    content: n.entry.chunk.text.clone(),
                    source: n.entry.chunk.parent_source.clone(),
                    score: n.distance,
                })
                .collect::<Vec<_>>())
        })?;

        let found = ranked.len();
        let results = apply_threshold(ranked, threshold);
        tracing::debug!(
            "Retrieved {} of {} neighbors within distance {}",
            results.len(),
            found,
            threshold
        );
        Ok(results)
    }

    /// Render results as numbered, source-tagged blocks in rank order
    pub fn format_context(results: &[RetrievalResult]) -> String {
        if results.is_empty() {
            return NO_CONTEXT_MESSAGE.to_string();
        }

        results
            .iter()
            .enumerate()
            .map(|(i, r)| format!("[Source {}: {}]\n{}\n", i + 1, r.source, r.content))
            .collect::<Vec<_>>()
            .join("\n---\n")
    }

    /// Unique source names in first-seen order
    pub fn get_sources(results: &[RetrievalResult]) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for result in results {
            if !sources.iter().any(|s| s == &result.source) {
                sources.push(result.source.clone());
            }
        }
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DistanceMetric;
    use crate::providers::{EmbeddingProvider, HashEmbedder};
    use crate::types::Chunk;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn result(source: &str, content: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            content: content.to_string(),
            source: source.to_string(),
            score,
        }
    }

    async fn populated_retriever() -> Retriever {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedder::new(256).unwrap());
        let store = IndexStore::new(embedder, DistanceMetric::Cosine, 16, Duration::from_secs(5));
        store
            .build(vec![
                Chunk::new("maternity.txt", "maternity leave policy twenty six weeks".into(), 0, 0, 39),
                Chunk::new("expenses.txt", "travel reimbursement receipts".into(), 0, 0, 29),
            ])
            .await
            .unwrap();
        Retriever::new(store, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_not_ready() {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedder::new(16).unwrap());
        let store = IndexStore::new(embedder, DistanceMetric::Cosine, 16, Duration::from_secs(5));
        let retriever = Retriever::new(store, Duration::from_secs(5));

        let result = retriever.retrieve("maternity", 4, 0.5).await;
        assert!(matches!(result, Err(Error::IndexNotReady)));
    }

    #[tokio::test]
    async fn test_threshold_filters_unrelated_chunks() {
        // The threshold is a real filter: distant chunks are dropped, never passed through
        let retriever = populated_retriever().await;

        let results = retriever.retrieve("maternity leave policy", 4, 0.5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "maternity.txt");

        let all = retriever.retrieve("maternity leave policy", 4, 2.0).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].source, "maternity.txt");
    }

    #[tokio::test]
    async fn test_zero_survivors_is_empty() {
        let retriever = populated_retriever().await;
        let results = retriever.retrieve("maternity", 4, 0.0).await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_format_context() {
        let results = vec![
            result("leave.txt", "Casual leave is 12 days.", 0.1),
            result("benefits.txt", "Health cover.", 0.2),
        ];
        assert_eq!(
            Retriever::format_context(&results),
            "[Source 1: leave.txt]\nCasual leave is 12 days.\n\n---\n[Source 2: benefits.txt]\nHealth cover.\n"
        );
        assert_eq!(Retriever::format_context(&[]), NO_CONTEXT_MESSAGE);
    }

    #[test]
    fn test_get_sources_dedups_in_order() {
        let results = vec![
            result("b.txt", "x", 0.1),
            result("a.txt", "y", 0.2),
            result("b.txt", "z", 0.3),
        ];
        assert_eq!(Retriever::get_sources(&results), vec!["b.txt", "a.txt"]);
    }

    proptest! {
        // Exactly the scores within the threshold survive, none are let through regardless
        #[test]
        fn prop_threshold_law(
            scores in proptest::collection::vec(0.0f32..2.0, 0..20),
            threshold in 0.0f32..2.0,
        ) {
            let results: Vec<RetrievalResult> = scores
                .iter()
                .enumerate()
                .map(|(i, s)| result(&format!("{}.txt", i), "c", *s))
                .collect();
            let kept = apply_threshold(results.clone(), threshold);

            prop_assert!(kept.iter().all(|r| passes_threshold(r.score, threshold)));
            let expected: Vec<&RetrievalResult> = results
                .iter()
                .filter(|r| passes_threshold(r.score, threshold))
                .collect();
            prop_assert_eq!(kept.iter().collect::<Vec<_>>(), expected);
        }
    }
}
