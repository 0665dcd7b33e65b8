//! Shared handle to the vector index
//!
//! Readers take a shared lock and never block each other. Writers are
//! serialized by an async gate; embedding happens while holding only the
//! gate, and the exclusive lock is taken just for the in-memory append, so
//! searches keep running while a batch is being embedded.

use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::persistence::{IndexManifest, LoadExpectations};
use super::vector_index::{embed_chunks, DistanceMetric, VectorIndex};
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;

/// Cloneable, thread-safe handle to an optional index
#[derive(Clone)]
pub struct IndexStore {
    index: Arc<RwLock<Option<VectorIndex>>>,
    writer: Arc<Mutex<()>>,
    embedder: Arc<dyn EmbeddingProvider>,
    metric: DistanceMetric,
    batch_size: usize,
    timeout: Duration,
}

impl IndexStore {
    /// Empty store; nothing is searchable until `build`, `add` or `load`
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        metric: DistanceMetric,
        batch_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            index: Arc::new(RwLock::new(None)),
            writer: Arc::new(Mutex::new(())),
            embedder,
            metric,
            batch_size,
            timeout,
        }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn is_ready(&self) -> bool {
        self.index.read().is_some()
    }

    pub fn len(&self) -> usize {
        self.index.read().as_ref().map_or(0, VectorIndex::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embed `chunks` and replace any existing index with the result
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<usize> {
        let _gate = self.writer.lock().await;
        let index = VectorIndex::build(
            chunks,
            self.embedder.as_ref(),
            self.batch_size,
            self.timeout,
            self.metric,
        )
        .await?;
        let count = index.len();
        *self.index.write() = Some(index);
        Ok(count)
    }

    /// Embed `chunks` and append them, building the index if none exists.
    ///
    /// Returns the number of entries added.
    pub async fn add(&self, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Err(Error::EmptyInput);
        }

        let _gate = self.writer.lock().await;
        let embedded =
            embed_chunks(chunks, self.embedder.as_ref(), self.batch_size, self.timeout).await?;
        let added = embedded.len();

        let mut guard = self.index.write();
        match guard.as_mut() {
            Some(index) => index.append(embedded)?,
            None => *guard = Some(VectorIndex::from_embedded(embedded, self.metric)?),
        }
        let total = guard.as_ref().map_or(0, VectorIndex::len);
        drop(guard);

        tracing::info!("Added {} chunks to index ({} total)", added, total);
        Ok(added)
    }

    /// Run `f` against the index under a shared lock
    pub fn with_index<R>(&self, f: impl FnOnce(&VectorIndex) -> Result<R>) -> Result<R> {
        let guard = self.index.read();
        let index = guard.as_ref().ok_or(Error::IndexNotReady)?;
        f(index)
    }

    /// Persist the current index; waits for any in-progress write
    pub async fn save(&self, dir: &Path) -> Result<IndexManifest> {
        let _gate = self.writer.lock().await;
        self.with_index(|index| index.save(dir, self.embedder.model()))
    }

    /// Replace the in-memory index with the one stored in `dir`
    pub async fn load(&self, dir: &Path) -> Result<usize> {
        let _gate = self.writer.lock().await;
        let expected = LoadExpectations {
            dimensions: self.embedder.dimensions(),
            embedding_model: self.embedder.model(),
        };
        let index = VectorIndex::load(dir, &expected)?;
        if index.metric() != self.metric {
            tracing::warn!(
                "Persisted index uses {} distance, configured metric is {}",
                index.metric().as_str(),
                self.metric.as_str()
            );
        }
        let count = index.len();
        *self.index.write() = Some(index);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::HashEmbedder;
    use tempfile::TempDir;

    fn store() -> IndexStore {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedder::new(64).unwrap());
        IndexStore::new(embedder, DistanceMetric::Cosine, 8, Duration::from_secs(5))
    }

    fn chunks(source: &str, texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(source, t.to_string(), i as u32, 0, t.len()))
            .collect()
    }

    #[tokio::test]
    async fn test_not_ready_until_populated() {
        let store = store();
        assert!(!store.is_ready());
        assert!(matches!(store.with_index(|i| Ok(i.len())), Err(Error::IndexNotReady)));
    }

    #[tokio::test]
    async fn test_add_builds_then_appends() {
        let store = store();
        store.add(chunks("a.txt", &["casual leave", "sick leave"])).await.unwrap();
        assert!(store.is_ready());
        assert_eq!(store.len(), 2);

        store.add(chunks("b.txt", &["maternity leave"])).await.unwrap();
        assert_eq!(store.len(), 3);

        let last = store
            .with_index(|i| Ok(i.entries()[2].chunk.parent_source.clone()))
            .unwrap();
        assert_eq!(last, "b.txt");
    }

    #[tokio::test]
    async fn test_add_empty_is_error() {
        assert!(matches!(store().add(Vec::new()).await, Err(Error::EmptyInput)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_serialized() {
        let store = store();
        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let text = format!("policy section {}", n);
                store.add(chunks(&format!("doc{}.txt", n), &[text.as_str(), "shared clause"])).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.len(), 16);
        // Each add lands contiguously
        let sources = store
            .with_index(|i| {
                Ok(i.entries()
                    .iter()
                    .map(|e| e.chunk.parent_source.clone())
                    .collect::<Vec<_>>())
            })
            .unwrap();
        for pair in sources.chunks(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }

    /// Hashing embedder that stalls on every batch
    struct SlowEmbedder {
        inner: HashEmbedder,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for SlowEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self.inner.embed_sync(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            tokio::time::sleep(self.delay).await;
            Ok(texts.iter().map(|t| self.inner.embed_sync(t)).collect())
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "slow"
        }

        fn model(&self) -> &str {
            "slow-hashing"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_searches_see_whole_adds_only() {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(SlowEmbedder {
            inner: HashEmbedder::new(64).unwrap(),
            delay: Duration::from_millis(40),
        });
        // One chunk per batch, so an add spans several embedding calls
        let store = IndexStore::new(embedder, DistanceMetric::Cosine, 1, Duration::from_secs(5));
        store.build(chunks("a.txt", &["casual leave", "sick leave"])).await.unwrap();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .add(chunks("b.txt", &["maternity leave", "paternity leave", "notice period", "probation"]))
                    .await
            })
        };

        let query = HashEmbedder::new(64).unwrap().embed_sync("leave");
        let mut observed = Vec::new();
        while !writer.is_finished() {
            let hits = store
                .with_index(|index| Ok(index.search(&query, 100)?.len()))
                .unwrap();
            observed.push(hits);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(writer.await.unwrap().unwrap(), 4);

        assert!(observed.iter().all(|&n| n == 2 || n == 6), "{:?}", observed);
        // Readers were not blocked while the batch was embedding
        assert!(observed.iter().filter(|&&n| n == 2).count() > 1);
        assert_eq!(store.len(), 6);
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = store();
        store.build(chunks("a.txt", &["casual leave", "earned leave"])).await.unwrap();
        store.save(dir.path()).await.unwrap();

        let restored = self::store();
        assert_eq!(restored.load(dir.path()).await.unwrap(), 2);
        assert!(restored.is_ready());
    }

    #[tokio::test]
    async fn test_save_without_index() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(store().save(dir.path()).await, Err(Error::IndexNotReady)));
    }
}
