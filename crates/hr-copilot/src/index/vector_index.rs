//! Flat, append-only vector index with exact nearest-neighbor search

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::providers::{bounded, EmbeddingProvider};
use crate::types::{Chunk, EmbeddedChunk};

/// Distance used for both build and search; lower is closer
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cos(a, b)`, in `[0, 2]`; a zero vector is at distance 1 from everything
    #[default]
    Cosine,
    /// Straight-line distance
    Euclidean,
}

impl DistanceMetric {
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => {
                let mut dot = 0.0f32;
                let mut norm_a = 0.0f32;
                let mut norm_b = 0.0f32;
                for (x, y) in a.iter().zip(b) {
                    dot += x * y;
                    norm_a += x * x;
                    norm_b += y * y;
                }
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 1.0;
                }
                1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
            }
            Self::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
        }
    }
}

/// A search hit borrowed from the index
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub entry: &'a EmbeddedChunk,
    pub distance: f32,
}

/// Embed chunks in batches, each batch bounded by `timeout`
pub async fn embed_chunks(
    chunks: Vec<Chunk>,
    embedder: &dyn EmbeddingProvider,
    batch_size: usize,
    timeout: Duration,
) -> Result<Vec<EmbeddedChunk>> {
    let batch_size = batch_size.max(1);
    let mut embedded = Vec::with_capacity(chunks.len());
    let mut pending = chunks.into_iter().peekable();

    while pending.peek().is_some() {
        let batch: Vec<Chunk> = pending.by_ref().take(batch_size).collect();
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = bounded("embedding", timeout, embedder.embed_batch(&texts)).await?;

        if vectors.len() != batch.len() {
            return Err(Error::provider(format!(
                "{} returned {} vectors for {} texts",
                embedder.name(),
                vectors.len(),
                batch.len()
            )));
        }
        embedded.extend(batch.into_iter().zip(vectors).map(|(c, v)| EmbeddedChunk::new(c, v)));
    }

    tracing::debug!("Embedded {} chunks with {}", embedded.len(), embedder.name());
    Ok(embedded)
}

/// In-memory index of embedded chunks in insertion order
#[derive(Debug, Clone)]
pub struct VectorIndex {
    metric: DistanceMetric,
    dimensions: usize,
    entries: Vec<EmbeddedChunk>,
}

impl VectorIndex {
    /// Embed every chunk and build an index
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
        batch_size: usize,
        timeout: Duration,
        metric: DistanceMetric,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::EmptyInput);
        }
        let entries = embed_chunks(chunks, embedder, batch_size, timeout).await?;
        let index = Self::from_embedded(entries, metric)?;
        tracing::info!(
            "Built {} index with {} entries ({} dims)",
            metric.as_str(),
            index.len(),
            index.dimensions
        );
        Ok(index)
    }

    /// Build from already-embedded chunks; all vectors must share one length
    pub fn from_embedded(entries: Vec<EmbeddedChunk>, metric: DistanceMetric) -> Result<Self> {
        let dimensions = entries.first().ok_or(Error::EmptyInput)?.vector.len();
        if dimensions == 0 {
            return Err(Error::InvalidArgument("embedding vectors are empty".to_string()));
        }
        check_dimensions(&entries, dimensions)?;
        Ok(Self {
            metric,
            dimensions,
            entries,
        })
    }

    /// Append entries; nothing is added if any vector has the wrong length
    pub fn append(&mut self, entries: Vec<EmbeddedChunk>) -> Result<()> {
        check_dimensions(&entries, self.dimensions)?;
        self.entries.extend(entries);
        Ok(())
    }

    /// The `k` nearest entries, closest first, ties in insertion order
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor<'_>>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        if query.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                found: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor<'_>> = self
            .entries
            .iter()
            .map(|entry| Neighbor {
                entry,
                distance: self.metric.distance(query, &entry.vector),
            })
            .collect();

        // Stable sort keeps insertion order among equal distances
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);
        Ok(neighbors)
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn entries(&self) -> &[EmbeddedChunk] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn check_dimensions(entries: &[EmbeddedChunk], expected: usize) -> Result<()> {
    match entries.iter().find(|e| e.vector.len() != expected) {
        Some(bad) => Err(Error::DimensionMismatch {
            expected,
            found: bad.vector.len(),
        }),
        None => Ok(()),
    }
}
