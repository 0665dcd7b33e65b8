//! Ingestion pipeline: load, chunk, embed, index

use std::path::Path;
use std::sync::Arc;

use super::chunker::TextChunker;
use super::loader::{load_directory, process_uploads, IngestFailure, LoadReport};
use super::pdf::PdfExtractor;
use crate::error::{Error, Result};
use crate::index::IndexStore;

/// Summary of one ingestion run
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Documents loaded successfully
    pub documents: usize,
    /// Chunks written to the index
    pub chunks: usize,
    /// Files that could not be loaded
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Turns policy files into index entries
pub struct IngestPipeline {
    chunker: TextChunker,
    store: IndexStore,
    pdf: Arc<dyn PdfExtractor>,
}

impl IngestPipeline {
    pub fn new(chunker: TextChunker, store: IndexStore, pdf: Arc<dyn PdfExtractor>) -> Self {
        Self {
            chunker,
            store,
            pdf,
        }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Build a fresh index from every `.txt` file in `dir`.
    ///
    /// Unreadable files are reported, not fatal. When every file failed the
    /// report comes back with zero chunks and the index is left untouched.
    /// Fails with `EmptyInput` when the directory held nothing to load.
    pub async fn ingest_directory(&self, dir: &Path) -> Result<IngestReport> {
        let loaded = load_directory(dir);
        let (report, chunks) = self.chunk(loaded);
        if chunks.is_empty() {
            tracing::warn!(
                "No chunks produced from {} ({} failures)",
                dir.display(),
                report.failure_count()
            );
            if report.failures.is_empty() {
                return Err(Error::EmptyInput);
            }
            return Ok(report);
        }

        let indexed = self.store.build(chunks).await?;
        tracing::info!(
            "Indexed {} documents as {} chunks ({} failures)",
            report.documents,
            indexed,
            report.failure_count()
        );
        Ok(IngestReport {
            chunks: indexed,
            ..report
        })
    }

    /// Append uploaded files to the index, creating it if needed
    pub async fn ingest_uploads(&self, uploads: &[(String, Vec<u8>)]) -> Result<IngestReport> {
        let loaded = process_uploads(uploads, self.pdf.as_ref());
        let (report, chunks) = self.chunk(loaded);
        if chunks.is_empty() {
            if report.failures.is_empty() {
                return Err(Error::EmptyInput);
            }
            // Every upload was rejected; report that rather than an empty batch
            return Ok(report);
        }

        let added = self.store.add(chunks).await?;
        tracing::info!(
            "Added {} uploaded documents as {} chunks ({} failures)",
            report.documents,
            added,
            report.failure_count()
        );
        Ok(IngestReport {
            chunks: added,
            ..report
        })
    }

    fn chunk(&self, loaded: LoadReport) -> (IngestReport, Vec<crate::types::Chunk>) {
        let chunks = self.chunker.chunk_documents(&loaded.documents);
        let report = IngestReport {
            documents: loaded.documents.len(),
            chunks: 0,
            failures: loaded.failures,
        };
        (report, chunks)
    }
}
